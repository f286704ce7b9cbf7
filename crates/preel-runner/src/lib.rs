//! In-process generation pipelines.
//!
//! Jobs run as fire-and-forget tasks on the tokio runtime. Callers insert a
//! pending job into the store, hand the inputs to [`JobRunner`], and observe
//! progress by polling the store.

pub mod config;
pub mod error;
pub mod metrics;
pub mod runner;

pub use config::StudioConfig;
pub use error::{RunnerError, RunnerResult};
pub use runner::JobRunner;
