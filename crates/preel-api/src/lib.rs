//! HTTP API for the PromptReel studio backend.
//!
//! Exposes prompt intake, the three generation pipelines, job polling,
//! and artifact downloads over axum. Jobs run in the background via
//! `preel-runner` and live in the in-memory `preel-store` registry.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
