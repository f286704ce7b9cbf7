//! In-memory job registry for the PromptReel backend.
//!
//! Jobs live in a shared concurrent map for their entire lifecycle and are
//! lost on restart. All mutation goes through [`JobStore`] methods that
//! enforce the lifecycle rules: one-directional state transitions and
//! monotonically non-decreasing progress. A background [`JobSweeper`]
//! evicts terminal jobs after a TTL and deletes their files.

pub mod error;
pub mod store;
pub mod sweeper;

pub use error::{StoreError, StoreResult};
pub use store::JobStore;
pub use sweeper::JobSweeper;
