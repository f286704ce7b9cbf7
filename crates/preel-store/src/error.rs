//! Error types for job store operations.

use preel_models::JobId;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur when mutating the job registry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job {id} is already in terminal state {state}")]
    TerminalState { id: JobId, state: &'static str },

    #[error("Invalid transition for job {id}: {detail}")]
    InvalidTransition { id: JobId, detail: String },
}

impl StoreError {
    /// Create a terminal-state error.
    pub fn terminal(id: &JobId, state: &'static str) -> Self {
        Self::TerminalState {
            id: id.clone(),
            state,
        }
    }

    /// Create an invalid-transition error.
    pub fn invalid_transition(id: &JobId, detail: impl Into<String>) -> Self {
        Self::InvalidTransition {
            id: id.clone(),
            detail: detail.into(),
        }
    }
}
