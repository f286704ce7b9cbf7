//! Client-side session state machine.
//!
//! Mirrors the studio workflow: parse inputs, start a job, watch it
//! to a terminal state. Transitions are one-directional; `reset`
//! returns to `Idle` from anywhere.

use thiserror::Error;

/// Session lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing in flight
    Idle,
    /// Input file is being read/uploaded
    Uploading,
    /// Inputs parsed and approved for generation
    Ready { prompts: Vec<String> },
    /// Job running server-side, polling in progress
    Generating { job_id: String },
    /// Job finished and artifact is available
    Completed { job_id: String },
    /// Job failed; detail comes from the status endpoint
    Failed { job_id: String, detail: String },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Uploading => "uploading",
            SessionState::Ready { .. } => "ready",
            SessionState::Generating { .. } => "generating",
            SessionState::Completed { .. } => "completed",
            SessionState::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

impl SessionError {
    fn invalid(from: &SessionState, to: &'static str) -> Self {
        Self::InvalidTransition {
            from: from.name(),
            to,
        }
    }
}

/// Workflow session tracking one generation round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Prompts parsed so far, when in `Ready`.
    pub fn prompts(&self) -> Option<&[String]> {
        match &self.state {
            SessionState::Ready { prompts } => Some(prompts),
            _ => None,
        }
    }

    /// Job being watched or finished, when one exists.
    pub fn job_id(&self) -> Option<&str> {
        match &self.state {
            SessionState::Generating { job_id }
            | SessionState::Completed { job_id }
            | SessionState::Failed { job_id, .. } => Some(job_id),
            _ => None,
        }
    }

    /// Begin reading/uploading an input file.
    pub fn begin_upload(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::Uploading;
                Ok(())
            }
            _ => Err(SessionError::invalid(&self.state, "uploading")),
        }
    }

    /// Record the parsed inputs and wait for the go-ahead.
    pub fn prompts_ready(&mut self, prompts: Vec<String>) -> Result<(), SessionError> {
        match self.state {
            SessionState::Uploading => {
                self.state = SessionState::Ready { prompts };
                Ok(())
            }
            _ => Err(SessionError::invalid(&self.state, "ready")),
        }
    }

    /// Record the started job and switch to polling.
    pub fn begin_generation(&mut self, job_id: impl Into<String>) -> Result<(), SessionError> {
        match self.state {
            SessionState::Ready { .. } => {
                self.state = SessionState::Generating {
                    job_id: job_id.into(),
                };
                Ok(())
            }
            _ => Err(SessionError::invalid(&self.state, "generating")),
        }
    }

    /// Mark the watched job as completed.
    pub fn complete(&mut self) -> Result<(), SessionError> {
        match &self.state {
            SessionState::Generating { job_id } => {
                self.state = SessionState::Completed {
                    job_id: job_id.clone(),
                };
                Ok(())
            }
            _ => Err(SessionError::invalid(&self.state, "completed")),
        }
    }

    /// Mark the watched job as failed.
    pub fn fail(&mut self, detail: impl Into<String>) -> Result<(), SessionError> {
        match &self.state {
            SessionState::Generating { job_id } => {
                self.state = SessionState::Failed {
                    job_id: job_id.clone(),
                    detail: detail.into(),
                };
                Ok(())
            }
            _ => Err(SessionError::invalid(&self.state, "failed")),
        }
    }

    /// Return to `Idle` from any state.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
