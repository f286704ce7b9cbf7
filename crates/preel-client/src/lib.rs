//! Headless client for the PromptReel studio API.
//!
//! `StudioClient` wraps every HTTP endpoint with typed requests and
//! responses, `Session` tracks the workflow state machine, and
//! `poll_until_terminal` watches a running job at a fixed interval.

pub mod client;
pub mod error;
pub mod poll;
pub mod session;

pub use client::{JobStatus, StartedJob, StudioClient, UploadedPrompts};
pub use error::{ClientError, ClientResult};
pub use poll::{poll_until_terminal, POLL_INTERVAL};
pub use session::{Session, SessionError, SessionState};
