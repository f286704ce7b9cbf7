//! Shared data models for the PromptReel backend.
//!
//! This crate provides Serde-serializable types for:
//! - Generation jobs and their lifecycle states
//! - Job kinds (image batch, text-to-video, voice-to-video)
//! - Aspect ratio specifications

pub mod aspect;
pub mod job;

// Re-export common types
pub use aspect::{AspectRatio, AspectRatioParseError};
pub use job::{
    progress_percent, Job, JobId, JobKind, JobKindParseError, JobState, DEFAULT_STYLE,
};
