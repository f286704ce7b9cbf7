//! Job definitions for media generation.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Style hint appended to every prompt when the caller does not pick one.
pub const DEFAULT_STYLE: &str = "photorealistic";

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job lifecycle state.
///
/// Transitions are one-directional: pending -> processing -> completed
/// or failed. Terminal states never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Job is registered but not yet picked up
    #[default]
    Pending,
    /// Job is being processed
    Processing,
    /// Job completed successfully and has an artifact
    Completed,
    /// Job failed
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Batch of images zipped together
    Images,
    /// Narrated slideshow video from a script
    TextToVideo,
    /// Slideshow video from an uploaded voice recording
    VoiceToVideo,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Images => "images",
            JobKind::TextToVideo => "text_to_video",
            JobKind::VoiceToVideo => "voice_to_video",
        }
    }

    /// Video kinds produce an mp4 artifact, image kind produces a zip.
    pub fn is_video(&self) -> bool {
        matches!(self, JobKind::TextToVideo | JobKind::VoiceToVideo)
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = JobKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "images" => Ok(JobKind::Images),
            "text_to_video" => Ok(JobKind::TextToVideo),
            "voice_to_video" => Ok(JobKind::VoiceToVideo),
            _ => Err(JobKindParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown job kind: {0}")]
pub struct JobKindParseError(String);

/// Integer progress percentage for `completed` out of `total` items.
///
/// Uses integer division, so 1/3 -> 33, 2/3 -> 66, 3/3 -> 100.
pub fn progress_percent(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    ((completed as u64 * 100) / total as u64).min(100) as u8
}

/// A generation job tracked by the studio.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Job kind
    pub kind: JobKind,

    /// Job state
    #[serde(default)]
    pub state: JobState,

    /// Progress (0-100), never decreases
    #[serde(default)]
    pub progress: u8,

    /// Human-readable description of the current stage
    pub current_task: String,

    /// Total work items (prompts for image jobs, scenes for video jobs)
    #[serde(default)]
    pub total_items: u32,

    /// Items finished so far
    #[serde(default)]
    pub completed_items: u32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Started at timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Completed at timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Path of the finished artifact (zip or mp4)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
}

impl Job {
    /// Create a new pending job.
    pub fn new(kind: JobKind, total_items: u32) -> Self {
        let now = Utc::now();

        Self {
            id: JobId::new(),
            kind,
            state: JobState::Pending,
            progress: 0,
            current_task: "Waiting to start".to_string(),
            total_items,
            completed_items: 0,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            error_message: None,
            artifact: None,
        }
    }

    /// Start processing the job.
    pub fn start(mut self) -> Self {
        self.state = JobState::Processing;
        self.started_at = Some(Utc::now());
        self.updated_at = Utc::now();
        self
    }

    /// Mark the job as completed with its artifact.
    pub fn complete(mut self, artifact: PathBuf) -> Self {
        self.state = JobState::Completed;
        self.progress = 100;
        self.completed_items = self.total_items;
        self.current_task = "Completed".to_string();
        self.artifact = Some(artifact);
        self.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
        self
    }

    /// Mark the job as failed.
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.state = JobState::Failed;
        self.error_message = Some(error.into());
        self.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
        self
    }

    /// Update progress, clamped to 100.
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress.min(100);
        self.updated_at = Utc::now();
        self
    }

    /// Update the current stage description.
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.current_task = task.into();
        self.updated_at = Utc::now();
        self
    }
}
