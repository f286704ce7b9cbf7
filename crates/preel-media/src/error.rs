//! Error types for media operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors from CSV parsing, archiving, and FFmpeg operations.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg binary not found in PATH")]
    FfmpegNotFound,

    #[error("ffprobe binary not found in PATH")]
    FfprobeNotFound,

    #[error("ffmpeg failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("ffmpeg timed out after {0} seconds")]
    Timeout(u64),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Error processing CSV: {0}")]
    InvalidCsv(String),

    #[error("No valid prompts found in CSV")]
    NoPrompts,

    #[error("No usable scenes found in script")]
    NoScenes,

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FfmpegFailed error with optional stderr output.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an internal error from any message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True for validation errors the caller should surface as bad input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidCsv(_) | Self::NoPrompts | Self::NoScenes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MediaError::NoPrompts;
        assert_eq!(err.to_string(), "No valid prompts found in CSV");

        let err = MediaError::Timeout(600);
        assert_eq!(err.to_string(), "ffmpeg timed out after 600 seconds");

        let err = MediaError::ffmpeg_failed("encode failed", None, Some(1));
        assert!(err.to_string().contains("encode failed"));
    }

    #[test]
    fn test_validation_classification() {
        assert!(MediaError::NoPrompts.is_validation());
        assert!(MediaError::InvalidCsv("bad utf-8".into()).is_validation());
        assert!(MediaError::NoScenes.is_validation());
        assert!(!MediaError::FfmpegNotFound.is_validation());
        assert!(!MediaError::Timeout(10).is_validation());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MediaError = io_err.into();
        assert!(matches!(err, MediaError::Io(_)));
    }
}
