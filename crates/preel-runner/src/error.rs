//! Error type for job pipelines.

use preel_genai::GenAiError;
use preel_media::MediaError;
use preel_store::StoreError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors surfaced by job pipelines.
///
/// The display string becomes the job's `error_message`, so wrapping
/// variants defer to the underlying error text.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    GenAi(#[from] GenAiError),

    #[error("{0}")]
    Media(#[from] MediaError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_defers_to_source() {
        let err: RunnerError = MediaError::NoScenes.into();
        assert_eq!(err.to_string(), "No usable scenes found in script");

        let err: RunnerError = GenAiError::Config("GEMINI_API_KEY is not set".into()).into();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}
