//! Generation client error types.

use thiserror::Error;

pub type GenAiResult<T> = Result<T, GenAiError>;

#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("{service} returned {status}: {detail}")]
    Upstream {
        service: &'static str,
        status: u16,
        detail: String,
    },

    #[error("Unusable response payload: {0}")]
    BadPayload(String),
}

impl GenAiError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    pub fn upstream(
        service: &'static str,
        status: reqwest::StatusCode,
        detail: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            service,
            status: status.as_u16(),
            detail: detail.into(),
        }
    }

    pub fn bad_payload(msg: impl Into<String>) -> Self {
        Self::BadPayload(msg.into())
    }
}
