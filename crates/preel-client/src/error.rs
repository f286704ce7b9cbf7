//! Client error types.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Client configuration error: {0}")]
    Config(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server returned {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Unexpected response payload: {0}")]
    BadPayload(String),
}

impl ClientError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn api(status: u16, detail: impl Into<String>) -> Self {
        Self::Api {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_payload(msg: impl Into<String>) -> Self {
        Self::BadPayload(msg.into())
    }
}
