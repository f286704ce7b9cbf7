//! Clients for the external generation services PromptReel delegates to.
//!
//! Generation itself is opaque to this backend: a prompt or audio clip
//! goes out over HTTP, media bytes or an error come back. Every client
//! takes its base URL from configuration so tests can stand in a mock
//! server.

pub mod config;
pub mod error;
pub mod gemini;
pub mod tts;
pub mod workers_ai;

pub use config::GenAiConfig;
pub use error::{GenAiError, GenAiResult};
pub use gemini::GeminiImageClient;
pub use tts::TranslateTtsClient;
pub use workers_ai::{WorkersAiImageClient, WorkersAiWhisperClient};
