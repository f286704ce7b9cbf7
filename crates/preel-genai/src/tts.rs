//! Narration synthesis via the Google Translate TTS endpoint.
//!
//! The endpoint caps request length, so longer scripts are split into
//! chunks and the returned MP3 segments are concatenated in order.

use reqwest::Client;
use tracing::{debug, info};

use crate::config::{http_client, GenAiConfig};
use crate::error::{GenAiError, GenAiResult};

/// Longest text accepted per TTS request.
const MAX_CHUNK_CHARS: usize = 180;

/// Translate TTS client.
pub struct TranslateTtsClient {
    base_url: String,
    language: String,
    client: Client,
}

impl TranslateTtsClient {
    /// Create a new TTS client.
    pub fn new(config: &GenAiConfig) -> GenAiResult<Self> {
        Ok(Self {
            base_url: config.tts_base_url.trim_end_matches('/').to_string(),
            language: config.tts_language.clone(),
            client: http_client(config)?,
        })
    }

    /// Synthesize narration for `text`, returning MP3 bytes.
    pub async fn synthesize(&self, text: &str) -> GenAiResult<Vec<u8>> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(GenAiError::bad_payload("No speakable text for narration"));
        }

        let mut audio = Vec::new();

        for (i, chunk) in chunks.iter().enumerate() {
            let url = format!(
                "{}/translate_tts?ie=UTF-8&client=tw-ob&tl={}&q={}",
                self.base_url,
                self.language,
                urlencoding::encode(chunk)
            );

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| GenAiError::request(format!("TTS request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let detail = response.text().await.unwrap_or_default();
                return Err(GenAiError::upstream("TTS", status, detail));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| GenAiError::request(format!("TTS body read failed: {}", e)))?;

            // MP3 frames are self-delimiting, segments concatenate cleanly
            audio.extend_from_slice(&bytes);
            debug!(chunk = i + 1, total = chunks.len(), "Narration chunk synthesized");
        }

        if audio.is_empty() {
            return Err(GenAiError::bad_payload("TTS returned no audio"));
        }

        info!(chunks = chunks.len(), size = audio.len(), "Narration synthesized");
        Ok(audio)
    }
}

/// Split text into chunks of at most `max_chars` characters, breaking on
/// whitespace and preferring sentence ends once a chunk is half full.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();

        // A single overlong word gets hard-split on character boundaries.
        if word_chars > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            let mut piece = String::new();
            let mut piece_chars = 0usize;
            for ch in word.chars() {
                if piece_chars == max_chars {
                    chunks.push(std::mem::take(&mut piece));
                    piece_chars = 0;
                }
                piece.push(ch);
                piece_chars += 1;
            }
            current = piece;
            current_chars = piece_chars;
            continue;
        }

        let needed = if current.is_empty() {
            word_chars
        } else {
            word_chars + 1
        };
        if current_chars + needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;

        if current_chars >= max_chars / 2 && word.ends_with(|c| matches!(c, '.' | '!' | '?')) {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
