//! Cloudflare Workers AI clients: Stable Diffusion scene images and
//! Whisper transcription.

use preel_models::AspectRatio;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::config::{http_client, GenAiConfig};
use crate::error::{GenAiError, GenAiResult};

const SDXL_MODEL: &str = "@cf/stabilityai/stable-diffusion-xl-base-1.0";
const WHISPER_MODEL: &str = "@cf/openai/whisper";

/// Longest image side requested from Stable Diffusion.
const SDXL_BASE_SIDE: u32 = 1024;

/// Stable Diffusion XL client for scene images.
pub struct WorkersAiImageClient {
    account_id: String,
    api_token: String,
    base_url: String,
    client: Client,
}

/// Whisper speech-to-text client.
pub struct WorkersAiWhisperClient {
    account_id: String,
    api_token: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    result: Option<WhisperResult>,
}

#[derive(Debug, Deserialize)]
struct WhisperResult {
    text: String,
}

fn check_cf_config(config: &GenAiConfig) -> GenAiResult<()> {
    if config.cf_account_id.is_empty() {
        return Err(GenAiError::config("CF_ACCOUNT_ID not set"));
    }
    if config.cf_api_token.is_empty() {
        return Err(GenAiError::config("CF_API_TOKEN not set"));
    }
    Ok(())
}

fn run_url(base_url: &str, account_id: &str, model: &str) -> String {
    format!(
        "{}/client/v4/accounts/{}/ai/run/{}",
        base_url, account_id, model
    )
}

/// Image dimensions for an aspect ratio, longest side pinned to the
/// model's preferred base and both sides kept on multiples of 8.
fn image_dimensions(aspect: AspectRatio) -> (u32, u32) {
    let (w, h) = if aspect.width >= aspect.height {
        (
            SDXL_BASE_SIDE,
            SDXL_BASE_SIDE * aspect.height / aspect.width,
        )
    } else {
        (
            SDXL_BASE_SIDE * aspect.width / aspect.height,
            SDXL_BASE_SIDE,
        )
    };
    ((w / 8).max(32) * 8, (h / 8).max(32) * 8)
}

impl WorkersAiImageClient {
    /// Create a new Stable Diffusion client.
    pub fn new(config: &GenAiConfig) -> GenAiResult<Self> {
        check_cf_config(config)?;

        Ok(Self {
            account_id: config.cf_account_id.clone(),
            api_token: config.cf_api_token.clone(),
            base_url: config.cf_base_url.trim_end_matches('/').to_string(),
            client: http_client(config)?,
        })
    }

    /// Generate one image. A successful response body is the raw PNG.
    pub async fn generate(&self, prompt: &str, aspect_ratio: AspectRatio) -> GenAiResult<Vec<u8>> {
        let url = run_url(&self.base_url, &self.account_id, SDXL_MODEL);
        let (width, height) = image_dimensions(aspect_ratio);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&serde_json::json!({
                "prompt": prompt,
                "width": width,
                "height": height,
            }))
            .send()
            .await
            .map_err(|e| GenAiError::request(format!("Workers AI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(GenAiError::upstream("Workers AI", status, detail));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenAiError::request(format!("Workers AI body read failed: {}", e)))?;

        if bytes.is_empty() {
            return Err(GenAiError::bad_payload("Workers AI returned an empty image"));
        }

        info!(size = bytes.len(), width, height, "Scene image generated");
        Ok(bytes.to_vec())
    }
}

impl WorkersAiWhisperClient {
    /// Create a new Whisper client.
    pub fn new(config: &GenAiConfig) -> GenAiResult<Self> {
        check_cf_config(config)?;

        Ok(Self {
            account_id: config.cf_account_id.clone(),
            api_token: config.cf_api_token.clone(),
            base_url: config.cf_base_url.trim_end_matches('/').to_string(),
            client: http_client(config)?,
        })
    }

    /// Transcribe an audio recording to text.
    pub async fn transcribe(&self, audio: &[u8]) -> GenAiResult<String> {
        let url = run_url(&self.base_url, &self.account_id, WHISPER_MODEL);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| GenAiError::request(format!("Whisper request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(GenAiError::upstream("Whisper", status, detail));
        }

        let body: WhisperResponse = response
            .json()
            .await
            .map_err(|e| GenAiError::bad_payload(format!("Whisper response not JSON: {}", e)))?;

        let text = body
            .result
            .map(|r| r.text.trim().to_string())
            .ok_or_else(|| GenAiError::bad_payload("Whisper response has no transcript"))?;

        if text.is_empty() {
            return Err(GenAiError::bad_payload("Whisper produced an empty transcript"));
        }

        info!(chars = text.len(), "Audio transcribed");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> GenAiConfig {
        GenAiConfig {
            cf_account_id: "acct123".to_string(),
            cf_api_token: "token456".to_string(),
            cf_base_url: base_url,
            ..GenAiConfig::default()
        }
    }

    #[test]
    fn test_image_dimensions() {
        assert_eq!(image_dimensions(AspectRatio::SQUARE), (1024, 1024));
        assert_eq!(image_dimensions(AspectRatio::LANDSCAPE), (1024, 576));
        assert_eq!(image_dimensions(AspectRatio::PORTRAIT), (576, 1024));
    }

    #[tokio::test]
    async fn test_image_generation_returns_raw_bytes() {
        let server = MockServer::start().await;
        let png = b"\x89PNG scene image";

        Mock::given(method("POST"))
            .and(path(
                "/client/v4/accounts/acct123/ai/run/@cf/stabilityai/stable-diffusion-xl-base-1.0",
            ))
            .and(header("Authorization", "Bearer token456"))
            .and(body_partial_json(json!({"width": 1024, "height": 576})))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png.to_vec()))
            .mount(&server)
            .await;

        let client = WorkersAiImageClient::new(&test_config(server.uri())).unwrap();
        let bytes = client
            .generate("an owl in a forest", AspectRatio::LANDSCAPE)
            .await
            .unwrap();
        assert_eq!(bytes, png);
    }

    #[tokio::test]
    async fn test_image_generation_maps_auth_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let client = WorkersAiImageClient::new(&test_config(server.uri())).unwrap();
        let err = client
            .generate("anything", AspectRatio::SQUARE)
            .await
            .unwrap_err();
        assert!(matches!(err, GenAiError::Upstream { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_transcribe_extracts_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(
                "/client/v4/accounts/acct123/ai/run/@cf/openai/whisper",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"text": "  once upon a time in a magical forest  "},
                "success": true
            })))
            .mount(&server)
            .await;

        let client = WorkersAiWhisperClient::new(&test_config(server.uri())).unwrap();
        let text = client.transcribe(b"audio bytes").await.unwrap();
        assert_eq!(text, "once upon a time in a magical forest");
    }

    #[tokio::test]
    async fn test_transcribe_rejects_empty_transcript() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"result": {"text": ""}})),
            )
            .mount(&server)
            .await;

        let client = WorkersAiWhisperClient::new(&test_config(server.uri())).unwrap();
        let err = client.transcribe(b"audio bytes").await.unwrap_err();
        assert!(matches!(err, GenAiError::BadPayload(_)));
    }

    #[test]
    fn test_missing_account_is_config_error() {
        let config = GenAiConfig::default();
        assert!(matches!(
            WorkersAiImageClient::new(&config),
            Err(GenAiError::Config(_))
        ));
        assert!(matches!(
            WorkersAiWhisperClient::new(&config),
            Err(GenAiError::Config(_))
        ));
    }
}
