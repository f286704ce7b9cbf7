//! Gemini Imagen client for prompt-to-image generation.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use preel_models::AspectRatio;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{http_client, GenAiConfig};
use crate::error::{GenAiError, GenAiResult};

/// Imagen REST client.
pub struct GeminiImageClient {
    api_key: String,
    base_url: String,
    models: Vec<String>,
    client: Client,
}

/// Imagen predict request.
#[derive(Debug, Serialize)]
struct ImagenRequest {
    instances: Vec<Instance>,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Instance {
    prompt: String,
}

#[derive(Debug, Serialize)]
struct Parameters {
    #[serde(rename = "sampleCount")]
    sample_count: u32,
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
}

/// Imagen predict response.
#[derive(Debug, Deserialize)]
struct ImagenResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(rename = "bytesBase64Encoded")]
    bytes_base64_encoded: Option<String>,
}

impl GeminiImageClient {
    /// Create a new Imagen client.
    pub fn new(config: &GenAiConfig) -> GenAiResult<Self> {
        if config.gemini_api_key.is_empty() {
            return Err(GenAiError::config("GEMINI_API_KEY not set"));
        }

        Ok(Self {
            api_key: config.gemini_api_key.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            models: config.gemini_image_models.clone(),
            client: http_client(config)?,
        })
    }

    /// Generate a single image, trying the configured models in order.
    pub async fn generate(&self, prompt: &str, aspect_ratio: AspectRatio) -> GenAiResult<Vec<u8>> {
        let mut last_error = None;

        for model in &self.models {
            match self.call_model(model, prompt, aspect_ratio).await {
                Ok(bytes) => {
                    info!(model = %model, size = bytes.len(), "Imagen generation succeeded");
                    return Ok(bytes);
                }
                Err(e) => {
                    warn!(model = %model, "Imagen generation failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| GenAiError::config("No Imagen models configured")))
    }

    async fn call_model(
        &self,
        model: &str,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> GenAiResult<Vec<u8>> {
        let url = format!(
            "{}/v1beta/models/{}:predict?key={}",
            self.base_url, model, self.api_key
        );

        let request = ImagenRequest {
            instances: vec![Instance {
                prompt: prompt.to_string(),
            }],
            parameters: Parameters {
                sample_count: 1,
                aspect_ratio: aspect_ratio.to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenAiError::request(format!("Imagen request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(GenAiError::upstream("Imagen", status, detail));
        }

        let body: ImagenResponse = response
            .json()
            .await
            .map_err(|e| GenAiError::bad_payload(format!("Imagen response not JSON: {}", e)))?;

        let encoded = body
            .predictions
            .first()
            .and_then(|p| p.bytes_base64_encoded.as_deref())
            .ok_or_else(|| GenAiError::bad_payload("Imagen response has no image data"))?;

        BASE64
            .decode(encoded)
            .map_err(|e| GenAiError::bad_payload(format!("Imagen image data not base64: {}", e)))
    }
}
