//! Generation service configuration.

/// Connection settings for the external generation services.
#[derive(Debug, Clone)]
pub struct GenAiConfig {
    /// Gemini API key (required for image batch jobs)
    pub gemini_api_key: String,
    /// Gemini REST endpoint
    pub gemini_base_url: String,
    /// Imagen models tried in order until one succeeds
    pub gemini_image_models: Vec<String>,
    /// Cloudflare account for Workers AI
    pub cf_account_id: String,
    /// Cloudflare API token for Workers AI
    pub cf_api_token: String,
    /// Cloudflare REST endpoint
    pub cf_base_url: String,
    /// Translate TTS endpoint
    pub tts_base_url: String,
    /// Narration language code
    pub tts_language: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            gemini_image_models: vec!["imagen-3.0-generate-002".to_string()],
            cf_account_id: String::new(),
            cf_api_token: String::new(),
            cf_base_url: "https://api.cloudflare.com".to_string(),
            tts_base_url: "https://translate.google.com".to_string(),
            tts_language: "en".to_string(),
            timeout_secs: 120,
        }
    }
}

impl GenAiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or(defaults.gemini_base_url),
            gemini_image_models: std::env::var("GEMINI_IMAGE_MODELS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .collect::<Vec<_>>()
                })
                .filter(|models| !models.is_empty())
                .unwrap_or(defaults.gemini_image_models),
            cf_account_id: std::env::var("CF_ACCOUNT_ID").unwrap_or_default(),
            cf_api_token: std::env::var("CF_API_TOKEN").unwrap_or_default(),
            cf_base_url: std::env::var("CF_BASE_URL").unwrap_or(defaults.cf_base_url),
            tts_base_url: std::env::var("TTS_BASE_URL").unwrap_or(defaults.tts_base_url),
            tts_language: std::env::var("TTS_LANGUAGE").unwrap_or(defaults.tts_language),
            timeout_secs: std::env::var("GENAI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

/// Build the shared HTTP client with the configured timeout.
pub(crate) fn http_client(config: &GenAiConfig) -> crate::GenAiResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| crate::GenAiError::request(format!("Failed to build HTTP client: {}", e)))
}
