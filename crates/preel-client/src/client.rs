//! Typed HTTP client for the studio API.

use std::time::Duration;

use preel_models::{AspectRatio, JobKind, JobState};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Typed reqwest wrapper over the studio endpoints.
pub struct StudioClient {
    base_url: String,
    http: Client,
}

/// Prompt list parsed from an uploaded CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedPrompts {
    pub prompts: Vec<String>,
    pub count: usize,
}

/// Acknowledgement for a newly started job.
#[derive(Debug, Clone, Deserialize)]
pub struct StartedJob {
    pub job_id: String,
    pub status: String,
}

/// Job status snapshot returned by polling.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    pub status: JobState,
    pub progress: u8,
    pub current_task: String,
    pub job_type: JobKind,
    pub total_images: u32,
    #[serde(default)]
    pub total_scenes: Option<u32>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: String,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[derive(Serialize)]
struct GenerateImagesBody {
    prompts: Vec<String>,
    style: String,
    aspect_ratio: String,
}

#[derive(Serialize)]
struct GenerateVideoBody {
    script: String,
    style: String,
    aspect_ratio: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

impl StudioClient {
    /// Create a client for the given server base URL.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::config("server URL is empty"));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { base_url, http })
    }

    /// Upload a prompt CSV for parsing.
    pub async fn upload_csv(
        &self,
        file_name: &str,
        data: Vec<u8>,
    ) -> ClientResult<UploadedPrompts> {
        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/api/upload-csv", self.base_url))
            .multipart(form)
            .send()
            .await?;

        Self::handle(response).await
    }

    /// Start an image batch job.
    pub async fn generate_images(
        &self,
        prompts: Vec<String>,
        style: &str,
        aspect_ratio: AspectRatio,
    ) -> ClientResult<StartedJob> {
        let body = GenerateImagesBody {
            prompts,
            style: style.to_string(),
            aspect_ratio: aspect_ratio.to_string(),
        };

        let response = self
            .http
            .post(format!("{}/api/generate-images", self.base_url))
            .json(&body)
            .send()
            .await?;

        Self::handle(response).await
    }

    /// Start a script-to-video job.
    pub async fn generate_text_to_video(
        &self,
        script: &str,
        style: &str,
        aspect_ratio: AspectRatio,
    ) -> ClientResult<StartedJob> {
        let body = GenerateVideoBody {
            script: script.to_string(),
            style: style.to_string(),
            aspect_ratio: aspect_ratio.to_string(),
        };

        let response = self
            .http
            .post(format!("{}/api/generate-text-to-video", self.base_url))
            .json(&body)
            .send()
            .await?;

        Self::handle(response).await
    }

    /// Start a voice-to-video job from a narration recording.
    pub async fn generate_voice_to_video(
        &self,
        file_name: &str,
        audio: Vec<u8>,
        style: &str,
        aspect_ratio: AspectRatio,
    ) -> ClientResult<StartedJob> {
        let part = Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .part("audio", part)
            .text("style", style.to_string())
            .text("aspect_ratio", aspect_ratio.to_string());

        let response = self
            .http
            .post(format!("{}/api/generate-voice-to-video", self.base_url))
            .multipart(form)
            .send()
            .await?;

        Self::handle(response).await
    }

    /// Fetch the current status of a job.
    pub async fn job_status(&self, job_id: &str) -> ClientResult<JobStatus> {
        let response = self
            .http
            .get(format!("{}/api/job-status/{}", self.base_url, job_id))
            .send()
            .await?;

        Self::handle(response).await
    }

    /// Download the zip archive of a completed image batch.
    pub async fn download_images(&self, job_id: &str) -> ClientResult<Vec<u8>> {
        self.download(format!("{}/api/download/{}", self.base_url, job_id))
            .await
    }

    /// Download the mp4 of a completed video job.
    pub async fn download_video(&self, job_id: &str) -> ClientResult<Vec<u8>> {
        self.download(format!("{}/api/download-video/{}", self.base_url, job_id))
            .await
    }

    async fn download(&self, url: String) -> ClientResult<Vec<u8>> {
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let bytes = response.bytes().await?;
        debug!(url = %url, bytes = bytes.len(), "Downloaded artifact");
        Ok(bytes.to_vec())
    }

    async fn handle<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ClientError::bad_payload(e.to_string()))
    }

    async fn error_from(response: Response) -> ClientError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        // The server reports errors as {"detail": "..."}
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.detail)
            .unwrap_or(text);

        ClientError::api(status, detail)
    }
}
