//! Job-starting handlers for the three generation pipelines.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use preel_models::{AspectRatio, Job, JobId, JobKind, DEFAULT_STYLE};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Upload extensions accepted as narration audio.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg", "flac", "aac", "webm"];

/// Image batch request.
#[derive(Debug, Deserialize)]
pub struct GenerateImagesRequest {
    pub prompts: Vec<String>,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_image_aspect")]
    pub aspect_ratio: String,
}

/// Script-to-video request.
#[derive(Debug, Deserialize)]
pub struct GenerateVideoRequest {
    pub script: String,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_video_aspect")]
    pub aspect_ratio: String,
}

fn default_style() -> String {
    DEFAULT_STYLE.to_string()
}

fn default_image_aspect() -> String {
    AspectRatio::SQUARE.to_string()
}

fn default_video_aspect() -> String {
    AspectRatio::LANDSCAPE.to_string()
}

/// Acknowledgement that a job was accepted and is running in the background.
#[derive(Serialize)]
pub struct JobStartedResponse {
    pub job_id: String,
    pub status: String,
}

impl JobStartedResponse {
    fn new(job_id: &JobId) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: "started".to_string(),
        }
    }
}

fn parse_aspect(value: &str) -> ApiResult<AspectRatio> {
    value
        .trim()
        .parse()
        .map_err(|e: preel_models::AspectRatioParseError| ApiError::bad_request(e.to_string()))
}

fn has_audio_extension(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Start an image batch job: one image per prompt, zipped at the end.
pub async fn generate_images(
    State(state): State<AppState>,
    Json(request): Json<GenerateImagesRequest>,
) -> ApiResult<Json<JobStartedResponse>> {
    if request.prompts.is_empty() {
        return Err(ApiError::bad_request("No prompts provided"));
    }
    let aspect = parse_aspect(&request.aspect_ratio)?;

    let job = Job::new(JobKind::Images, request.prompts.len() as u32);
    let job_id = state.store.insert(job).await;

    info!(
        job_id = %job_id,
        prompts = request.prompts.len(),
        style = %request.style,
        "Starting image batch job"
    );

    state
        .runner
        .spawn_images(job_id.clone(), request.prompts, request.style, aspect);

    Ok(Json(JobStartedResponse::new(&job_id)))
}

/// Start a script-to-video job. Scene count is unknown until the
/// script is split, so the job starts with zero work items.
pub async fn generate_text_to_video(
    State(state): State<AppState>,
    Json(request): Json<GenerateVideoRequest>,
) -> ApiResult<Json<JobStartedResponse>> {
    if request.script.trim().is_empty() {
        return Err(ApiError::bad_request("No script provided"));
    }
    let aspect = parse_aspect(&request.aspect_ratio)?;

    let job = Job::new(JobKind::TextToVideo, 0);
    let job_id = state.store.insert(job).await;

    info!(
        job_id = %job_id,
        script_chars = request.script.len(),
        style = %request.style,
        "Starting text-to-video job"
    );

    state
        .runner
        .spawn_text_to_video(job_id.clone(), request.script, request.style, aspect);

    Ok(Json(JobStartedResponse::new(&job_id)))
}

/// Start a voice-to-video job from an uploaded narration recording.
///
/// Multipart fields: `audio` (the recording), optional `style` and
/// `aspect_ratio` text fields.
pub async fn generate_voice_to_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<JobStartedResponse>> {
    let mut audio: Option<(String, Vec<u8>)> = None;
    let mut style = DEFAULT_STYLE.to_string();
    let mut aspect = AspectRatio::LANDSCAPE;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("audio") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if !has_audio_extension(&file_name) {
                    return Err(ApiError::bad_request("File must be an audio recording"));
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Could not read upload: {e}")))?;
                audio = Some((file_name, bytes.to_vec()));
            }
            Some("style") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Could not read upload: {e}")))?;
                if !text.trim().is_empty() {
                    style = text.trim().to_string();
                }
            }
            Some("aspect_ratio") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Could not read upload: {e}")))?;
                aspect = parse_aspect(&text)?;
            }
            _ => {}
        }
    }

    let (file_name, audio) =
        audio.ok_or_else(|| ApiError::bad_request("No audio file provided"))?;
    if audio.is_empty() {
        return Err(ApiError::bad_request("Audio file is empty"));
    }

    let job = Job::new(JobKind::VoiceToVideo, 0);
    let job_id = state.store.insert(job).await;

    info!(
        job_id = %job_id,
        file = %file_name,
        bytes = audio.len(),
        style = %style,
        "Starting voice-to-video job"
    );

    state
        .runner
        .spawn_voice_to_video(job_id.clone(), audio, file_name, style, aspect);

    Ok(Json(JobStartedResponse::new(&job_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aspect() {
        assert_eq!(parse_aspect("16:9").unwrap(), AspectRatio::LANDSCAPE);
        assert_eq!(parse_aspect(" 1:1 ").unwrap(), AspectRatio::SQUARE);
        assert!(parse_aspect("wide").is_err());
        assert!(parse_aspect("0:9").is_err());
    }

    #[test]
    fn test_audio_extension_whitelist() {
        assert!(has_audio_extension("narration.mp3"));
        assert!(has_audio_extension("NARRATION.WAV"));
        assert!(has_audio_extension("take.2.m4a"));
        assert!(!has_audio_extension("script.txt"));
        assert!(!has_audio_extension("noext"));
    }
}
