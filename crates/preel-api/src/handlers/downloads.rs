//! Artifact download handlers.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::Response;
use tracing::info;

use preel_models::{Job, JobId, JobState};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Serve the zip archive of a completed image batch job.
pub async fn download_images(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let job = lookup(&state, job_id).await?;

    if job.kind.is_video() {
        return Err(ApiError::bad_request("Job did not produce a zip archive"));
    }

    let artifact = completed_artifact(&job, "Job not completed or no zip file available")?;
    let bytes = read_artifact(&artifact, "Zip file not found").await?;

    info!(job_id = %job.id, bytes = bytes.len(), "Serving image archive");

    serve_attachment(
        bytes,
        "application/zip",
        format!("promptreel_images_{}.zip", job.id),
    )
}

/// Serve the mp4 of a completed video job.
pub async fn download_video(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let job = lookup(&state, job_id).await?;

    if !job.kind.is_video() {
        return Err(ApiError::bad_request("Job did not produce a video"));
    }

    let artifact = completed_artifact(&job, "Job not completed or no video file available")?;
    let bytes = read_artifact(&artifact, "Video file not found").await?;

    info!(job_id = %job.id, bytes = bytes.len(), "Serving video");

    serve_attachment(
        bytes,
        "video/mp4",
        format!("promptreel_video_{}.mp4", job.id),
    )
}

async fn lookup(state: &AppState, job_id: String) -> ApiResult<Job> {
    state
        .store
        .get(&JobId::from_string(job_id))
        .await
        .ok_or_else(|| ApiError::not_found("Job not found"))
}

fn completed_artifact(job: &Job, detail: &str) -> ApiResult<std::path::PathBuf> {
    match (&job.state, &job.artifact) {
        (JobState::Completed, Some(path)) => Ok(path.clone()),
        _ => Err(ApiError::bad_request(detail)),
    }
}

async fn read_artifact(path: &std::path::Path, missing_detail: &str) -> ApiResult<Vec<u8>> {
    // The TTL sweeper may have deleted the file after the job record
    tokio::fs::read(path)
        .await
        .map_err(|_| ApiError::not_found(missing_detail))
}

fn serve_attachment(bytes: Vec<u8>, content_type: &str, filename: String) -> ApiResult<Response> {
    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .header(header::CONTENT_LENGTH, bytes.len())
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(e.to_string()))
}
