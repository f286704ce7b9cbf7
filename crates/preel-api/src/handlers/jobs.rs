//! Job status polling handler.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use preel_models::{Job, JobId, JobKind, JobState};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Job status snapshot for frontend polling.
#[derive(Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobState,
    pub progress: u8,
    pub current_task: String,
    pub job_type: JobKind,
    /// Work item count; scene count for video jobs, prompt count for batches
    pub total_images: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_scenes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: String,
}

impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id.to_string(),
            status: job.state,
            progress: job.progress,
            current_task: job.current_task.clone(),
            job_type: job.kind,
            total_images: job.total_items,
            total_scenes: job.kind.is_video().then_some(job.total_items),
            error_message: job.error_message.clone(),
            created_at: job.created_at.to_rfc3339(),
        }
    }
}

/// Look up a job by ID.
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job = state
        .store
        .get(&JobId::from_string(job_id))
        .await
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(JobStatusResponse::from(&job)))
}
