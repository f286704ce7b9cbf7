//! CSV upload handler.

use axum::extract::Multipart;
use axum::Json;
use serde::Serialize;
use tracing::info;

use preel_media::parse_prompts;

use crate::error::{ApiError, ApiResult};

/// Parsed prompt list returned to the caller for review before generation.
#[derive(Serialize)]
pub struct UploadCsvResponse {
    pub prompts: Vec<String>,
    pub count: usize,
}

/// Parse an uploaded CSV of prompts (first column, one prompt per row).
pub async fn upload_csv(mut multipart: Multipart) -> ApiResult<Json<UploadCsvResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !file_name.to_lowercase().ends_with(".csv") {
            return Err(ApiError::bad_request("File must be a CSV"));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Could not read upload: {e}")))?;

        let prompts = parse_prompts(&data)?;
        let count = prompts.len();

        info!(file = %file_name, count, "Parsed prompt CSV");

        return Ok(Json(UploadCsvResponse { prompts, count }));
    }

    Err(ApiError::bad_request("No file field in upload"))
}
