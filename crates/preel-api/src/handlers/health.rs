//! Health check and API banner handlers.

use axum::Json;
use chrono::Utc;
use serde::Serialize;

/// API banner response.
#[derive(Serialize)]
pub struct ApiRootResponse {
    pub message: String,
}

/// API banner. Lets deployment checks confirm the prefix is routed.
pub async fn api_root() -> Json<ApiRootResponse> {
    Json(ApiRootResponse {
        message: "PromptReel Studio API".to_string(),
    })
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
