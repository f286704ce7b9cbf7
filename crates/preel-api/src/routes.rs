//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::downloads::{download_images, download_video};
use crate::handlers::generate::{generate_images, generate_text_to_video, generate_voice_to_video};
use crate::handlers::health::{api_root, health};
use crate::handlers::jobs::job_status;
use crate::handlers::uploads::upload_csv;
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let studio_routes = Router::new()
        .route("/", get(api_root))
        // Prompt intake
        .route("/upload-csv", post(upload_csv))
        // Generation pipelines
        .route("/generate-images", post(generate_images))
        .route("/generate-text-to-video", post(generate_text_to_video))
        .route("/generate-voice-to-video", post(generate_voice_to_video))
        // Polling and artifacts
        .route("/job-status/:job_id", get(job_status))
        .route("/download/:job_id", get(download_images))
        .route("/download-video/:job_id", get(download_video));

    // Rate limiter for API routes
    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = studio_routes.layer(middleware::from_fn_with_state(
        rate_limiter,
        rate_limit_middleware,
    ));

    let health_routes = Router::new().route("/health", get(health));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Request body size limit; audio uploads are the largest payloads
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
