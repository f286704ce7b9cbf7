//! API integration tests.
//!
//! Drives the router directly with `tower::ServiceExt::oneshot`; the
//! Imagen upstream is a wiremock server so image batches run end to end.

use std::io::Cursor;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use preel_api::{create_router, ApiConfig, AppState};
use preel_genai::GenAiConfig;
use preel_models::{Job, JobKind};
use preel_runner::StudioConfig;

const FAKE_PNG: &[u8] = b"fakepng";
const BOUNDARY: &str = "preel-test-boundary";

fn test_state(genai_base: &str, data_dir: std::path::PathBuf) -> AppState {
    let config = ApiConfig {
        // High enough that polling loops never trip the limiter
        rate_limit_rps: 1000,
        ..ApiConfig::default()
    };
    let studio = StudioConfig {
        data_dir,
        item_delay_ms: 0,
        ..StudioConfig::default()
    };
    let genai = GenAiConfig {
        gemini_api_key: "test-key".to_string(),
        gemini_base_url: genai_base.to_string(),
        cf_account_id: "acct".to_string(),
        cf_api_token: "token".to_string(),
        cf_base_url: genai_base.to_string(),
        tts_base_url: genai_base.to_string(),
        ..GenAiConfig::default()
    };
    AppState::new(config, studio, genai)
}

fn test_router(state: AppState) -> Router {
    create_router(state, None)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(
    uri: &str,
    field: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
    text_fields: &[(&str, &str)],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
    for (name, value) in text_fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Poll job status until the job reaches a terminal state.
async fn poll_until_terminal(app: &Router, job_id: &str) -> Value {
    for _ in 0..250 {
        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/job-status/{job_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let status = body_json(response).await;
        match status["status"].as_str().unwrap() {
            "completed" | "failed" => return status,
            _ => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    panic!("job {job_id} did not reach a terminal state");
}

async fn mock_imagen(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1beta/models/imagen-3.0-generate-002:predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [{"bytesBase64Encoded": BASE64.encode(FAKE_PNG)}]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_api_root_banner() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(test_state("http://127.0.0.1:9", dir.path().to_path_buf()));

    let response = app.oneshot(get_request("/api/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "PromptReel Studio API");
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(test_state("http://127.0.0.1:9", dir.path().to_path_buf()));

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn test_upload_csv_returns_prompts_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(test_state("http://127.0.0.1:9", dir.path().to_path_buf()));

    let csv = b"a castle at dawn\n\"a dragon, sleeping\"\n\nthe knight departs\n";
    let request = multipart_request("/api/upload-csv", "file", "prompts.csv", "text/csv", csv, &[]);

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["prompts"][0], "a castle at dawn");
    assert_eq!(body["prompts"][1], "a dragon, sleeping");
    assert_eq!(body["prompts"][2], "the knight departs");
}

#[tokio::test]
async fn test_upload_csv_rejects_non_csv_filename() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(test_state("http://127.0.0.1:9", dir.path().to_path_buf()));

    let request =
        multipart_request("/api/upload-csv", "file", "prompts.txt", "text/plain", b"hi", &[]);

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["detail"], "File must be a CSV");
}

#[tokio::test]
async fn test_upload_csv_rejects_blank_rows() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(test_state("http://127.0.0.1:9", dir.path().to_path_buf()));

    let request =
        multipart_request("/api/upload-csv", "file", "empty.csv", "text/csv", b"\n  \n\n", &[]);

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["detail"], "No valid prompts found in CSV");
}

#[tokio::test]
async fn test_generate_images_rejects_empty_prompts() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(test_state("http://127.0.0.1:9", dir.path().to_path_buf()));

    let response = app
        .oneshot(json_request(
            "/api/generate-images",
            json!({"prompts": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["detail"], "No prompts provided");
}

#[tokio::test]
async fn test_generate_images_rejects_bad_aspect_ratio() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(test_state("http://127.0.0.1:9", dir.path().to_path_buf()));

    let response = app
        .oneshot(json_request(
            "/api/generate-images",
            json!({"prompts": ["a lighthouse"], "aspect_ratio": "ultrawide"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_text_to_video_rejects_blank_script() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(test_state("http://127.0.0.1:9", dir.path().to_path_buf()));

    let response = app
        .oneshot(json_request(
            "/api/generate-text-to-video",
            json!({"script": "   "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["detail"], "No script provided");
}

#[tokio::test]
async fn test_generate_voice_to_video_rejects_non_audio_upload() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(test_state("http://127.0.0.1:9", dir.path().to_path_buf()));

    let request = multipart_request(
        "/api/generate-voice-to-video",
        "audio",
        "script.txt",
        "text/plain",
        b"not audio",
        &[],
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["detail"], "File must be an audio recording");
}

#[tokio::test]
async fn test_generate_voice_to_video_requires_audio_field() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(test_state("http://127.0.0.1:9", dir.path().to_path_buf()));

    let request = multipart_request(
        "/api/generate-voice-to-video",
        "other",
        "take.mp3",
        "audio/mpeg",
        b"RIFF",
        &[],
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["detail"], "No audio file provided");
}

#[tokio::test]
async fn test_job_status_unknown_job_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(test_state("http://127.0.0.1:9", dir.path().to_path_buf()));

    let response = app
        .oneshot(get_request("/api/job-status/no-such-job"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["detail"], "Job not found");
}

#[tokio::test]
async fn test_download_unknown_job_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(test_state("http://127.0.0.1:9", dir.path().to_path_buf()));

    let response = app
        .oneshot(get_request("/api/download/no-such-job"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_before_completion_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state("http://127.0.0.1:9", dir.path().to_path_buf());

    let job_id = state.store.insert(Job::new(JobKind::Images, 2)).await;
    let app = test_router(state);

    let response = app
        .oneshot(get_request(&format!("/api/download/{job_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(
        body["detail"],
        "Job not completed or no zip file available"
    );
}

#[tokio::test]
async fn test_download_rejects_video_job() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state("http://127.0.0.1:9", dir.path().to_path_buf());

    let job = Job::new(JobKind::TextToVideo, 2)
        .start()
        .complete(dir.path().join("video.mp4"));
    let job_id = state.store.insert(job).await;
    let app = test_router(state);

    let response = app
        .oneshot(get_request(&format!("/api/download/{job_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(
        body["detail"],
        "Job did not produce a zip archive"
    );
}

#[tokio::test]
async fn test_image_batch_end_to_end() {
    let server = MockServer::start().await;
    mock_imagen(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let app = test_router(test_state(&server.uri(), dir.path().to_path_buf()));

    // Start a three-prompt batch
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/generate-images",
            json!({
                "prompts": ["a castle at dawn", "a dragon sleeping", "the knight departs"],
                "style": "watercolor",
                "aspect_ratio": "1:1",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let started = body_json(response).await;
    assert_eq!(started["status"], "started");
    let job_id = started["job_id"].as_str().unwrap().to_string();

    // Poll until the job completes
    let status = poll_until_terminal(&app, &job_id).await;
    assert_eq!(status["status"], "completed", "job failed: {status}");
    assert_eq!(status["progress"], 100);
    assert_eq!(status["total_images"], 3);
    assert!(status["total_scenes"].is_null());

    // Download the archive
    let response = app
        .oneshot(get_request(&format!("/api/download/{job_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/zip"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(&format!("promptreel_images_{job_id}.zip")));

    let bytes = body_bytes(response).await;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 3);
    assert_eq!(archive.by_index(0).unwrap().name(), "image_001.png");
}

#[tokio::test]
async fn test_failed_batch_reports_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/imagen-3.0-generate-002:predict"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let app = test_router(test_state(&server.uri(), dir.path().to_path_buf()));

    let response = app
        .clone()
        .oneshot(json_request(
            "/api/generate-images",
            json!({"prompts": ["a doomed request"]}),
        ))
        .await
        .unwrap();
    let job_id = body_json(response).await["job_id"]
        .as_str()
        .unwrap()
        .to_string();

    let status = poll_until_terminal(&app, &job_id).await;
    assert_eq!(status["status"], "failed");
    assert!(status["error_message"].as_str().is_some());

    // A failed job has no artifact to download
    let response = app
        .oneshot(get_request(&format!("/api/download/{job_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = test_state("http://127.0.0.1:9", dir.path().to_path_buf());
    state.config.rate_limit_rps = 1;
    let app = test_router(state);

    // Second burst request from the same IP trips the limiter
    let mut limited = false;
    for _ in 0..3 {
        let request = Request::builder()
            .uri("/api/")
            .header("X-Forwarded-For", "192.168.1.50")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            limited = true;
            break;
        }
    }
    assert!(limited, "burst was never rate limited");
}

#[tokio::test]
async fn test_cors_preflight_allows_wildcard_origin() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(test_state("http://127.0.0.1:9", dir.path().to_path_buf()));

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/generate-images")
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}
