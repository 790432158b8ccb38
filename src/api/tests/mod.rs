use super::*;
use crate::types::ProgressSnapshot;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};


/// Helper to create a test ImageDownloader instance wrapped in Arc
async fn create_test_downloader() -> (Arc<ImageDownloader>, tempfile::TempDir) {
    let (downloader, temp_dir) = crate::downloader::test_helpers::create_test_downloader().await;
    (Arc::new(downloader), temp_dir)
}

/// Router over a fresh downloader; `configure` adjusts the config first
async fn test_app(
    configure: impl FnOnce(&mut Config),
) -> (Router, Arc<ImageDownloader>, tempfile::TempDir) {
    let (downloader, temp_dir) = create_test_downloader().await;
    let mut config = (*downloader.config).clone();
    configure(&mut config);
    let app = create_router(downloader.clone(), Arc::new(config));
    (app, downloader, temp_dir)
}

/// Router with the session gate disabled
async fn open_app() -> (Router, Arc<ImageDownloader>, tempfile::TempDir) {
    test_app(|config| config.auth.enabled = false).await
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Parse every `data:` line of an SSE body as JSON
fn sse_data(body: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(body)
        .lines()
        .filter_map(|line| line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}

/// Submit through POST /start and return the task id string
async fn start(app: &Router, urls: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/start", serde_json::json!({ "urls": urls })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["task_id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_api_server_spawns_and_stops_on_shutdown() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = crate::downloader::test_helpers::test_config(temp_dir.path());
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let downloader = Arc::new(ImageDownloader::new(config).await.unwrap());

    let api_handle = downloader.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished());

    downloader.shutdown().await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), api_handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let (app, _downloader, _temp_dir) = test_app(|config| {
        config.api.cors_enabled = true;
        config.api.cors_origins = vec!["*".to_string()];
    })
    .await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (app, _downloader, _temp_dir) = test_app(|config| config.api.cors_enabled = false).await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}
