use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;
use visionprompt_sdk::{
    visionprompt_sdk_test::{MockGateway, MockResult},
    EditedImage, GatewayError, SyntheticGateway, PLACEHOLDER_IMAGE_URLS,
};
use visionprompt_server::{api_router, AppState};

fn synthetic_router() -> Router {
    api_router(AppState::new(Arc::new(SyntheticGateway::instant())))
}

async fn post_json(router: Router, path: &str, body: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::post(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_raw(router: Router, uri: &str) -> axum::response::Response {
    router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn missing_idea_text_is_bad_request() {
    let (status, body) = post_json(synthetic_router(), "/api/generate-prompt", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Idea text is required" }));
}

#[tokio::test]
async fn engineer_prompt_returns_all_fields() {
    let (status, body) = post_json(
        synthetic_router(),
        "/api/generate-prompt",
        r#"{ "ideaText": "a cat in space", "settings": { "style": "Anime" } }"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["basicPrompt"], "a cat in space");
    let advanced = body["advancedPrompt"].as_str().unwrap();
    assert!(advanced.contains("Anime"));
    assert!(advanced.ends_with("--ar 16:9"));
    assert!(body["negativePrompt"].is_string());
    assert!(body["explanation"].is_string());
}

#[tokio::test]
async fn video_prompt_endpoint() {
    let (status, body) = post_json(
        synthetic_router(),
        "/api/generate-video-prompt",
        r#"{ "ideaText": "a train", "videoSettings": { "duration": "10 Seconds" } }"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["prompt"].as_str().unwrap().contains("10 Seconds"));
}

#[tokio::test]
async fn generate_image_validates_and_returns_placeholders() {
    let (status, body) = post_json(synthetic_router(), "/api/generate-image", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Prompt is required");

    let (status, body) = post_json(
        synthetic_router(),
        "/api/generate-image",
        r#"{ "prompt": "A cat in orbit", "aspectRatio": "1:1" }"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["images"], json!(PLACEHOLDER_IMAGE_URLS));
}

#[tokio::test]
async fn edit_image_returns_prompt_lineage() {
    let (status, body) = post_json(
        synthetic_router(),
        "/api/edit-image",
        r#"{ "image": "https://cdn.example.com/1.png", "prompt": "make the sky red",
             "aspectRatio": "16:9", "originalPrompt": "A cat in orbit" }"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newPrompt"], "A cat in orbit [EDIT]: make the sky red");
    assert_eq!(body["images"].as_array().unwrap().len(), 1);

    let (status, body) = post_json(
        synthetic_router(),
        "/api/edit-image",
        r#"{ "image": "https://cdn.example.com/1.png" }"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Image and edit prompt are required");
}

#[tokio::test]
async fn malformed_json_is_internal_error() {
    let (status, body) = post_json(synthetic_router(), "/api/generate-prompt", "{").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("Internal error"));
}

#[tokio::test]
async fn upstream_error_is_server_error_with_message() {
    let gateway = MockGateway::new();
    gateway.enqueue_edit_image(MockResult::<EditedImage>::error(GatewayError::Upstream(
        "Grok API error: Bad Gateway (502 Bad Gateway)".to_string(),
    )));
    let router = api_router(AppState::new(Arc::new(gateway)));

    let (status, body) = post_json(
        router,
        "/api/edit-image",
        r#"{ "image": "https://cdn.example.com/1.png", "prompt": "add a moon" }"#,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("Bad Gateway"));
}

#[tokio::test]
async fn download_requires_url() {
    let response = get_raw(synthetic_router(), "/api/download").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Missing URL parameter");
}

#[tokio::test]
async fn download_rejects_non_http_urls() {
    for url in ["file:///etc/passwd", "ftp://example.com/cat.png", "not a url"] {
        let uri = format!("/api/download?url={}", urlencoding::encode(url));
        let response = get_raw(synthetic_router(), &uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{url}");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Invalid URL parameter");
    }
}

#[tokio::test]
async fn download_proxies_bytes_as_attachment() {
    let origin = spawn(Router::new().route(
        "/cat.jpg",
        get(|| async { ([(header::CONTENT_TYPE, "image/jpeg")], vec![0xFF_u8, 0xD8, 0xFF]) }),
    ))
    .await;
    let uri = format!(
        "/api/download?url={}",
        urlencoding::encode(&format!("{origin}/cat.jpg"))
    );

    let response = get_raw(synthetic_router(), &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "public, max-age=31536000, immutable"
    );
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"visionprompt-generation-"));
    assert!(disposition.ends_with(".png\""));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], &[0xFF, 0xD8, 0xFF]);
}

#[tokio::test]
async fn download_failure_is_server_error() {
    let origin = spawn(Router::new()).await;
    let uri = format!(
        "/api/download?url={}",
        urlencoding::encode(&format!("{origin}/missing.png"))
    );

    let response = get_raw(synthetic_router(), &uri).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Failed to download image");
}
