//! HTTP surface tests for routes that need no upstream calls.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use server_core::{server::build_app, Config};
use tower::ServiceExt;

fn config_without_key() -> Config {
    Config {
        openai_api_key: None,
        default_model: "gpt-4o-mini".to_string(),
        port: 0,
    }
}

fn config_with_key() -> Config {
    Config {
        openai_api_key: Some("sk-test".to_string()),
        ..config_without_key()
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = build_app(&config_without_key()).unwrap();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({"ok": true}));
}

#[tokio::test]
async fn search_without_api_key_is_refused() {
    let app = build_app(&config_without_key()).unwrap();
    let response = app
        .oneshot(json_post("/search", r#"{"query": "metal straws"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "missing_api_key");
    assert!(body["message"].as_str().unwrap().contains("OPENAI_API_KEY"));
}

#[tokio::test]
async fn judge_without_api_key_is_refused() {
    let app = build_app(&config_without_key()).unwrap();
    let response = app
        .oneshot(json_post("/judge", r#"{"name": "plastic straws"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "missing_api_key");
}

#[tokio::test]
async fn judge_requires_name_or_link() {
    let app = build_app(&config_with_key()).unwrap();
    let response = app.oneshot(json_post("/judge", "{}")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("product.name and/or product.link"));
}

#[tokio::test]
async fn judge_tolerates_missing_body() {
    let app = build_app(&config_with_key()).unwrap();
    let response = app
        .oneshot(Request::post("/judge").body(Body::empty()).unwrap())
        .await
        .unwrap();

    // No body behaves like an empty one: validation, not a 415/422.
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_request");
}

#[tokio::test]
async fn extract_image_requires_url() {
    let app = build_app(&config_without_key()).unwrap();
    let response = app
        .oneshot(Request::get("/extract-image").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_request");
}

#[tokio::test]
async fn image_proxy_requires_url() {
    let app = build_app(&config_without_key()).unwrap();
    let response = app
        .oneshot(Request::get("/image-proxy").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn image_proxy_rejects_non_http_schemes() {
    let app = build_app(&config_without_key()).unwrap();
    let response = app
        .oneshot(
            Request::get("/image-proxy?url=file:///etc/passwd")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_request");
}
