//! HTTP surface tests for the OAuth integration endpoints and /health.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

mod common;
use common::*;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(create_test_app_state());
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_authorize_returns_salla_authorization_url() {
    let app = test_app(create_test_app_state());
    let response = app.oneshot(get("/integration/salla/authorize")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let url = body["authorization_url"].as_str().unwrap();
    assert!(url.starts_with("https://accounts.salla.sa/oauth2/authorize?"));
    assert!(url.contains("client_id=test-client"));
    assert!(url.contains("response_type=code"));
}

#[tokio::test]
async fn test_authorize_for_unimplemented_platform_is_501() {
    let app = test_app(create_test_app_state());
    let response = app.oneshot(get("/integration/zid/authorize")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn test_unknown_platform_path_is_rejected() {
    let app = test_app(create_test_app_state());
    let response = app.oneshot(get("/integration/shopify/authorize")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_without_code_is_bad_request() {
    let app = test_app(create_test_app_state());
    let response = app.oneshot(get("/integration/salla/callback")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_with_upstream_denial_is_bad_gateway() {
    let app = test_app(create_test_app_state());
    let response = app
        .oneshot(get(
            "/integration/salla/callback?error=access_denied&error_description=user%20cancelled",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
