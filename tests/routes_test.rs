// ABOUTME: HTTP-level tests for the health, OAuth linking, account, and upload routes
// ABOUTME: Drives the axum router in-process with tower's oneshot over scripted platforms
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use reelpost_server::{models::Platform, routes::router};
use serde_json::{json, Value};
use tower::ServiceExt;

const BODY_LIMIT: usize = 1024 * 1024;
const BOUNDARY: &str = "reelpost-test-boundary";

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_body(selections: &Value, video: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"selections\"\r\n\r\n{selections}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"clip.mp4\"\r\nContent-Type: video/mp4\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(video);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_configured_platforms() {
    let (resources, _transport) =
        common::create_test_resources(common::configured_server_config())
            .await
            .unwrap();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(router(resources), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["platforms"]["youtube"], true);
    assert_eq!(body["platforms"]["facebook"], true);
}

#[tokio::test]
async fn test_start_returns_url_state_and_verifier() {
    let (resources, _transport) =
        common::create_test_resources(common::configured_server_config())
            .await
            .unwrap();
    let request = json_request(
        Method::POST,
        "/api/oauth/tiktok/start",
        &json!({"userId": "user-1", "forceConsent": false}),
    );

    let (status, body) = send(router(resources), request).await;
    assert_eq!(status, StatusCode::OK);
    let auth_url = body["authUrl"].as_str().unwrap();
    let state = body["state"].as_str().unwrap();
    assert!(auth_url.starts_with("https://www.tiktok.com/v2/auth/authorize/"));
    assert!(auth_url.contains(state));
    assert!(!body["codeVerifier"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_platform_is_a_validation_error() {
    let (resources, _transport) =
        common::create_test_resources(common::configured_server_config())
            .await
            .unwrap();
    let request = json_request(Method::POST, "/api/oauth/myspace/start", &json!({}));

    let (status, body) = send(router(resources), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], "Unsupported platform: myspace");
}

#[tokio::test]
async fn test_callback_relays_code_and_state() {
    let (resources, _transport) =
        common::create_test_resources(common::configured_server_config())
            .await
            .unwrap();
    let request = Request::builder()
        .uri("/api/oauth/youtube/callback?code=abc&state=xyz")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(router(resources), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["platform"], "youtube");
    assert_eq!(body["code"], "abc");
    assert_eq!(body["state"], "xyz");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_callback_relays_platform_denial() {
    let (resources, _transport) =
        common::create_test_resources(common::configured_server_config())
            .await
            .unwrap();
    let request = Request::builder()
        .uri("/api/oauth/facebook/callback?error=access_denied&error_description=Permissions+error&state=s1")
        .body(Body::empty())
        .unwrap();

    let (_, body) = send(router(resources), request).await;
    assert_eq!(body["error"], "access_denied: Permissions error");
    assert!(body["code"].is_null());
}

#[tokio::test]
async fn test_complete_errors_are_json_envelopes() {
    let (resources, _transport) =
        common::create_test_resources(common::configured_server_config())
            .await
            .unwrap();
    let app = router(resources);

    let (status, body) = send(
        app.clone(),
        json_request(
            Method::POST,
            "/api/oauth/youtube/complete",
            &json!({"state": "s"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_PARAMETERS");

    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/oauth/youtube/complete",
            &json!({"code": "c", "state": "never-issued", "codeVerifier": "v"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_unlink_returns_no_content_then_not_found() {
    let (resources, _transport) =
        common::create_test_resources(common::configured_server_config())
            .await
            .unwrap();
    common::link_fresh_account(resources.credentials(), Platform::Facebook, "1020")
        .await
        .unwrap();
    let app = router(resources);

    let delete = || {
        Request::builder()
            .method(Method::DELETE)
            .uri("/api/accounts/facebook/1020")
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = send(app.clone(), delete()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(app, delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_multipart_upload_reports_each_selection() {
    let (resources, transport) =
        common::create_test_resources(common::configured_server_config())
            .await
            .unwrap();
    common::link_fresh_account(resources.credentials(), Platform::YouTube, "UC1")
        .await
        .unwrap();
    common::script_youtube_success(&transport, "vid-9");

    let selections = json!([
        {"platform": "youtube", "accountId": "UC1", "metadata": {"title": "Ridge run", "privacy": "unlisted"}},
        {"platform": "tiktok", "accountId": "missing", "metadata": {"caption": "hi"}}
    ]);
    let (status, body) = send(
        router(resources),
        multipart_request(multipart_body(&selections, &[1_u8; 2048])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succeeded"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["results"][0]["status"], "success");
    assert_eq!(body["results"][0]["reference"], "vid-9");
    assert_eq!(body["results"][1]["status"], "error");
    assert_eq!(body["results"][1]["errorCode"], "NOT_FOUND");
}

#[tokio::test]
async fn test_multipart_upload_requires_a_file() {
    let (resources, _transport) =
        common::create_test_resources(common::configured_server_config())
            .await
            .unwrap();
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"selections\"\r\n\r\n[]\r\n--{BOUNDARY}--\r\n"
    );

    let (status, body) = send(router(resources), multipart_request(body.into_bytes())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "A video file is required");
}
