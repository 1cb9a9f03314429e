//! HTTP API contract tests
//!
//! Drives the axum router directly (no socket) and asserts the exact
//! response contract: status codes, field errors, partial-success warnings,
//! and the media preload/readiness endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use gesher_core::config::MediaConfig;
use gesher_core::media::MediaReadinessStore;
use gesher_core::media::test_support::{MockLoader, MockResolver};
use gesher_core::notify::NotificationDispatcher;
use gesher_core::notify::test_support::{MockChatRelay, MockEmailRelay};
use gesher_web::{AppState, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    app: Router,
    email: Arc<MockEmailRelay>,
    chat: Arc<MockChatRelay>,
    resolver: Arc<MockResolver>,
}

fn test_app(email: MockEmailRelay, chat: MockChatRelay) -> TestApp {
    let resolver = Arc::new(MockResolver::succeeds_with("http://cdn/hero.mp4"));
    let media = MediaReadinessStore::new(
        resolver.clone(),
        Arc::new(MockLoader::instant()),
        &MediaConfig::default(),
    );

    let email = Arc::new(email);
    let chat = Arc::new(chat);
    let dispatcher = Arc::new(NotificationDispatcher::new(email.clone(), chat.clone()));

    let state = AppState {
        media,
        dispatcher,
        server_started_at: std::time::Instant::now(),
    };

    TestApp {
        app: build_router(state),
        email,
        chat,
        resolver,
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn valid_contact_body() -> Value {
    json!({
        "subject": "donation",
        "firstName": "Dana",
        "lastName": "Cohen",
        "phone": "0501234567",
        "email": "d@x.com",
        "message": "Hello there, this is long enough."
    })
}

#[tokio::test]
async fn contact_full_success_returns_ok_with_details() {
    let test = test_app(MockEmailRelay::succeeds(), MockChatRelay::succeeds());

    let response = test
        .app
        .oneshot(post_json("/api/contact", valid_contact_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["details"]["email"], json!(true));
    assert_eq!(body["details"]["whatsapp"], json!(true));
    assert!(body.get("errors").is_none());
    assert!(body.get("warning").is_none());
}

#[tokio::test]
async fn contact_invalid_phone_returns_400_without_dispatch() {
    let test = test_app(MockEmailRelay::succeeds(), MockChatRelay::succeeds());

    let mut body = valid_contact_body();
    body["phone"] = json!("123");

    let response = test
        .app
        .oneshot(post_json("/api/contact", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["fieldErrors"]["phone"].is_string());
    assert_eq!(body["error"], json!("The submitted form contains errors"));

    // No channel may be attempted for an invalid submission
    assert_eq!(test.email.invocations(), 0);
    assert_eq!(test.chat.invocations(), 0);
}

#[tokio::test]
async fn contact_validation_reports_all_fields_at_once() {
    let test = test_app(MockEmailRelay::succeeds(), MockChatRelay::succeeds());

    let mut body = valid_contact_body();
    body["subject"] = json!("");
    body["message"] = json!("abc");

    let response = test
        .app
        .oneshot(post_json("/api/contact", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["fieldErrors"]["subject"].is_string());
    assert!(body["fieldErrors"]["message"].is_string());
}

#[tokio::test]
async fn contact_partial_success_returns_200_with_warning() {
    let test = test_app(
        MockEmailRelay::fails_with("relay timeout"),
        MockChatRelay::succeeds(),
    );

    let response = test
        .app
        .oneshot(post_json("/api/contact", valid_contact_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["ok"], json!(true));
    assert!(body["warning"].is_string());
    assert_eq!(body["details"]["email"], json!(false));
    assert_eq!(body["details"]["whatsapp"], json!(true));
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn contact_total_failure_returns_500() {
    let test = test_app(
        MockEmailRelay::fails_with("email down"),
        MockChatRelay::fails_with("chat down"),
    );

    let response = test
        .app
        .oneshot(post_json("/api/contact", valid_contact_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], json!("Sending failed on every channel"));
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn contact_skip_email_flag_bypasses_email_channel() {
    let test = test_app(MockEmailRelay::succeeds(), MockChatRelay::succeeds());

    let mut body = valid_contact_body();
    body["skipEmail"] = json!(true);

    let response = test
        .app
        .clone()
        .oneshot(post_json("/api/contact", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["details"]["email"], json!(false));
    assert_eq!(body["details"]["whatsapp"], json!(true));
    assert!(body.get("errors").is_none());
    assert_eq!(test.email.invocations(), 0);
}

#[tokio::test]
async fn media_preload_and_readiness_roundtrip() {
    let test = test_app(MockEmailRelay::succeeds(), MockChatRelay::succeeds());

    // First preload starts the attempt
    let response = test
        .app
        .clone()
        .oneshot(post_json("/api/media/preload/videos/hero.mp4", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["started"], json!(true));

    // Poll readiness until the asset is ready
    let mut ready = false;
    for _ in 0..100 {
        let response = test
            .app
            .clone()
            .oneshot(get("/api/media/ready/videos/hero.mp4"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        if body["ready"] == json!(true) {
            assert_eq!(body["url"], json!("http://cdn/hero.mp4"));
            ready = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(ready, "asset never became ready");

    // Second preload joins instead of re-fetching
    let response = test
        .app
        .clone()
        .oneshot(post_json("/api/media/preload/videos/hero.mp4", json!({})))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["started"], json!(false));
    assert_eq!(test.resolver.invocations(), 1);
}

#[tokio::test]
async fn media_readiness_for_unknown_key_is_not_ready() {
    let test = test_app(MockEmailRelay::succeeds(), MockChatRelay::succeeds());

    let response = test
        .app
        .oneshot(get("/api/media/ready/videos/unknown.mp4"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["ready"], json!(false));
    assert_eq!(body["status"], json!("idle"));
}

#[tokio::test]
async fn health_reports_version_and_uptime() {
    let test = test_app(MockEmailRelay::succeeds(), MockChatRelay::succeeds());

    let response = test.app.oneshot(get("/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], json!("ok"));
    assert!(body["version"].is_string());
    assert!(body["uptime_secs"].is_number());
}
