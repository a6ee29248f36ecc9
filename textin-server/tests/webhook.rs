//! HTTP-level tests for the webhook router.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use textin_core::{MonotonicClock, RecordingOutbound, Registry};
use textin_server::config::{OutboundConfig, ServerConfig};
use textin_server::server::{router, AppState};

fn app() -> (Router, Arc<Registry>, Arc<RecordingOutbound>) {
    let outbound = Arc::new(RecordingOutbound::new());
    let registry = Registry::new(outbound.clone(), Arc::new(MonotonicClock::new()));
    let state = AppState {
        config: Arc::new(ServerConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            log_file: None,
            outbound: OutboundConfig::DryRun,
        }),
        registry: registry.clone(),
    };
    (router(state), registry, outbound)
}

async fn post_sms(app: &Router, from: &str, body: &str) -> (StatusCode, String) {
    let form =
        serde_urlencoded::to_string([("From", from), ("Body", body), ("AccountSid", "AC123")])
            .unwrap();
    let request = Request::post("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_registration_over_webhook() {
    let (app, registry, _outbound) = app();

    let (status, xml) = post_sms(&app, "+15550000001", "Alice").await;
    assert_eq!(status, StatusCode::OK);
    assert!(xml.contains("<Response><Message>Welcome Alice!"));

    let (_, xml) = post_sms(&app, "+15550000001", "10").await;
    assert!(xml.contains("<Message>Next check-in in 10 mins.</Message>"));
    assert_eq!(registry.len(), 1);

    let (_, xml) = post_sms(&app, "+15550000001", "  on my way  ").await;
    assert!(xml.contains("Check-in received."));
    let summary = &registry.snapshot()[0];
    assert_eq!(summary.last_message.as_deref(), Some("on my way"));

    registry.shutdown();
}

#[tokio::test]
async fn test_silent_directive_returns_empty_response() {
    let (app, registry, outbound) = app();
    post_sms(&app, "+15550000001", "Alice").await;
    post_sms(&app, "+15550000001", "30").await;

    let (status, xml) = post_sms(&app, "+15550000001", "@sos flat tyre").await;
    assert_eq!(status, StatusCode::OK);
    assert!(xml.ends_with("<Response/>"));
    assert_eq!(outbound.count_containing("ALERT: Alice sent an @sos"), 1);

    registry.shutdown();
}

#[tokio::test]
async fn test_quit_over_webhook() {
    let (app, registry, _outbound) = app();
    post_sms(&app, "+15550000001", "Alice").await;
    post_sms(&app, "+15550000001", "30").await;

    let (_, xml) = post_sms(&app, "+15550000001", "@quit").await;
    assert!(xml.contains("<Message>Goodbye, and stay safe.</Message>"));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_query_string_webhook_with_empty_body() {
    let (app, registry, _outbound) = app();

    let request = Request::get("/?From=%2B15550000002").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/xml"
    );
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    let xml = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(xml.contains("<Message>Please input a valid name.</Message>"));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_missing_sender_is_rejected() {
    let (app, registry, _outbound) = app();

    let (status, _) = {
        let request = Request::post("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("Body=hello"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        (response.status(), ())
    };
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_status_lists_contacts() {
    let (app, registry, _outbound) = app();
    post_sms(&app, "+15550000001", "Alice").await;

    let request = Request::get("/api/status").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["listening"], "127.0.0.1:0");
    assert_eq!(json["contacts"][0]["id"], "+15550000001");
    assert_eq!(json["contacts"][0]["display_name"], "Alice");
    assert_eq!(json["contacts"][0]["lifecycle"], "awaiting_interval");

    let request = Request::get("/healthz").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    registry.shutdown();
}

#[tokio::test]
async fn test_form_body_with_reserved_characters() {
    let (app, registry, outbound) = app();
    post_sms(&app, "+15550000001", "Alice").await;
    post_sms(&app, "+15550000001", "30").await;

    let (_, xml) = post_sms(&app, "+15550000001", "@ok 100% fine = home & dry?").await;
    assert!(xml.contains("Check-in received."));
    assert_eq!(
        outbound.count_containing("UPDATE: Alice is @ok\n\"100% fine = home & dry?\""),
        1
    );
    assert_eq!(
        registry.snapshot()[0].last_message.as_deref(),
        Some("100% fine = home & dry?")
    );

    registry.shutdown();
}
