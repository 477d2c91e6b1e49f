//! Handler behaviour through the full router.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use whatsapp_gateway::api::{create_router, AppState};
use whatsapp_gateway::qr::QrStore;
use whatsapp_gateway::whatsapp::message::{ButtonType, OutboundMessage};
use whatsapp_gateway::whatsapp::SessionInfo;

use crate::support::{MockClient, SEND_TIMESTAMP};

struct Harness {
    app: Router,
    client: Arc<MockClient>,
    qr: QrStore,
    _tmp: tempfile::TempDir,
}

fn harness(client: MockClient) -> Harness {
    let tmp = match tempfile::tempdir() {
        Ok(tmp) => tmp,
        Err(err) => panic!("temp dir should be created: {err}"),
    };
    let client = Arc::new(client);
    let qr = QrStore::new(tmp.path().join("storages"));
    let app = create_router(AppState::new(client.clone(), qr.clone()));
    Harness {
        app,
        client,
        qr,
        _tmp: tmp,
    }
}

async fn call(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, String, Option<String>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()));
    let request = match request {
        Ok(request) => request,
        Err(err) => panic!("request should build: {err}"),
    };

    let response = match app.clone().oneshot(request).await {
        Ok(response) => response,
        Err(err) => panic!("router should respond: {err}"),
    };
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let bytes = match axum::body::to_bytes(response.into_body(), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => panic!("body should be readable: {err}"),
    };
    (status, String::from_utf8_lossy(&bytes).into_owned(), content_type)
}

fn json(body: &str) -> Value {
    match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => panic!("body should be JSON ({err}): {body}"),
    }
}

#[tokio::test]
async fn send_message_returns_id_and_timestamp() {
    let h = harness(MockClient::connected());
    let (status, body, content_type) = call(
        &h.app,
        Method::POST,
        "/api/send-message",
        r#"{"to":"5511999998888","message":"Olá!"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let body = json(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["messageId"], "3EB00001");
    assert_eq!(body["timestamp"], SEND_TIMESTAMP);

    let sent = h.client.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0.to_string(), "5511999998888@s.whatsapp.net");
    assert_eq!(sent[0].1, OutboundMessage::text("Olá!"));
}

#[tokio::test]
async fn invalid_address_is_rejected_without_sending() {
    let h = harness(MockClient::connected());
    for uri in ["/api/send-message", "/api/send-poll", "/api/send-buttons"] {
        let (status, body, _) = call(&h.app, Method::POST, uri, r#"{"to":"not a phone"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, "Invalid phone number");
    }
    assert!(h.client.sent().is_empty());
}

#[tokio::test]
async fn missing_destination_is_invalid_address() {
    let h = harness(MockClient::connected());
    let (status, body, _) = call(&h.app, Method::POST, "/api/send-message", r#"{"message":"hi"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid phone number");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let h = harness(MockClient::connected());
    let (status, body, _) = call(&h.app, Method::POST, "/api/send-message", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid JSON");

    let (status, _, _) = call(
        &h.app,
        Method::POST,
        "/api/send-poll",
        r#"{"to":"1","maxChoices":-1}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.client.sent().is_empty());
}

#[tokio::test]
async fn wrong_method_is_405() {
    let h = harness(MockClient::connected());
    let (status, body, _) = call(&h.app, Method::GET, "/api/send-message", "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, "Method not allowed");

    let (status, _, _) = call(&h.app, Method::DELETE, "/api/health", "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn send_failure_is_500_with_cause() {
    let client = MockClient::connected();
    client.fail_sends.store(true, Ordering::SeqCst);
    let h = harness(client);

    let (status, body, _) = call(
        &h.app,
        Method::POST,
        "/api/send-message",
        r#"{"to":"5511999998888","message":"hi"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Failed to send: not connected to WhatsApp");

    let (status, body, _) = call(
        &h.app,
        Method::POST,
        "/api/send-poll",
        r#"{"to":"5511999998888","name":"q","options":["a"],"maxChoices":1}"#,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Failed to send poll: "));

    let (status, body, _) = call(
        &h.app,
        Method::POST,
        "/api/send-buttons",
        r#"{"to":"5511999998888","body":"b","footer":"f","buttons":["x"]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Failed to send buttons: "));
}

#[tokio::test]
async fn send_poll_passes_options_through() {
    let h = harness(MockClient::connected());
    let (status, body, _) = call(
        &h.app,
        Method::POST,
        "/api/send-poll",
        r#"{"to":"5511999998888","name":"Lunch?","options":["Pizza","Sushi","Tacos"],"maxChoices":2}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["messageId"], "3EB00001");
    assert!(body.get("timestamp").is_none());

    let sent = h.client.sent();
    assert_eq!(sent.len(), 1);
    let OutboundMessage::Poll(poll) = &sent[0].1 else {
        panic!("expected poll, got {:?}", sent[0].1);
    };
    assert_eq!(poll.name, "Lunch?");
    assert_eq!(poll.selectable_options_count, 2);
    let names: Vec<&str> = poll.options.iter().map(|o| o.option_name.as_str()).collect();
    assert_eq!(names, vec!["Pizza", "Sushi", "Tacos"]);
}

#[tokio::test]
async fn send_buttons_assigns_ids_in_order() {
    let h = harness(MockClient::connected());
    let (status, body, _) = call(
        &h.app,
        Method::POST,
        "/api/send-buttons",
        r#"{"to":"5511999998888@s.whatsapp.net","body":"Confirm?","footer":"Acme","buttons":["Yes","No"]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["success"], true);

    let sent = h.client.sent();
    let OutboundMessage::Buttons(msg) = &sent[0].1 else {
        panic!("expected buttons, got {:?}", sent[0].1);
    };
    assert_eq!(msg.content_text, "Confirm?");
    assert_eq!(msg.footer_text, "Acme");
    let ids: Vec<(&str, &str)> = msg
        .buttons
        .iter()
        .map(|b| (b.button_id.as_str(), b.display_text.as_str()))
        .collect();
    assert_eq!(ids, vec![("btn_0", "Yes"), ("btn_1", "No")]);
    assert!(msg.buttons.iter().all(|b| b.button_type == ButtonType::Response));
}

#[tokio::test]
async fn health_reflects_connection() {
    let h = harness(MockClient::connected());
    let (status, body, content_type) = call(&h.app, Method::GET, "/api/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let body = json(&body);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["connected"], true);
    assert_eq!(body["service"], "whatsmeow");
    assert_eq!(body["version"], "1.0.0");
    assert!(body["timestamp"].as_i64().is_some_and(|t| t > 0));

    h.client.connected.store(false, Ordering::SeqCst);
    let (status, body, _) = call(&h.app, Method::GET, "/api/health", "").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let body = json(&body);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["connected"], false);
}

#[tokio::test]
async fn status_reports_session_identity() {
    let client = MockClient::connected().with_session(SessionInfo {
        connected: true,
        logged_in: true,
        push_name: "Acme Support".to_owned(),
        platform: "smba".to_owned(),
        business_name: "Acme".to_owned(),
    });
    let h = harness(client);

    let (status, body, _) = call(&h.app, Method::GET, "/api/status", "").await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["connected"], true);
    assert_eq!(body["loggedIn"], true);
    assert_eq!(body["pushName"], "Acme Support");
    assert_eq!(body["platform"], "smba");
    assert_eq!(body["businessName"], "Acme");
}

#[tokio::test]
async fn status_without_session_is_empty() {
    let h = harness(MockClient::disconnected());
    let (status, body, _) = call(&h.app, Method::GET, "/api/status", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json(&body),
        serde_json::json!({
            "connected": false,
            "loggedIn": false,
            "pushName": "",
            "platform": "",
            "businessName": ""
        })
    );
}

#[tokio::test]
async fn qr_is_404_until_cached_then_latest() {
    let h = harness(MockClient::disconnected());
    let (status, body, _) = call(&h.app, Method::GET, "/api/qr", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "No QR code available");

    if let Err(err) = h.qr.save("2@first").await {
        panic!("save should succeed: {err}");
    }
    if let Err(err) = h.qr.save("2@second").await {
        panic!("save should succeed: {err}");
    }

    let (status, body, _) = call(&h.app, Method::GET, "/api/qr", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!({"qrCode": "2@second"}));
}
