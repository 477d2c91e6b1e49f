//! Bridge client against a fake sidecar on loopback.

use serde_json::Value;

use whatsapp_gateway::whatsapp::{BridgeClient, ClientError, Jid, MessagingClient, OutboundMessage};

use crate::support::serve_once;

#[tokio::test]
async fn send_posts_jid_and_message() {
    let (url, captured) = serve_once(
        "200 OK",
        r#"{"success":true,"data":{"id":"3EB0FEED","timestamp":"2024-03-01T12:00:00Z"}}"#,
    )
    .await;
    let client = BridgeClient::new(url);
    let to = Jid::user("5511999998888");

    let receipt = match client.send(&to, &OutboundMessage::text("hello")).await {
        Ok(receipt) => receipt,
        Err(err) => panic!("send should succeed: {err}"),
    };
    assert_eq!(receipt.id, "3EB0FEED");
    assert_eq!(receipt.timestamp.timestamp(), 1_709_294_400);

    let request = match captured.await {
        Ok(request) => request,
        Err(err) => panic!("request should be captured: {err}"),
    };
    assert!(request.head.starts_with("POST /send "));
    let body: Value = serde_json::from_str(&request.body).unwrap_or_default();
    assert_eq!(body["jid"], "5511999998888@s.whatsapp.net");
    assert_eq!(body["message"]["kind"], "text");
    assert_eq!(body["message"]["conversation"], "hello");
}

#[tokio::test]
async fn bridge_failure_surfaces_as_error() {
    let (url, _captured) = serve_once(
        "500 Internal Server Error",
        r#"{"success":false,"data":null,"error":"not logged in"}"#,
    )
    .await;
    let client = BridgeClient::new(url);

    let result = client
        .send(&Jid::user("1"), &OutboundMessage::text("x"))
        .await;
    match result {
        Err(ClientError::Bridge(msg)) => assert_eq!(msg, "not logged in"),
        other => panic!("expected bridge error, got: {other:?}"),
    }
}

#[tokio::test]
async fn offline_bridge_reports_not_connected() {
    let (url, _captured) = serve_once("503 Service Unavailable", "offline").await;
    let client = BridgeClient::new(url);

    let result = client
        .send(&Jid::user("1"), &OutboundMessage::text("x"))
        .await;
    match result {
        Err(ClientError::NotConnected) => {}
        other => panic!("expected not-connected error, got: {other:?}"),
    }
}

#[tokio::test]
async fn session_reads_status() {
    let (url, captured) = serve_once(
        "200 OK",
        r#"{"success":true,"data":{"connected":true,"logged_in":true,"push_name":"Shop","platform":"android","business_name":"Shop Ltd"}}"#,
    )
    .await;
    let client = BridgeClient::new(format!("{url}/"));

    let info = match client.session().await {
        Ok(info) => info,
        Err(err) => panic!("status should decode: {err}"),
    };
    assert!(info.connected);
    assert!(info.logged_in);
    assert_eq!(info.push_name, "Shop");
    assert_eq!(info.platform, "android");
    assert_eq!(info.business_name, "Shop Ltd");

    let request = match captured.await {
        Ok(request) => request,
        Err(err) => panic!("request should be captured: {err}"),
    };
    assert!(request.head.starts_with("GET /status "));
}

#[tokio::test]
async fn unreachable_bridge_reports_disconnected() {
    let client = BridgeClient::new("http://127.0.0.1:1");
    assert!(!client.is_connected().await);
}
