//! CORS headers and OPTIONS handling.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tower::ServiceExt;

use whatsapp_gateway::api::{create_router, AppState};
use whatsapp_gateway::qr::QrStore;

use crate::support::MockClient;

const ROUTES: &[&str] = &[
    "/api/send-message",
    "/api/send-poll",
    "/api/send-buttons",
    "/api/health",
    "/api/status",
    "/api/qr",
];

fn options(uri: &str) -> Request<Body> {
    match Request::builder()
        .method(Method::OPTIONS)
        .uri(uri)
        .body(Body::empty())
    {
        Ok(request) => request,
        Err(err) => panic!("request should build: {err}"),
    }
}

#[tokio::test]
async fn options_is_200_with_empty_body_on_every_route() {
    let client = Arc::new(MockClient::connected());
    let app = create_router(AppState::new(client.clone(), QrStore::new("unused")));

    for uri in ROUTES {
        let response = match app.clone().oneshot(options(uri)).await {
            Ok(response) => response,
            Err(err) => panic!("router should respond: {err}"),
        };
        assert_eq!(response.status(), StatusCode::OK, "{uri}");

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, OPTIONS"
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization"
        );

        let body = match axum::body::to_bytes(response.into_body(), usize::MAX).await {
            Ok(bytes) => bytes,
            Err(err) => panic!("body should be readable: {err}"),
        };
        assert!(body.is_empty(), "{uri}");
    }
    assert!(client.sent().is_empty());
}

#[tokio::test]
async fn preflight_with_request_headers_is_answered() {
    let client = Arc::new(MockClient::connected());
    let app = create_router(AppState::new(client, QrStore::new("unused")));

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/send-message")
        .header(header::ORIGIN, "https://app.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty());
    let request = match request {
        Ok(request) => request,
        Err(err) => panic!("request should build: {err}"),
    };

    let response = match app.oneshot(request).await {
        Ok(response) => response,
        Err(err) => panic!("router should respond: {err}"),
    };
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn regular_and_error_responses_carry_cors_headers() {
    let client = Arc::new(MockClient::disconnected());
    let app = create_router(AppState::new(client, QrStore::new("unused-dir")));

    for (method, uri) in [(Method::GET, "/api/health"), (Method::GET, "/api/send-poll")] {
        let request = match Request::builder().method(method).uri(uri).body(Body::empty()) {
            Ok(request) => request,
            Err(err) => panic!("request should build: {err}"),
        };
        let response = match app.clone().oneshot(request).await {
            Ok(response) => response,
            Err(err) => panic!("router should respond: {err}"),
        };
        assert!(response.status().is_client_error() || response.status().is_server_error());
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
