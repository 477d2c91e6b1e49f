//! HTTP front door: router, shared state and CORS.

pub mod error;
pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::extract::Request;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::HeaderValue;
use axum::middleware::{from_fn, Next};
use axum::response::Response;
use axum::routing::{get, post, MethodRouter};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::qr::QrStore;
use crate::whatsapp::MessagingClient;

pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// The messaging client, shared by every handler.
    pub client: Arc<dyn MessagingClient>,
    /// Pairing code cache.
    pub qr: QrStore,
}

impl AppState {
    /// Build state from its parts.
    pub fn new(client: Arc<dyn MessagingClient>, qr: QrStore) -> Self {
        Self { client, qr }
    }
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/send-message", finish(post(handlers::send_message)))
        .route("/api/send-poll", finish(post(handlers::send_poll)))
        .route("/api/send-buttons", finish(post(handlers::send_buttons)))
        .route("/api/health", finish(get(handlers::health)))
        .route("/api/status", finish(get(handlers::status)))
        .route("/api/qr", finish(get(handlers::qr)))
        .layer(from_fn(permissive_cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Add the OPTIONS answer and the plain-text 405 to a route.
fn finish(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route
        .options(handlers::preflight)
        .fallback(handlers::method_not_allowed)
}

/// Allow any origin on every response.
async fn permissive_cors(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    resp
}
