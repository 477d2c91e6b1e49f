//! Command handlers. None of them retry: a failed send returns immediately.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use tracing::info;

use super::error::{ApiError, SendKind};
use super::types::{
    HealthResponse, QrResponse, SendButtonsRequest, SendMessageRequest, SendMessageResponse,
    SendPollRequest, SendResponse, StatusResponse,
};
use super::AppState;
use crate::whatsapp::{Jid, OutboundMessage, SendReceipt};

/// Service name reported by the health check.
pub const SERVICE_NAME: &str = "whatsmeow";

/// Service version reported by the health check.
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(ApiError::InvalidJson)
}

fn parse_address(to: &str) -> Result<Jid, ApiError> {
    to.parse().map_err(ApiError::InvalidAddress)
}

async fn send(
    state: &AppState,
    kind: SendKind,
    to: &Jid,
    message: OutboundMessage,
) -> Result<SendReceipt, ApiError> {
    let receipt = state
        .client
        .send(to, &message)
        .await
        .map_err(|source| ApiError::SendFailed { kind, source })?;
    info!(jid = %to, id = %receipt.id, ?kind, "sent");
    Ok(receipt)
}

/// `POST /api/send-message`
pub async fn send_message(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let req: SendMessageRequest = decode(&body)?;
    let to = parse_address(&req.to)?;

    let receipt = send(&state, SendKind::Message, &to, OutboundMessage::text(req.message)).await?;

    Ok(Json(SendMessageResponse {
        success: true,
        message_id: receipt.id,
        timestamp: receipt.timestamp.timestamp(),
    }))
}

/// `POST /api/send-poll`
pub async fn send_poll(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SendResponse>, ApiError> {
    let req: SendPollRequest = decode(&body)?;
    let to = parse_address(&req.to)?;

    let message = OutboundMessage::poll(req.name, &req.options, req.max_choices);
    let receipt = send(&state, SendKind::Poll, &to, message).await?;

    Ok(Json(SendResponse {
        success: true,
        message_id: receipt.id,
    }))
}

/// `POST /api/send-buttons`
pub async fn send_buttons(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SendResponse>, ApiError> {
    let req: SendButtonsRequest = decode(&body)?;
    let to = parse_address(&req.to)?;

    let message = OutboundMessage::buttons(req.body, req.footer, &req.buttons);
    let receipt = send(&state, SendKind::Buttons, &to, message).await?;

    Ok(Json(SendResponse {
        success: true,
        message_id: receipt.id,
    }))
}

/// `GET /api/health`; 503 while the client is disconnected.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let connected = state.client.is_connected().await;
    let (status, code) = if connected {
        ("healthy", StatusCode::OK)
    } else {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        code,
        Json(HealthResponse {
            status,
            timestamp: chrono::Utc::now().timestamp(),
            connected,
            service: SERVICE_NAME,
            version: SERVICE_VERSION,
        }),
    )
}

/// `GET /api/status`
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let session = state.client.session().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "session lookup failed, reporting empty session");
        Default::default()
    });

    Json(StatusResponse {
        connected: session.connected,
        logged_in: session.logged_in,
        push_name: session.push_name,
        platform: session.platform,
        business_name: session.business_name,
    })
}

/// `GET /api/qr`
pub async fn qr(State(state): State<AppState>) -> Result<Json<QrResponse>, ApiError> {
    let qr_code = state.qr.load().await?;
    Ok(Json(QrResponse { qr_code }))
}

/// `OPTIONS` on any route: empty 200, CORS headers come from the middleware.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Any other method on a known route.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
