//! API error type. Every variant renders as a plain-text body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::qr::QrError;
use crate::whatsapp::ClientError;

/// Which send operation failed; controls the error message prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendKind {
    /// Plain text message.
    Message,
    /// Poll.
    Poll,
    /// Buttons message.
    Buttons,
}

impl SendKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Message => "Failed to send",
            Self::Poll => "Failed to send poll",
            Self::Buttons => "Failed to send buttons",
        }
    }
}

/// Errors returned by HTTP handlers. Each one ends the request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body was not valid JSON for the request shape.
    #[error("Invalid JSON")]
    InvalidJson(#[source] serde_json::Error),

    /// Destination could not be parsed as an address.
    #[error("Invalid phone number")]
    InvalidAddress(#[source] crate::whatsapp::JidError),

    /// HTTP method not supported on this path.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The messaging client rejected the send.
    #[error("{}: {source}", .kind.prefix())]
    SendFailed {
        /// Operation that failed.
        kind: SendKind,
        /// Underlying client error.
        source: ClientError,
    },

    /// No pairing code cached yet.
    #[error("No QR code available")]
    QrUnavailable,

    /// Pairing code cache could not be read.
    #[error("QR code cache unavailable")]
    QrCache(#[source] QrError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_) | Self::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::SendFailed { .. } | Self::QrCache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::QrUnavailable => StatusCode::NOT_FOUND,
        }
    }
}

impl From<QrError> for ApiError {
    fn from(e: QrError) -> Self {
        match e {
            QrError::NotFound => Self::QrUnavailable,
            other => Self::QrCache(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = ?self, %status, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}
