//! Request and response bodies. Field names are camelCase on the wire.
//!
//! Missing request fields decode to their empty value; an empty `to` is then
//! rejected as an invalid address.

use serde::{Deserialize, Serialize};

/// `POST /api/send-message`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendMessageRequest {
    /// Destination phone number or JID.
    pub to: String,
    /// Text body.
    pub message: String,
}

/// `POST /api/send-poll`
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SendPollRequest {
    /// Destination phone number or JID.
    pub to: String,
    /// Poll question.
    pub name: String,
    /// Poll options in display order.
    pub options: Vec<String>,
    /// How many options may be selected.
    pub max_choices: u32,
}

/// `POST /api/send-buttons`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendButtonsRequest {
    /// Destination phone number or JID.
    pub to: String,
    /// Body text.
    pub body: String,
    /// Footer text.
    pub footer: String,
    /// Button labels in display order.
    pub buttons: Vec<String>,
}

/// Successful text send.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    /// Always `true`.
    pub success: bool,
    /// Id of the sent message.
    pub message_id: String,
    /// Server timestamp, unix seconds.
    pub timestamp: i64,
}

/// Successful poll or buttons send.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    /// Always `true`.
    pub success: bool,
    /// Id of the sent message.
    pub message_id: String,
}

/// `GET /api/health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`.
    pub status: &'static str,
    /// Current unix time.
    pub timestamp: i64,
    /// Whether the messaging client is connected.
    pub connected: bool,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// `GET /api/status`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Whether the messaging client is connected.
    pub connected: bool,
    /// Whether a linked device identity is stored.
    pub logged_in: bool,
    /// Our display name.
    pub push_name: String,
    /// Linked phone platform.
    pub platform: String,
    /// Business name, if any.
    pub business_name: String,
}

/// `GET /api/qr`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrResponse {
    /// Most recently cached pairing code.
    pub qr_code: String,
}
