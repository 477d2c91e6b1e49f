//! Outbound webhook: payload shape and the fire-and-forget sink client.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

/// Header carrying the shared secret.
pub const SECRET_HEADER: &str = "X-Webhook-Secret";

/// Fixed delivery timeout.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Normalised event forwarded downstream. Built fresh per event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// Event type, e.g. `message`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Sender user part.
    pub from: String,
    /// Message id.
    pub message_id: String,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    /// Event-specific fields.
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Posts payloads to the configured webhook.
#[derive(Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    url: Option<String>,
    secret: String,
}

impl WebhookClient {
    /// Client for `url`; `None` turns delivery into a no-op.
    pub fn new(url: Option<String>, secret: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build webhook HTTP client with timeout, using default");
                reqwest::Client::default()
            });
        Self {
            client,
            url,
            secret: secret.into(),
        }
    }

    /// Configured URL, if any.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Deliver one payload. Failures are logged and dropped.
    pub async fn deliver(&self, payload: &WebhookPayload) {
        let Some(url) = self.url.as_deref() else {
            debug!(kind = %payload.kind, "no webhook configured, dropping payload");
            return;
        };

        let result = self
            .client
            .post(url)
            .header(SECRET_HEADER, &self.secret)
            .json(payload)
            .timeout(DELIVERY_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                info!(status = %resp.status(), message_id = %payload.message_id, "webhook delivered");
            }
            Ok(resp) => {
                warn!(status = %resp.status(), message_id = %payload.message_id, "webhook rejected payload");
            }
            Err(e) => {
                warn!(error = %e, message_id = %payload.message_id, "webhook delivery failed");
            }
        }
    }
}
