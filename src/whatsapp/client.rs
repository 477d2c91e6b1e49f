//! HTTP client for the WhatsApp bridge sidecar.
//!
//! The bridge owns the protocol session and its database. Every call answers
//! with a `{success, data, error}` envelope, except that a bridge whose own
//! client is offline answers `503` before looking at the request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::jid::Jid;
use super::message::{OutboundMessage, SendReceipt};
use super::{ClientError, MessagingClient, SessionInfo};

/// Default bridge URL.
pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:3001";

/// HTTP connect timeout.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// HTTP request timeout for normal operations.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for the bridge HTTP API.
pub struct BridgeClient {
    client: reqwest::Client,
    base_url: String,
}

/// Response envelope from the bridge.
#[derive(Deserialize)]
struct BridgeResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> BridgeResponse<T> {
    fn into_result(self) -> Result<Option<T>, ClientError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ClientError::Bridge(
                self.error
                    .unwrap_or_else(|| "unspecified bridge failure".to_owned()),
            ))
        }
    }
}

#[derive(Serialize)]
struct SendBody<'a> {
    jid: &'a Jid,
    message: &'a OutboundMessage,
}

impl BridgeClient {
    /// Create a client pointing at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client with timeouts, using default");
                reqwest::Client::default()
            });
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Returns the base URL of the bridge.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ClientError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self.client.get(&url).send().await?;
        if resp.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Err(ClientError::NotConnected);
        }
        let body: BridgeResponse<T> = resp.json().await?;
        body.into_result()
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ClientError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self.client.post(&url).json(body).send().await?;
        let status = resp.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(ClientError::NotConnected);
        }
        let body: BridgeResponse<T> = resp.json().await?;
        if !status.is_success() && body.success {
            return Err(ClientError::Bridge(format!("bridge answered {status}")));
        }
        body.into_result()
    }
}

#[async_trait]
impl MessagingClient for BridgeClient {
    async fn connect(&self) -> Result<(), ClientError> {
        self.post::<_, serde_json::Value>("/connect", &serde_json::json!({}))
            .await?;
        debug!(url = %self.base_url, "bridge connected");
        Ok(())
    }

    async fn disconnect(&self) {
        if let Err(e) = self
            .post::<_, serde_json::Value>("/disconnect", &serde_json::json!({}))
            .await
        {
            warn!(error = %e, "disconnect failed");
        }
    }

    async fn is_connected(&self) -> bool {
        match self.get::<SessionInfo>("/status").await {
            Ok(info) => info.is_some_and(|s| s.connected),
            Err(e) => {
                debug!(error = %e, "status check failed, treating as disconnected");
                false
            }
        }
    }

    async fn session(&self) -> Result<SessionInfo, ClientError> {
        Ok(self.get::<SessionInfo>("/status").await?.unwrap_or_default())
    }

    async fn send(&self, to: &Jid, message: &OutboundMessage) -> Result<SendReceipt, ClientError> {
        let body = SendBody { jid: to, message };
        let receipt = self
            .post::<_, SendReceipt>("/send", &body)
            .await?
            .ok_or_else(|| ClientError::Bridge("send returned no receipt".to_owned()))?;
        debug!(jid = %to, id = %receipt.id, "message sent");
        Ok(receipt)
    }
}
