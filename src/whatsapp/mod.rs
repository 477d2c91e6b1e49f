//! WhatsApp collaborator: the messaging client seam, its HTTP bridge
//! implementation, the event listener and the session bootstrap.
//!
//! The protocol itself (multi-device sessions, pairing, wire codec) lives in a
//! sidecar bridge. This module only speaks the bridge's small HTTP contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod client;
pub mod events;
pub mod jid;
pub mod message;
pub mod session;

pub use client::BridgeClient;
pub use events::ClientEvent;
pub use jid::{Jid, JidError};
pub use message::{OutboundMessage, SendReceipt};

/// Errors from the messaging client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request to the bridge failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The bridge answered but reported a failure.
    #[error("bridge error: {0}")]
    Bridge(String),

    /// The client is not connected to the network.
    #[error("not connected to WhatsApp")]
    NotConnected,
}

/// Identity of the current session as reported by the client.
///
/// Every field is empty/false when no session exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionInfo {
    /// Whether the client is connected right now.
    pub connected: bool,
    /// Whether a linked device identity is stored.
    pub logged_in: bool,
    /// Our display name.
    pub push_name: String,
    /// Platform reported for the linked phone.
    pub platform: String,
    /// Business name, for business accounts.
    pub business_name: String,
}

/// Capabilities this service needs from a messaging client.
///
/// Implementations must be safe to call concurrently from HTTP handlers and
/// the event path; callers add no locking of their own.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Open the connection to the network.
    async fn connect(&self) -> Result<(), ClientError>;

    /// Close the connection. Best effort.
    async fn disconnect(&self);

    /// Whether the client is currently connected.
    async fn is_connected(&self) -> bool;

    /// Current session identity.
    async fn session(&self) -> Result<SessionInfo, ClientError>;

    /// Send one message. Each call maps to exactly one send on the network.
    async fn send(&self, to: &Jid, message: &OutboundMessage) -> Result<SendReceipt, ClientError>;
}
