//! Events emitted by the messaging client, and the long-poll listener that
//! receives them from the bridge.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::jid::Jid;
use super::message::IncomingMessage;
use super::ClientError;

/// An event from the messaging client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// A message was received (or sent by us from another device).
    Message(IncomingMessage),
    /// Delivery or read receipt for previously sent messages.
    Receipt(Receipt),
    /// Connection to the network established.
    Connected,
    /// Connection to the network lost.
    Disconnected {
        /// Human-readable reason, if available.
        #[serde(default)]
        reason: Option<String>,
    },
    /// The session was revoked from the phone.
    LoggedOut,
    /// A new pairing code is available for scanning.
    #[serde(rename = "qr")]
    PairingCode {
        /// Raw pairing code to render as a QR image.
        code: String,
    },
    /// The pairing code was scanned and the device linked.
    PairSuccess,
    /// Pairing codes expired without a scan.
    #[serde(rename = "qr_timeout")]
    PairingTimeout,
}

/// A delivery/read receipt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Receipt {
    /// Conversation the receipt refers to.
    pub chat: Jid,
    /// Acknowledged message ids.
    #[serde(default)]
    pub message_ids: Vec<String>,
    /// Receipt type (empty for plain delivery, `read`, `played`, ...).
    #[serde(default)]
    pub receipt_type: String,
    /// When the receipt was issued.
    pub timestamp: DateTime<Utc>,
}

impl Receipt {
    /// Receipt type, with the implicit delivery type spelled out.
    pub fn kind(&self) -> &str {
        if self.receipt_type.is_empty() {
            "delivered"
        } else {
            &self.receipt_type
        }
    }
}

/// Long-poll timeout for the HTTP client.
const POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// Pause after the bridge rejects a poll.
const REJECTED_POLL_DELAY: Duration = Duration::from_secs(5);

/// Initial reconnect backoff.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum reconnect backoff.
const MAX_BACKOFF_MS: u64 = 30_000;

/// What one long-poll round achieved.
enum PollOutcome {
    /// A batch arrived and was forwarded (possibly empty).
    Forwarded,
    /// The poll hit its timeout with nothing to report.
    Idle,
    /// The bridge answered with a non-success status.
    Rejected(reqwest::StatusCode),
    /// The receiving side of the channel is gone.
    ReceiverGone,
}

/// Exponential reconnect delay, reset whenever the bridge answers.
#[derive(Debug)]
struct Backoff {
    current_ms: u64,
}

impl Backoff {
    fn new() -> Self {
        Self {
            current_ms: INITIAL_BACKOFF_MS,
        }
    }

    /// Delay to wait now; doubles the next one up to the cap.
    fn next_delay(&mut self) -> Duration {
        let delay = Duration::from_millis(self.current_ms);
        self.current_ms = self.current_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
        delay
    }

    fn reset(&mut self) {
        self.current_ms = INITIAL_BACKOFF_MS;
    }
}

/// Spawn a listener that forwards bridge events to `event_tx`.
///
/// Returns immediately. Network errors reconnect with exponential backoff,
/// reset after the next answered poll. The task ends once the receiving side
/// of the channel is dropped.
pub fn spawn_event_listener(
    base_url: String,
    event_tx: mpsc::Sender<ClientEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let client = reqwest::Client::builder()
            .timeout(POLL_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build event poll client with timeout, using default");
                reqwest::Client::default()
            });
        let poll_url = format!("{base_url}/events/poll");
        let mut backoff = Backoff::new();
        info!(url = %poll_url, "listening for bridge events");

        loop {
            match poll_once(&client, &poll_url, &event_tx).await {
                Ok(PollOutcome::Forwarded) => backoff.reset(),
                Ok(PollOutcome::Idle) => {}
                Ok(PollOutcome::Rejected(status)) => {
                    backoff.reset();
                    debug!(%status, "event poll rejected");
                    tokio::time::sleep(REJECTED_POLL_DELAY).await;
                }
                Ok(PollOutcome::ReceiverGone) => {
                    info!("event receiver dropped, stopping listener");
                    break;
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(error = %e, ?delay, "event poll failed, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    })
}

/// Run one long-poll round and forward whatever it returns.
async fn poll_once(
    client: &reqwest::Client,
    poll_url: &str,
    event_tx: &mpsc::Sender<ClientEvent>,
) -> Result<PollOutcome, ClientError> {
    if event_tx.is_closed() {
        return Ok(PollOutcome::ReceiverGone);
    }

    let resp = match client.get(poll_url).send().await {
        Ok(resp) => resp,
        Err(e) if e.is_timeout() => return Ok(PollOutcome::Idle),
        Err(e) => return Err(e.into()),
    };
    if !resp.status().is_success() {
        return Ok(PollOutcome::Rejected(resp.status()));
    }

    let batch: Vec<serde_json::Value> = resp.json().await?;
    for event in decode_batch(batch) {
        debug!(?event, "received client event");
        if event_tx.send(event).await.is_err() {
            return Ok(PollOutcome::ReceiverGone);
        }
    }
    Ok(PollOutcome::Forwarded)
}

/// Decode a polled batch element by element. Events this service does not
/// understand are logged and skipped; the rest keep their order.
pub fn decode_batch(batch: Vec<serde_json::Value>) -> Vec<ClientEvent> {
    batch
        .into_iter()
        .filter_map(|raw| {
            let kind = raw
                .get("type")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("?")
                .to_owned();
            match serde_json::from_value::<ClientEvent>(raw) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(error = %e, %kind, "skipping undecodable bridge event");
                    None
                }
            }
        })
        .collect()
}
