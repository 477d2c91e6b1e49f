//! Event adapter: turns client events into webhook payloads and side effects.

use serde_json::{json, Map, Value};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::qr::QrStore;
use crate::webhook::{WebhookClient, WebhookPayload};
use crate::whatsapp::events::{ClientEvent, Receipt};
use crate::whatsapp::message::IncomingMessage;
use crate::whatsapp::session::SessionTracker;

/// Routes each [`ClientEvent`] to its handling.
pub struct EventAdapter {
    webhook: WebhookClient,
    qr: QrStore,
    tracker: SessionTracker,
    forward_receipts: bool,
}

impl EventAdapter {
    /// Build an adapter. Receipts are only forwarded when `forward_receipts`
    /// is set; otherwise they are logged.
    pub fn new(
        webhook: WebhookClient,
        qr: QrStore,
        tracker: SessionTracker,
        forward_receipts: bool,
    ) -> Self {
        Self {
            webhook,
            qr,
            tracker,
            forward_receipts,
        }
    }

    /// Handle one event. Never fails: delivery and cache errors are logged.
    pub async fn handle(&self, event: &ClientEvent) {
        self.tracker.observe(event);

        match event {
            ClientEvent::Message(msg) => {
                info!(from = %msg.info.sender.user, id = %msg.info.id, "message received");
                self.webhook.deliver(&message_payload(msg)).await;
            }
            ClientEvent::Receipt(receipt) => {
                info!(
                    chat = %receipt.chat,
                    ids = %receipt.message_ids.join(","),
                    kind = receipt.kind(),
                    "receipt received"
                );
                if self.forward_receipts {
                    self.webhook.deliver(&receipt_payload(receipt)).await;
                }
            }
            ClientEvent::PairingCode { code } => {
                info!(code = %code, "new pairing code");
                if let Err(e) = self.qr.save(code).await {
                    warn!(error = %e, "failed to cache pairing code");
                }
            }
            ClientEvent::PairSuccess => info!("pairing completed"),
            ClientEvent::PairingTimeout => warn!("pairing codes expired without a scan"),
            ClientEvent::Connected => info!("connected to WhatsApp"),
            ClientEvent::Disconnected { reason } => {
                warn!(reason = reason.as_deref().unwrap_or("unknown"), "disconnected from WhatsApp");
            }
            ClientEvent::LoggedOut => warn!("logged out from WhatsApp"),
        }
    }

    /// Drain `events` one at a time until the sender side closes.
    pub async fn run(self, mut events: mpsc::Receiver<ClientEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(&event).await;
        }
        info!("event channel closed, adapter stopping");
    }
}

/// Webhook payload for a received message.
pub fn message_payload(msg: &IncomingMessage) -> WebhookPayload {
    let info = &msg.info;
    let mut data = Map::new();
    data.insert("text".to_owned(), json!(msg.message.best_effort_text()));
    data.insert("chat".to_owned(), json!(info.chat.user));
    data.insert(
        "isGroup".to_owned(),
        json!(info.is_group || info.chat.is_group()),
    );
    data.insert("fromMe".to_owned(), json!(info.is_from_me));
    data.insert("pushName".to_owned(), json!(info.push_name));
    data.insert(
        "messageType".to_owned(),
        json!(msg.message.kind().as_str()),
    );

    WebhookPayload {
        kind: "message".to_owned(),
        from: info.sender.user.clone(),
        message_id: info.id.clone(),
        timestamp: info.timestamp.timestamp(),
        data,
    }
}

/// Webhook payload for a receipt. The first acknowledged id is used as the
/// payload's message id.
pub fn receipt_payload(receipt: &Receipt) -> WebhookPayload {
    let mut data = Map::new();
    data.insert("chat".to_owned(), json!(receipt.chat.user));
    data.insert(
        "messageIds".to_owned(),
        Value::from(receipt.message_ids.clone()),
    );
    data.insert("receiptType".to_owned(), json!(receipt.kind()));

    WebhookPayload {
        kind: "receipt".to_owned(),
        from: receipt.chat.user.clone(),
        message_id: receipt.message_ids.first().cloned().unwrap_or_default(),
        timestamp: receipt.timestamp.timestamp(),
        data,
    }
}
