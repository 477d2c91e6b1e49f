//! Outbound message construction and inbound message inspection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::jid::Jid;

// ── Outbound ────────────────────────────────────────────────────

/// A message to hand to the messaging client for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Plain conversational text.
    Text {
        /// Message body.
        conversation: String,
    },
    /// Poll creation.
    Poll(PollCreation),
    /// Interactive message with response buttons.
    Buttons(ButtonsMessage),
}

/// Poll creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollCreation {
    /// Poll question.
    pub name: String,
    /// Options in display order.
    pub options: Vec<PollOption>,
    /// How many options a participant may select.
    pub selectable_options_count: u32,
}

/// A single poll option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    /// Option label.
    pub option_name: String,
}

/// Interactive buttons payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonsMessage {
    /// Main body text.
    pub content_text: String,
    /// Footer text below the body.
    pub footer_text: String,
    /// Buttons in display order.
    pub buttons: Vec<Button>,
}

/// A single button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Identifier reported back when the button is pressed.
    pub button_id: String,
    /// Label shown on the button.
    pub display_text: String,
    /// Button behaviour.
    pub button_type: ButtonType,
}

/// Button behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonType {
    /// Pressing the button sends a reply carrying its id.
    Response,
}

impl OutboundMessage {
    /// Plain text message.
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text {
            conversation: body.into(),
        }
    }

    /// Poll with one option per label, in input order.
    pub fn poll(name: impl Into<String>, options: &[String], max_choices: u32) -> Self {
        Self::Poll(PollCreation {
            name: name.into(),
            options: options
                .iter()
                .map(|o| PollOption {
                    option_name: o.clone(),
                })
                .collect(),
            selectable_options_count: max_choices,
        })
    }

    /// Buttons message; ids are assigned as `btn_<index>` in input order.
    pub fn buttons(body: impl Into<String>, footer: impl Into<String>, labels: &[String]) -> Self {
        Self::Buttons(ButtonsMessage {
            content_text: body.into(),
            footer_text: footer.into(),
            buttons: labels
                .iter()
                .enumerate()
                .map(|(i, label)| Button {
                    button_id: format!("btn_{i}"),
                    display_text: label.clone(),
                    button_type: ButtonType::Response,
                })
                .collect(),
        })
    }
}

/// Result of a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Server-assigned message id.
    pub id: String,
    /// Server timestamp of the send.
    pub timestamp: DateTime<Utc>,
}

// ── Inbound ─────────────────────────────────────────────────────

/// Metadata attached to a received message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInfo {
    /// Message id.
    pub id: String,
    /// Author of the message.
    pub sender: Jid,
    /// Conversation the message belongs to.
    pub chat: Jid,
    /// Whether the conversation is a group.
    #[serde(default)]
    pub is_group: bool,
    /// Whether we authored the message from another device.
    #[serde(default)]
    pub is_from_me: bool,
    /// Sender's display name.
    #[serde(default)]
    pub push_name: String,
    /// When the message was sent.
    pub timestamp: DateTime<Utc>,
}

/// A received message: metadata plus content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Message metadata.
    pub info: MessageInfo,
    /// Message payload.
    #[serde(default)]
    pub message: MessageContent,
}

/// Message payload. At most one variant is normally populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageContent {
    /// Plain conversational body.
    pub conversation: Option<String>,
    /// Extended text (links, quotes, mentions).
    pub extended_text: Option<ExtendedText>,
    /// Image attachment.
    pub image: Option<MediaPayload>,
    /// Video attachment.
    pub video: Option<MediaPayload>,
    /// Audio or voice note.
    pub audio: Option<MediaPayload>,
    /// Document attachment.
    pub document: Option<MediaPayload>,
    /// Sticker.
    pub sticker: Option<MediaPayload>,
}

/// Extended text body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendedText {
    /// Text content.
    pub text: String,
}

/// Media attachment descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaPayload {
    /// MIME type, if known.
    pub mimetype: Option<String>,
    /// Caption, if any.
    pub caption: Option<String>,
}

/// Coarse classification of a received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text.
    Text,
    /// Image.
    Image,
    /// Video.
    Video,
    /// Audio.
    Audio,
    /// Document.
    Document,
    /// Sticker.
    Sticker,
    /// None of the recognised payloads.
    Unknown,
}

impl MessageKind {
    /// Wire name used in webhook payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Sticker => "sticker",
            Self::Unknown => "unknown",
        }
    }
}

/// Ordered classification probes. The first matching probe decides the kind,
/// so a message carrying both a body and an image is `Text`.
///
/// Only the plain conversational body counts as text; an extended-text-only
/// message falls through to `Unknown`.
const KIND_PROBES: &[(fn(&MessageContent) -> bool, MessageKind)] = &[
    (has_conversation, MessageKind::Text),
    (has_image, MessageKind::Image),
    (has_video, MessageKind::Video),
    (has_audio, MessageKind::Audio),
    (has_document, MessageKind::Document),
    (has_sticker, MessageKind::Sticker),
];

fn has_conversation(m: &MessageContent) -> bool {
    m.conversation.as_deref().is_some_and(|c| !c.is_empty())
}

fn has_image(m: &MessageContent) -> bool {
    m.image.is_some()
}

fn has_video(m: &MessageContent) -> bool {
    m.video.is_some()
}

fn has_audio(m: &MessageContent) -> bool {
    m.audio.is_some()
}

fn has_document(m: &MessageContent) -> bool {
    m.document.is_some()
}

fn has_sticker(m: &MessageContent) -> bool {
    m.sticker.is_some()
}

impl MessageContent {
    /// Classify the payload. Probes run in priority order: text, image, video,
    /// audio, document, sticker.
    pub fn kind(&self) -> MessageKind {
        KIND_PROBES
            .iter()
            .find(|(probe, _)| probe(self))
            .map_or(MessageKind::Unknown, |(_, kind)| *kind)
    }

    /// Best-effort text: the conversational body, else the extended text,
    /// else empty.
    pub fn best_effort_text(&self) -> &str {
        if let Some(body) = self.conversation.as_deref().filter(|c| !c.is_empty()) {
            return body;
        }
        self.extended_text
            .as_ref()
            .map_or("", |ext| ext.text.as_str())
    }
}
