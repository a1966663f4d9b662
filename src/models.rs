// Core data model for the dispatch pipeline
// Message variants, delivery receipts and per-cycle dispatch results

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::ClientError;

/// File-backed payload shared by the image, audio and video variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaPayload {
    pub path: PathBuf,
    pub size: u64,
    /// base64-encoded SHA-256 of the file contents. Starts unset and is
    /// filled at most once by the pipeline before the first send.
    pub hash: Option<String>,
}

/// An outbound message. The enum is closed on purpose: adding a variant
/// forces every dispatch arm to handle it, so a message type can never be
/// silently skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Text {
        body: String,
    },
    Image {
        media: MediaPayload,
        caption: Option<String>,
    },
    Audio {
        media: MediaPayload,
    },
    Video {
        media: MediaPayload,
        caption: Option<String>,
    },
    Location {
        longitude: f64,
        latitude: f64,
        caption: Option<String>,
        url: Option<String>,
    },
    ContactCard {
        name: String,
        vcard: String,
    },
}

impl Message {
    pub fn text(body: impl Into<String>) -> Self {
        Message::Text { body: body.into() }
    }

    pub fn image(path: impl Into<PathBuf>, size: u64, caption: Option<String>) -> Self {
        Message::Image {
            media: MediaPayload {
                path: path.into(),
                size,
                hash: None,
            },
            caption,
        }
    }

    pub fn audio(path: impl Into<PathBuf>, size: u64) -> Self {
        Message::Audio {
            media: MediaPayload {
                path: path.into(),
                size,
                hash: None,
            },
        }
    }

    pub fn video(path: impl Into<PathBuf>, size: u64, caption: Option<String>) -> Self {
        Message::Video {
            media: MediaPayload {
                path: path.into(),
                size,
                hash: None,
            },
            caption,
        }
    }

    pub fn location(
        longitude: f64,
        latitude: f64,
        caption: Option<String>,
        url: Option<String>,
    ) -> Self {
        Message::Location {
            longitude,
            latitude,
            caption,
            url,
        }
    }

    pub fn contact_card(name: impl Into<String>, vcard: impl Into<String>) -> Self {
        Message::ContactCard {
            name: name.into(),
            vcard: vcard.into(),
        }
    }

    /// Type tag used on receipts and failure records.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Text { .. } => MessageKind::Text,
            Message::Image { .. } => MessageKind::Image,
            Message::Audio { .. } => MessageKind::Audio,
            Message::Video { .. } => MessageKind::Video,
            Message::Location { .. } => MessageKind::Location,
            Message::ContactCard { .. } => MessageKind::ContactCard,
        }
    }

    pub fn media(&self) -> Option<&MediaPayload> {
        match self {
            Message::Image { media, .. }
            | Message::Audio { media }
            | Message::Video { media, .. } => Some(media),
            _ => None,
        }
    }

    pub(crate) fn media_mut(&mut self) -> Option<&mut MediaPayload> {
        match self {
            Message::Image { media, .. }
            | Message::Audio { media }
            | Message::Video { media, .. } => Some(media),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Image,
    Audio,
    Video,
    Location,
    ContactCard,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::Audio => "audio",
            MessageKind::Video => "video",
            MessageKind::Location => "location",
            MessageKind::ContactCard => "vcard",
        };
        write!(f, "{}", tag)
    }
}

/// Normalized record produced for every delivered (receiver, message) pair.
///
/// `to` is the single receiver address in direct mode, or the joined address
/// list of the bulk chunk the message went out to.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReceipt {
    /// Gateway-assigned message id. `None` only when the gateway accepted
    /// the send without returning one.
    pub id: Option<String>,
    pub kind: MessageKind,
    pub sender: String,
    pub nickname: String,
    pub to: String,
    /// Deep copy of the message as sent, content hash included.
    pub message: Message,
    /// Caller-injected key/value pairs, copied verbatim from the outbox.
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub timestamp: u64,
}

/// Outcome of one dispatch cycle.
///
/// Gateway errors on individual sends do not abort the cycle; they land in
/// `failures` and the remaining pairs are still attempted. Only a fatal
/// transport-level error cuts the cycle short, and even then the receipts
/// gathered so far are returned.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub receipts: Vec<DeliveryReceipt>,
    pub failures: Vec<DispatchFailure>,
}

impl DispatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One (receiver, message) pair that could not be delivered.
#[derive(Debug)]
pub struct DispatchFailure {
    pub to: String,
    pub kind: MessageKind,
    pub error: ClientError,
}

/// Inbound message pulled from the gateway after an event drain.
#[derive(Debug, Clone, Serialize)]
pub struct InboundMessage {
    pub from: String,
    pub body: String,
    pub timestamp: u64,
}
