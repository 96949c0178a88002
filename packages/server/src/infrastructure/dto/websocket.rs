//! WebSocket message DTOs for the presence-aware router.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChatMessage, Delivery, FileReference, MessageBody, PresenceSnapshot},
    usecase::RawChatMessage,
};

/// Outbound message type enum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    Connected,
    PresenceUpdate,
    ChatMessage,
}

/// Events sent by clients, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Announce (or change) the display name
    Register {
        #[serde(default)]
        name: Option<String>,
    },
    /// Ask for the current presence snapshot
    RequestPresence,
    /// Submit a chat message
    ChatMessage(InboundChatMessage),
}

/// Chat message as submitted by a client. Nothing here is trusted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundChatMessage {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub file_ref: Option<FileRefDto>,
    #[serde(default)]
    pub target_id: Option<String>,
}

impl From<InboundChatMessage> for RawChatMessage {
    fn from(message: InboundChatMessage) -> Self {
        let (file_url, file_name) = match message.file_ref {
            Some(file_ref) => (Some(file_ref.url), file_ref.original_name),
            None => (None, None),
        };
        Self {
            kind: message.kind,
            text: message.text,
            file_url,
            file_name,
            target_id: message.target_id,
        }
    }
}

/// File reference as produced by the upload endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRefDto {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
}

impl From<&FileReference> for FileRefDto {
    fn from(file: &FileReference) -> Self {
        Self {
            url: file.url().to_string(),
            original_name: Some(file.original_name().to_string()),
        }
    }
}

/// First message of every session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedMessage {
    pub r#type: MessageType,
    pub connection_id: String,
}

/// Presence snapshot broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceUpdateMessage {
    pub r#type: MessageType,
    pub revision: u64,
    /// connection_id -> display name
    pub participants: BTreeMap<String, String>,
}

impl From<&PresenceSnapshot> for PresenceUpdateMessage {
    fn from(snapshot: &PresenceSnapshot) -> Self {
        Self {
            r#type: MessageType::PresenceUpdate,
            revision: snapshot.revision,
            participants: snapshot
                .participants
                .iter()
                .map(|(id, name)| (id.as_str().to_string(), name.as_str().to_string()))
                .collect(),
        }
    }
}

/// Routed chat message as delivered to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub r#type: MessageType,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_ref: Option<FileRefDto>,
    pub sender_id: String,
    pub sender_name: String,
    /// Unix timestamp (milliseconds since epoch) in JST
    pub timestamp: i64,
    pub private: bool,
}

impl From<&Delivery> for ChatMessageDto {
    fn from(delivery: &Delivery) -> Self {
        let message: &ChatMessage = &delivery.message;
        let (text, file_ref) = match &message.body {
            MessageBody::Text(text) => (Some(text.clone()), None),
            MessageBody::FileReference(file) => (None, Some(FileRefDto::from(file))),
        };
        Self {
            r#type: MessageType::ChatMessage,
            kind: message.body.kind().as_str().to_string(),
            text,
            file_ref,
            sender_id: message.sender_id.as_str().to_string(),
            sender_name: message.sender_name.as_str().to_string(),
            timestamp: message.timestamp.value(),
            private: delivery.private,
        }
    }
}
