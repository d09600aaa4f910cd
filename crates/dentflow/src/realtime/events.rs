//! Socket protocol events.
//!
//! Frames are JSON text of the form `{"event": "<name>", "data": {...}}`.

use serde::{Deserialize, Serialize};

use crate::models::{Message, NewMessage};

/// Events a client sends.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    RegisterUser { user_id: String },
    #[serde(rename_all = "camelCase")]
    JoinChat { chat_id: String },
    #[serde(rename_all = "camelCase")]
    LeaveChat { chat_id: String },
    #[serde(rename_all = "camelCase")]
    SendMessage { chat_id: String, message: NewMessage },
    Typing(TypingEvent),
}

impl ClientEvent {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
    pub chat_id: String,
    pub user: String,
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub chat_id: String,
    pub count: u64,
}

/// Membership change of one chat, broadcast to every connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantsUpdate {
    pub chat_id: String,
    pub participants: Vec<String>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Events the server pushes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    NewMessage(Message),
    UnreadCountUpdate(UnreadCount),
    ParticipantsUpdated(ParticipantsUpdate),
    Typing(TypingEvent),
    Error { message: String },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::NewMessage(_) => "new-message",
            ServerEvent::UnreadCountUpdate(_) => "unread-count-update",
            ServerEvent::ParticipantsUpdated(_) => "participants-updated",
            ServerEvent::Typing(_) => "typing",
            ServerEvent::Error { .. } => "error",
        }
    }

    pub fn unread(chat_id: &str, count: u64) -> Self {
        ServerEvent::UnreadCountUpdate(UnreadCount {
            chat_id: chat_id.to_string(),
            count,
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
