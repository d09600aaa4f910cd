//! Order chats and their messages.

use serde::{Deserialize, Serialize};

/// The single conversation thread bound to one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    /// Internal id of the order this chat belongs to.
    pub order_id: String,
    #[serde(rename = "type")]
    pub chat_type: String,
    pub title: String,
    /// Participant display names in insertion order, without duplicates.
    pub participants: Vec<String>,
    pub is_active: bool,
    pub clinic_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A chat as listed for one user, with that user's unread badge.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    #[serde(flatten)]
    pub chat: Chat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u64>,
}

/// A message posted in a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    /// Denormalized copy of the chat's order for order→message queries.
    pub order_id: String,
    pub sender: String,
    pub sender_role: Option<String>,
    pub sender_type: Option<String>,
    pub content: String,
    pub message_type: String,
    pub attachments: Vec<String>,
    /// Display names that have seen this message. Only ever grows.
    pub read_by: Vec<String>,
    pub created_at: String,
}

impl Message {
    pub fn is_read_by(&self, user: &str) -> bool {
        self.read_by.iter().any(|r| r == user)
    }
}

/// Body of a send, shared by `POST /chats/{id}/messages` and the socket
/// `send-message` event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub sender: String,
    #[serde(default)]
    pub sender_role: Option<String>,
    #[serde(default)]
    pub sender_type: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl NewMessage {
    pub fn text(sender: &str, content: &str) -> Self {
        Self {
            sender: sender.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }
}
