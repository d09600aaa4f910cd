//! Chat manager: owns the one chat of each order and its participant set.

use rusqlite::Connection;
use uuid::Uuid;

use crate::chat::participants::{self, ParticipantDiff, ParticipantMatcher};
use crate::db::{chat_repo, message_repo, now_timestamp, Database};
use crate::error::{DentflowError, Result};
use crate::models::{Chat, Message, NewMessage, Order};

pub const ORDER_CHAT_TYPE: &str = "order";

#[derive(Clone)]
pub struct ChatManager {
    db: Database,
    matcher: ParticipantMatcher,
}

impl ChatManager {
    pub fn new(db: Database, matcher: ParticipantMatcher) -> Self {
        Self { db, matcher }
    }

    pub fn matcher(&self) -> ParticipantMatcher {
        self.matcher
    }

    /// Looks up a chat by id.
    pub fn get(&self, chat_id: &str) -> Result<Chat> {
        self.db
            .with_conn(|conn| chat_repo::find_by_id(conn, chat_id).map_err(DentflowError::from))?
            .ok_or_else(|| DentflowError::not_found("Chat", chat_id))
    }

    /// Returns the order's chat, or `None` when it has not been provisioned yet.
    /// Callers decide whether to create one.
    pub fn find_for_order(&self, order_id: &str) -> Result<Option<Chat>> {
        self.db
            .with_conn(|conn| chat_repo::find_by_order_id(conn, order_id).map_err(Into::into))
    }

    /// Creates the chat for `order` inside the caller's connection or transaction.
    pub(crate) fn create_in(
        conn: &Connection,
        order: &Order,
        initial: &[String],
    ) -> Result<Chat> {
        let now = now_timestamp();
        let label = order.order_id.as_deref().unwrap_or(&order.id);
        let chat = Chat {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            chat_type: ORDER_CHAT_TYPE.to_string(),
            title: format!("Order {}", label),
            participants: participants::normalize(initial),
            is_active: true,
            clinic_id: order.clinic_id.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        chat_repo::insert(conn, &chat)?;
        log::info!(
            "Created chat {} for order {} with participants {:?}",
            chat.id,
            order.id,
            chat.participants
        );
        Ok(chat)
    }

    /// Appends `name` when the matcher does not already see it as a participant.
    /// Returns true when the list changed.
    pub(crate) fn add_participant_in(
        conn: &Connection,
        matcher: ParticipantMatcher,
        chat: &mut Chat,
        name: &str,
    ) -> Result<bool> {
        if name.trim().is_empty() || matcher.is_participant(&chat.participants, name) {
            return Ok(false);
        }
        if !participants::merge_participant(&mut chat.participants, name) {
            return Ok(false);
        }
        chat.updated_at = now_timestamp();
        chat_repo::update_participants(conn, &chat.id, &chat.participants, &chat.updated_at)?;
        log::debug!("Added participant '{}' to chat {}", name.trim(), chat.id);
        Ok(true)
    }

    /// Adds a participant unless already present. Returns the chat and whether it changed.
    pub fn add_participant_if_absent(&self, chat_id: &str, name: &str) -> Result<(Chat, bool)> {
        let matcher = self.matcher;
        self.db.transaction(|tx| {
            let mut chat = chat_repo::find_by_id(tx, chat_id)?
                .ok_or_else(|| DentflowError::not_found("Chat", chat_id))?;
            let added = Self::add_participant_in(tx, matcher, &mut chat, name)?;
            Ok((chat, added))
        })
    }

    /// Replaces the participant list. The returned diff is what clients need
    /// to update their membership views.
    pub fn set_participants(
        &self,
        chat_id: &str,
        next: &[String],
    ) -> Result<(Chat, ParticipantDiff)> {
        let next = participants::normalize(next);
        self.db.transaction(|tx| {
            let mut chat = chat_repo::find_by_id(tx, chat_id)?
                .ok_or_else(|| DentflowError::not_found("Chat", chat_id))?;
            let diff = ParticipantDiff::between(&chat.participants, &next);
            if !diff.is_empty() {
                chat.participants = next;
                chat.updated_at = now_timestamp();
                chat_repo::update_participants(tx, &chat.id, &chat.participants, &chat.updated_at)?;
            }
            Ok((chat, diff))
        })
    }

    /// Marks the chat inactive. Messages are kept.
    pub fn archive(&self, chat_id: &str) -> Result<Chat> {
        self.db.with_conn(|conn| {
            if !chat_repo::set_active(conn, chat_id, false, &now_timestamp())? {
                return Err(DentflowError::not_found("Chat", chat_id));
            }
            chat_repo::find_by_id(conn, chat_id)?
                .ok_or_else(|| DentflowError::not_found("Chat", chat_id))
        })
    }

    /// Hard-deletes the chat and, by cascade, its messages. Admin use only.
    pub fn delete(&self, chat_id: &str) -> Result<()> {
        let deleted = self
            .db
            .with_conn(|conn| chat_repo::delete(conn, chat_id).map_err(DentflowError::from))?;
        if !deleted {
            return Err(DentflowError::not_found("Chat", chat_id));
        }
        log::info!("Deleted chat {} and its messages", chat_id);
        Ok(())
    }

    pub fn list_for_clinic(&self, clinic_id: &str) -> Result<Vec<Chat>> {
        self.db
            .with_conn(|conn| chat_repo::list_by_clinic(conn, clinic_id).map_err(Into::into))
    }

    /// Every chat whose participant list includes `name` under the configured matcher.
    pub fn chats_containing(&self, name: &str) -> Result<Vec<Chat>> {
        let chats = self
            .db
            .with_conn(|conn| chat_repo::list_all(conn).map_err(DentflowError::from))?;
        Ok(chats
            .into_iter()
            .filter(|chat| self.matcher.is_participant(&chat.participants, name))
            .collect())
    }

    /// Persists a message and bumps the chat's `updatedAt`.
    ///
    /// Membership is not checked here: any named sender may post, and the
    /// participant list is left as is.
    ///
    /// The sender has implicitly read their own message, so `readBy` starts
    /// as `[sender]`.
    pub fn post_message(&self, chat_id: &str, input: NewMessage) -> Result<Message> {
        let sender = input.sender.trim().to_string();
        if sender.is_empty() {
            return Err(DentflowError::Invalid("message sender is required".to_string()));
        }
        self.db.transaction(|tx| {
            let chat = chat_repo::find_by_id(tx, chat_id)?
                .ok_or_else(|| DentflowError::not_found("Chat", chat_id))?;
            let now = now_timestamp();
            let message = Message {
                id: Uuid::new_v4().to_string(),
                chat_id: chat.id.clone(),
                order_id: chat.order_id.clone(),
                sender: sender.clone(),
                sender_role: input.sender_role,
                sender_type: input.sender_type,
                content: input.content,
                message_type: input.message_type.unwrap_or_else(|| "text".to_string()),
                attachments: input.attachments,
                read_by: vec![sender],
                created_at: now.clone(),
            };
            message_repo::insert(tx, &message)?;
            chat_repo::touch(tx, &chat.id, &now)?;
            Ok(message)
        })
    }

    pub fn messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        self.get(chat_id)?;
        self.db
            .with_conn(|conn| message_repo::list_by_chat(conn, chat_id).map_err(Into::into))
    }

    /// Messages of an order across its chat, via the denormalized `order_id`.
    pub fn order_messages(&self, order_id: &str) -> Result<Vec<Message>> {
        self.db
            .with_conn(|conn| message_repo::list_by_order(conn, order_id).map_err(Into::into))
    }
}
