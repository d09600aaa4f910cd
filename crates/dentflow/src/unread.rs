//! Unread counts per (chat, user).
//!
//! Counts are recomputed from read receipts on every call instead of being
//! cached, so concurrent sends and reads can never leave a stale counter.

use crate::chat::ParticipantMatcher;
use crate::db::{chat_repo, message_repo, Database};
use crate::error::{DentflowError, Result};
use crate::models::{Chat, ChatSummary, Message};

/// Messages in `messages` that `user` has not read, or 0 when `user` is not a
/// participant of `chat`.
pub fn unread_in(
    matcher: ParticipantMatcher,
    chat: &Chat,
    messages: &[Message],
    user: &str,
) -> u64 {
    if !matcher.is_participant(&chat.participants, user) {
        return 0;
    }
    messages.iter().filter(|m| !m.is_read_by(user)).count() as u64
}

#[derive(Clone)]
pub struct UnreadCounter {
    db: Database,
    matcher: ParticipantMatcher,
}

impl UnreadCounter {
    pub fn new(db: Database, matcher: ParticipantMatcher) -> Self {
        Self { db, matcher }
    }

    /// Unread messages of `chat_id` for `user`. A missing chat counts as 0.
    pub fn count(&self, chat_id: &str, user: &str) -> Result<u64> {
        self.db.with_conn(|conn| {
            let Some(chat) = chat_repo::find_by_id(conn, chat_id)? else {
                return Ok(0);
            };
            if !self.matcher.is_participant(&chat.participants, user) {
                return Ok(0);
            }
            let messages = message_repo::list_by_chat(conn, chat_id)?;
            Ok::<_, DentflowError>(unread_in(self.matcher, &chat, &messages, user))
        })
    }

    /// Adds `user` to `readBy` of every message in the chat that lacks it.
    ///
    /// Each message is updated on its own. A failure midway leaves the
    /// earlier messages read, and calling again completes the rest. Returns
    /// how many messages changed.
    pub fn mark_all_read(&self, chat_id: &str, user: &str) -> Result<usize> {
        let user = user.trim();
        if user.is_empty() {
            return Err(DentflowError::Invalid("userId is required".to_string()));
        }
        let pending: Vec<String> = self.db.with_conn(|conn| {
            chat_repo::find_by_id(conn, chat_id)?
                .ok_or_else(|| DentflowError::not_found("Chat", chat_id))?;
            let messages = message_repo::list_by_chat(conn, chat_id)?;
            Ok::<_, DentflowError>(
                messages
                    .into_iter()
                    .filter(|m| !m.is_read_by(user))
                    .map(|m| m.id)
                    .collect(),
            )
        })?;

        let mut marked = 0;
        for message_id in &pending {
            let added = self.db.with_conn(|conn| {
                message_repo::add_reader(conn, message_id, user).map_err(DentflowError::from)
            })?;
            if added {
                marked += 1;
            }
        }
        if marked > 0 {
            log::debug!("Marked {} message(s) in chat {} read by '{}'", marked, chat_id, user);
        }
        Ok(marked)
    }

    /// Chats of a clinic, newest activity first.
    ///
    /// With a `user`, chats the user does not participate in are dropped and
    /// each remaining chat carries its unread count.
    pub fn summaries_for_clinic(
        &self,
        clinic_id: &str,
        user: Option<&str>,
    ) -> Result<Vec<ChatSummary>> {
        let user = user.map(str::trim).filter(|u| !u.is_empty());
        self.db.with_conn(|conn| {
            let chats = chat_repo::list_by_clinic(conn, clinic_id)?;
            let Some(user) = user else {
                return Ok(chats
                    .into_iter()
                    .map(|chat| ChatSummary {
                        chat,
                        unread_count: None,
                    })
                    .collect());
            };

            let mut summaries = Vec::new();
            for chat in chats {
                if !self.matcher.is_participant(&chat.participants, user) {
                    continue;
                }
                let messages = message_repo::list_by_chat(conn, &chat.id)?;
                let count = unread_in(self.matcher, &chat, &messages, user);
                summaries.push(ChatSummary {
                    chat,
                    unread_count: Some(count),
                });
            }
            Ok::<_, DentflowError>(summaries)
        })
    }
}
