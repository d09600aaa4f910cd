//! Pushes chat activity to connected clients.
//!
//! Every entry point (HTTP or socket) that writes chat state goes through
//! [`Fanout`], so both transports emit the same events. Emits never fail the
//! call that triggered them.

use crate::chat::{ChatManager, ParticipantDiff};
use crate::directory::Directory;
use crate::error::Result;
use crate::models::{Chat, Message, NewMessage, TeamMember};
use crate::orders::ChatProvision;
use crate::unread::UnreadCounter;

use super::events::{ParticipantsUpdate, ServerEvent, TypingEvent};
use super::hub::{ConnectionId, Hub};

#[derive(Clone)]
pub struct Fanout {
    chats: ChatManager,
    unread: UnreadCounter,
    directory: Directory,
    hub: Hub,
}

impl Fanout {
    pub fn new(chats: ChatManager, unread: UnreadCounter, directory: Directory, hub: Hub) -> Self {
        Self {
            chats,
            unread,
            directory,
            hub,
        }
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Persists a message, shows it to the chat's room and refreshes the
    /// unread badge of every known user who is neither the sender nor
    /// currently viewing the chat.
    pub fn send_message(&self, chat_id: &str, input: NewMessage) -> Result<Message> {
        let _span = tracing::info_span!("fanout.send_message", chat = %chat_id).entered();

        let message = self.chats.post_message(chat_id, input)?;
        self.hub
            .emit_to_room(chat_id, &ServerEvent::NewMessage(message.clone()), None);

        let pushed = self.push_unread(chat_id, &message.sender);
        log::debug!(
            "Message {} in chat {}: {} unread update(s) pushed",
            message.id,
            chat_id,
            pushed
        );
        Ok(message)
    }

    /// Pushes a fresh unread count to every registered known user other
    /// than `sender` who is not viewing the chat. Lookup failures skip the
    /// affected users; the message is already stored at this point.
    fn push_unread(&self, chat_id: &str, sender: &str) -> usize {
        let users = match self.directory.known_users() {
            Ok(users) => users,
            Err(e) => {
                log::warn!("Skipping unread push for chat {}: {}", chat_id, e);
                return 0;
            }
        };

        let mut pushed = 0;
        for user in users {
            if user == sender
                || self.hub.is_viewing(chat_id, &user)
                || !self.hub.is_registered(&user)
            {
                continue;
            }
            match self.unread.count(chat_id, &user) {
                Ok(count) => {
                    if self.hub.emit_to_user(&user, ServerEvent::unread(chat_id, count)) {
                        pushed += 1;
                    }
                }
                Err(e) => {
                    log::warn!("Unread count for '{}' in chat {} failed: {}", user, chat_id, e)
                }
            }
        }
        pushed
    }

    /// Marks the chat read for `user` and pushes the recomputed count to
    /// their socket. Returns the count after marking.
    pub fn mark_read(&self, chat_id: &str, user: &str) -> Result<u64> {
        let user = user.trim();
        let marked = self.unread.mark_all_read(chat_id, user)?;
        let count = self.unread.count(chat_id, user)?;
        if self.hub.is_registered(user) {
            self.hub.emit_to_user(user, ServerEvent::unread(chat_id, count));
        }
        log::debug!("'{}' read {} message(s) in chat {}", user, marked, chat_id);
        Ok(count)
    }

    /// Replaces the participant list and broadcasts the diff to every client.
    pub fn set_participants(
        &self,
        chat_id: &str,
        participants: &[String],
        updated_by: Option<&str>,
    ) -> Result<(Chat, ParticipantDiff)> {
        let _span = tracing::info_span!("fanout.set_participants", chat = %chat_id).entered();

        let (chat, diff) = self.chats.set_participants(chat_id, participants)?;
        self.hub.broadcast(ServerEvent::ParticipantsUpdated(ParticipantsUpdate {
            chat_id: chat.id.clone(),
            participants: chat.participants.clone(),
            added: diff.added.clone(),
            removed: diff.removed.clone(),
            updated_by: updated_by.map(str::to_string),
        }));
        if !diff.is_empty() {
            log::info!(
                "Chat {} participants changed: +{:?} -{:?}",
                chat.id,
                diff.added,
                diff.removed
            );
        }
        Ok((chat, diff))
    }

    /// Deletes a team member, first announcing their removal from every chat
    /// that lists them.
    ///
    /// The chats themselves are not rewritten. Returns the deleted member and
    /// the number of chats announced.
    pub fn remove_team_member(&self, member_id: &str) -> Result<(TeamMember, usize)> {
        let _span = tracing::info_span!("fanout.remove_team_member", member = %member_id).entered();

        let member = self.directory.get_team_member(member_id)?;
        let matcher = self.chats.matcher();
        let chats = self.chats.chats_containing(&member.full_name)?;
        for chat in &chats {
            let removed: Vec<String> = matcher
                .matching(&chat.participants, &member.full_name)
                .into_iter()
                .map(str::to_string)
                .collect();
            let remaining = chat
                .participants
                .iter()
                .filter(|p| !removed.contains(p))
                .cloned()
                .collect();
            self.hub.broadcast(ServerEvent::ParticipantsUpdated(ParticipantsUpdate {
                chat_id: chat.id.clone(),
                participants: remaining,
                added: Vec::new(),
                removed,
                updated_by: None,
            }));
        }
        self.directory.delete_team_member(member_id)?;
        log::info!(
            "Removed team member '{}' ({} chat(s) notified)",
            member.full_name,
            chats.len()
        );
        Ok((member, chats.len()))
    }

    /// Announces a chat that an order activation created or joined, then
    /// refreshes the unread badge of each registered participant.
    pub fn announce_chat_update(
        &self,
        provision: &ChatProvision,
        updated_by: Option<&str>,
    ) -> Result<()> {
        let chat = &provision.chat;
        let added = if provision.created {
            chat.participants.clone()
        } else {
            provision.added.iter().cloned().collect()
        };
        if !added.is_empty() {
            self.hub.broadcast(ServerEvent::ParticipantsUpdated(ParticipantsUpdate {
                chat_id: chat.id.clone(),
                participants: chat.participants.clone(),
                added,
                removed: Vec::new(),
                updated_by: updated_by.map(str::to_string),
            }));
        }

        for participant in &chat.participants {
            if !self.hub.is_registered(participant) {
                continue;
            }
            let count = self.unread.count(&chat.id, participant)?;
            self.hub.emit_to_user(participant, ServerEvent::unread(&chat.id, count));
        }
        Ok(())
    }

    /// Relays a typing indicator to the chat's room, minus the typist's socket.
    pub fn relay_typing(&self, origin: ConnectionId, event: TypingEvent) {
        let chat_id = event.chat_id.clone();
        self.hub
            .emit_to_room(&chat_id, &ServerEvent::Typing(event), Some(origin));
    }
}
