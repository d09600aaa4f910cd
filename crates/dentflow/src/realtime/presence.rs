//! Who is connected, and who is looking at which chat.
//!
//! State is process-local and rebuilt as clients reconnect. [`PresenceStore`]
//! is the seam for swapping in a shared store when running several instances.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

/// User-to-connection registry plus per-chat active viewers.
pub trait PresenceStore: Send + Sync {
    /// Maps `user` to `connection`, replacing any earlier mapping.
    /// Returns the replaced connection.
    fn register(&self, user: &str, connection: Uuid) -> Option<Uuid>;

    fn lookup(&self, user: &str) -> Option<Uuid>;

    /// Removes the mapping that points at `connection`, if any, and returns
    /// its user. A mapping already taken over by a newer connection is kept.
    fn unregister_connection(&self, connection: Uuid) -> Option<String>;

    fn join(&self, chat_id: &str, user: &str);

    fn leave(&self, chat_id: &str, user: &str);

    fn is_viewing(&self, chat_id: &str, user: &str) -> bool;

    fn viewers(&self, chat_id: &str) -> Vec<String>;

    fn registered_users(&self) -> Vec<String>;

    /// Removes `user` from the viewer set of every chat.
    fn drop_connection_views(&self, user: &str);
}

#[derive(Default)]
struct PresenceState {
    sockets: HashMap<String, Uuid>,
    viewers: HashMap<String, HashSet<String>>,
}

#[derive(Default)]
pub struct InMemoryPresence {
    state: Mutex<PresenceState>,
}

impl InMemoryPresence {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PresenceState> {
        // The maps stay consistent across a panic, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PresenceStore for InMemoryPresence {
    fn register(&self, user: &str, connection: Uuid) -> Option<Uuid> {
        self.state().sockets.insert(user.to_string(), connection)
    }

    fn lookup(&self, user: &str) -> Option<Uuid> {
        self.state().sockets.get(user).copied()
    }

    fn unregister_connection(&self, connection: Uuid) -> Option<String> {
        let mut state = self.state();
        let user = state
            .sockets
            .iter()
            .find(|(_, c)| **c == connection)
            .map(|(u, _)| u.clone())?;
        state.sockets.remove(&user);
        Some(user)
    }

    fn join(&self, chat_id: &str, user: &str) {
        self.state()
            .viewers
            .entry(chat_id.to_string())
            .or_default()
            .insert(user.to_string());
    }

    fn leave(&self, chat_id: &str, user: &str) {
        let mut state = self.state();
        if let Some(viewers) = state.viewers.get_mut(chat_id) {
            viewers.remove(user);
            if viewers.is_empty() {
                state.viewers.remove(chat_id);
            }
        }
    }

    fn is_viewing(&self, chat_id: &str, user: &str) -> bool {
        self.state()
            .viewers
            .get(chat_id)
            .is_some_and(|v| v.contains(user))
    }

    fn viewers(&self, chat_id: &str) -> Vec<String> {
        let mut viewers: Vec<String> = self
            .state()
            .viewers
            .get(chat_id)
            .map(|v| v.iter().cloned().collect())
            .unwrap_or_default();
        viewers.sort();
        viewers
    }

    fn registered_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.state().sockets.keys().cloned().collect();
        users.sort();
        users
    }

    fn drop_connection_views(&self, user: &str) {
        let mut state = self.state();
        state.viewers.retain(|_, viewers| {
            viewers.remove(user);
            !viewers.is_empty()
        });
    }
}
