//! Connection registry and event delivery.
//!
//! Each socket gets an unbounded queue of [`ServerEvent`]s drained by its
//! writer task. System-wide events go through a broadcast channel every
//! socket subscribes to. Delivery is fire-and-forget: a closed connection
//! just misses the event.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use super::events::ServerEvent;
use super::presence::{InMemoryPresence, PresenceStore};

pub type ConnectionId = Uuid;

struct Connection {
    sender: mpsc::UnboundedSender<ServerEvent>,
    user: Option<String>,
    rooms: HashSet<String>,
}

#[derive(Clone)]
pub struct Hub {
    presence: Arc<dyn PresenceStore>,
    connections: Arc<Mutex<HashMap<ConnectionId, Connection>>>,
    system: Arc<broadcast::Sender<ServerEvent>>,
}

impl Hub {
    /// Creates a hub over `presence` with the given broadcast channel capacity.
    pub fn new(presence: Arc<dyn PresenceStore>, capacity: usize) -> Self {
        let (system, _) = broadcast::channel(capacity.max(1));
        Self {
            presence,
            connections: Arc::new(Mutex::new(HashMap::new())),
            system: Arc::new(system),
        }
    }

    /// Hub backed by [`InMemoryPresence`].
    pub fn in_memory(capacity: usize) -> Self {
        Self::new(Arc::new(InMemoryPresence::new()), capacity)
    }

    fn connections(&self) -> MutexGuard<'_, HashMap<ConnectionId, Connection>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new socket. The receiver yields events addressed to it.
    pub fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();
        self.connections().insert(
            id,
            Connection {
                sender,
                user: None,
                rooms: HashSet::new(),
            },
        );
        log::debug!("Socket {} connected", id);
        (id, receiver)
    }

    /// Binds `user` to the connection. The newest connection of a user is
    /// the one that receives personal pushes.
    pub fn register_user(&self, connection: ConnectionId, user: &str) -> bool {
        let user = user.trim();
        if user.is_empty() {
            return false;
        }
        let rooms = {
            let mut connections = self.connections();
            let Some(entry) = connections.get_mut(&connection) else {
                return false;
            };
            entry.user = Some(user.to_string());
            entry.rooms.iter().cloned().collect::<Vec<_>>()
        };
        if let Some(previous) = self.presence.register(user, connection) {
            if previous != connection {
                log::debug!("User '{}' moved from socket {} to {}", user, previous, connection);
            }
        }
        for room in rooms {
            self.presence.join(&room, user);
        }
        log::info!("User '{}' registered on socket {}", user, connection);
        true
    }

    /// Puts the connection in the chat's room and, once registered, marks
    /// its user as viewing the chat.
    pub fn join_chat(&self, connection: ConnectionId, chat_id: &str) {
        let user = {
            let mut connections = self.connections();
            let Some(entry) = connections.get_mut(&connection) else {
                return;
            };
            entry.rooms.insert(chat_id.to_string());
            entry.user.clone()
        };
        if let Some(user) = user {
            self.presence.join(chat_id, &user);
        }
    }

    pub fn leave_chat(&self, connection: ConnectionId, chat_id: &str) {
        let user = {
            let mut connections = self.connections();
            let Some(entry) = connections.get_mut(&connection) else {
                return;
            };
            entry.rooms.remove(chat_id);
            entry.user.clone()
        };
        if let Some(user) = user {
            self.presence.leave(chat_id, &user);
        }
    }

    /// Forgets the connection and its user's presence.
    pub fn disconnect(&self, connection: ConnectionId) {
        let Some(entry) = self.connections().remove(&connection) else {
            return;
        };
        if let Some(user) = &entry.user {
            for room in &entry.rooms {
                self.presence.leave(room, user);
            }
        }
        if let Some(user) = self.presence.unregister_connection(connection) {
            self.presence.drop_connection_views(&user);
            log::info!("User '{}' disconnected", user);
        } else {
            log::debug!("Socket {} disconnected", connection);
        }
    }

    pub fn is_registered(&self, user: &str) -> bool {
        self.presence.lookup(user).is_some()
    }

    pub fn is_viewing(&self, chat_id: &str, user: &str) -> bool {
        self.presence.is_viewing(chat_id, user)
    }

    pub fn emit_to_connection(&self, connection: ConnectionId, event: ServerEvent) -> bool {
        let connections = self.connections();
        let Some(entry) = connections.get(&connection) else {
            return false;
        };
        let name = event.name();
        match entry.sender.send(event) {
            Ok(()) => true,
            Err(_) => {
                log::debug!("Dropped '{}' for closed socket {}", name, connection);
                false
            }
        }
    }

    /// Sends to the user's registered connection. Returns false when the user
    /// has none or it is gone.
    pub fn emit_to_user(&self, user: &str, event: ServerEvent) -> bool {
        match self.presence.lookup(user) {
            Some(connection) => self.emit_to_connection(connection, event),
            None => false,
        }
    }

    /// Sends to every connection in the chat's room except `except`.
    /// Returns the number of connections the event was queued for.
    pub fn emit_to_room(
        &self,
        chat_id: &str,
        event: &ServerEvent,
        except: Option<ConnectionId>,
    ) -> usize {
        let connections = self.connections();
        connections
            .iter()
            .filter(|(id, c)| Some(**id) != except && c.rooms.contains(chat_id))
            .filter(|(_, c)| c.sender.send(event.clone()).is_ok())
            .count()
    }

    /// Sends to every connected client.
    pub fn broadcast(&self, event: ServerEvent) {
        // No subscribers is fine
        let _ = self.system.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.system.subscribe()
    }

    pub fn connection_count(&self) -> usize {
        self.connections().len()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::in_memory(256)
    }
}
