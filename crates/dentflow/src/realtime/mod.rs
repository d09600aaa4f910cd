//! Realtime layer: socket presence, room emits and unread fan-out.

pub mod events;
pub mod fanout;
pub mod hub;
pub mod presence;

pub use events::{ClientEvent, ParticipantsUpdate, ServerEvent, TypingEvent, UnreadCount};
pub use fanout::Fanout;
pub use hub::{ConnectionId, Hub};
pub use presence::{InMemoryPresence, PresenceStore};
