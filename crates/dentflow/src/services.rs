//! The wired-up set of services one process runs.

use std::sync::Arc;

use crate::chat::{ChatManager, ParticipantMatcher};
use crate::config::Config;
use crate::db::Database;
use crate::directory::Directory;
use crate::orders::OrderStatusEngine;
use crate::realtime::{Fanout, Hub, InMemoryPresence, PresenceStore};
use crate::unread::UnreadCounter;

#[derive(Clone)]
pub struct Services {
    pub orders: OrderStatusEngine,
    pub chats: ChatManager,
    pub unread: UnreadCounter,
    pub directory: Directory,
    pub fanout: Fanout,
}

impl Services {
    pub fn new(db: Database, config: &Config) -> Self {
        Self::with_presence(
            db,
            config.participant_matching,
            Arc::new(InMemoryPresence::new()),
            config.broadcast_capacity,
        )
    }

    pub fn with_presence(
        db: Database,
        matcher: ParticipantMatcher,
        presence: Arc<dyn PresenceStore>,
        broadcast_capacity: usize,
    ) -> Self {
        let chats = ChatManager::new(db.clone(), matcher);
        let unread = UnreadCounter::new(db.clone(), matcher);
        let directory = Directory::new(db.clone());
        let hub = Hub::new(presence, broadcast_capacity);
        let fanout = Fanout::new(chats.clone(), unread.clone(), directory.clone(), hub);
        Self {
            orders: OrderStatusEngine::new(db, matcher),
            chats,
            unread,
            directory,
            fanout,
        }
    }

    pub fn hub(&self) -> &Hub {
        self.fanout.hub()
    }
}
