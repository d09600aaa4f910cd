//! Test harness for isolated test execution.

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use dentflow::models::{Chat, Clinic, NewMessage, Order, OrderStatus, StatusChange, TeamMember};
use dentflow::realtime::{ConnectionId, InMemoryPresence};
use dentflow::{Database, DatabaseError, ParticipantMatcher, ServerEvent, Services, StatusOutcome};

use super::builders::{team_member, ClinicBuilder, OrderBuilder};

/// A connected test client.
pub struct Client {
    pub connection: ConnectionId,
    pub events: UnboundedReceiver<ServerEvent>,
}

impl Client {
    /// Every event queued so far.
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Counts of the `unread-count-update` events queued so far.
    pub fn unread_updates(&mut self) -> Vec<u64> {
        self.drain()
            .into_iter()
            .filter_map(|event| match event {
                ServerEvent::UnreadCountUpdate(update) => Some(update.count),
                _ => None,
            })
            .collect()
    }
}

/// Every service wired over a database file in a temp directory.
pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Database,
    pub services: Services,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_matcher(ParticipantMatcher::Fuzzy)
    }

    pub fn with_matcher(matcher: ParticipantMatcher) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open(&temp_dir.path().join("data").join("dentflow.db"))
            .expect("Failed to open database");
        let services =
            Services::with_presence(db.clone(), matcher, Arc::new(InMemoryPresence::new()), 64);
        Self {
            temp_dir,
            db,
            services,
        }
    }

    pub fn clinic(&self, first_name: &str, last_name: &str) -> Clinic {
        self.services
            .directory
            .create_clinic(ClinicBuilder::new(first_name, last_name).build())
            .expect("Failed to create clinic")
    }

    pub fn member(&self, full_name: &str) -> TeamMember {
        self.services
            .directory
            .create_team_member(team_member(full_name, "technician"))
            .expect("Failed to create team member")
    }

    pub fn order(&self, clinic: &Clinic) -> Order {
        self.services
            .orders
            .create_order(OrderBuilder::for_clinic(&clinic.id).build())
            .expect("Failed to create order")
    }

    pub fn activate(&self, order: &Order, user: &str) -> StatusOutcome {
        self.services
            .orders
            .change_status(&order.id, &StatusChange::to(OrderStatus::Active).user(user))
            .expect("Activation failed")
    }

    /// Activates `order` and returns its chat.
    pub fn active_chat(&self, order: &Order, user: &str) -> Chat {
        self.activate(order, user)
            .chat
            .expect("Activation did not provision a chat")
            .chat
    }

    pub fn send(&self, chat: &Chat, sender: &str, content: &str) {
        self.services
            .fanout
            .send_message(&chat.id, NewMessage::text(sender, content))
            .expect("Send failed");
    }

    pub fn connect(&self, user: &str) -> Client {
        let hub = self.services.hub();
        let (connection, events) = hub.connect();
        hub.register_user(connection, user);
        Client { connection, events }
    }

    pub fn chat_rows_for(&self, order: &Order) -> u32 {
        self.db
            .with_conn(|conn| {
                Ok::<_, DatabaseError>(conn.query_row(
                    "SELECT COUNT(*) FROM chats WHERE order_id = ?1",
                    [&order.id],
                    |r| r.get(0),
                )?)
            })
            .expect("Failed to count chats")
    }
}
