//! Domain records shared by the engine, chat manager and realtime layer.

pub mod chat;
pub mod directory;
pub mod order;

pub use chat::{Chat, ChatSummary, Message, NewMessage};
pub use directory::{Clinic, NewClinic, NewTeamMember, TeamMember};
pub use order::{NewOrder, Order, OrderStatus, StatusChange};
