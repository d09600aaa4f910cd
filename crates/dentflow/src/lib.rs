pub mod chat;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod models;
pub mod orders;
pub mod realtime;
pub mod services;
pub mod unread;

pub use chat::{ChatManager, ParticipantDiff, ParticipantMatcher};
pub use config::{load_config, Config, LogFormat};
pub use db::{Database, DatabaseError};
pub use directory::Directory;
pub use error::{ConfigError, DentflowError, Result};
pub use orders::{ChatProvision, OrderStatusEngine, StatusOutcome};
pub use realtime::{ClientEvent, Fanout, Hub, ServerEvent};
pub use services::Services;
pub use unread::UnreadCounter;
