use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::chat::ParticipantMatcher;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// SQLite file. Falls back to `~/.dentflow/data/dentflow.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub participant_matching: ParticipantMatcher,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Capacity of the system-wide realtime broadcast channel.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_broadcast_capacity() -> usize {
    256
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            database_path: None,
            participant_matching: ParticipantMatcher::default(),
            log_format: LogFormat::default(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

impl Config {
    /// The configured database path, or the per-user default.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(crate::db::default_database_path)
    }
}
