use std::net::SocketAddr;
use std::path::Path;

use crate::chat::ParticipantMatcher;
use crate::config::schema::Config;
use crate::error::ConfigError;

pub const ENV_BIND: &str = "DENTFLOW_BIND";
pub const ENV_DATABASE: &str = "DENTFLOW_DATABASE";
pub const ENV_MATCHING: &str = "DENTFLOW_MATCHING";
/// Names the config file to load. Unset means built-in defaults.
pub const ENV_CONFIG: &str = "DENTFLOW_CONFIG";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

/// Applies `DENTFLOW_*` environment overrides, then re-validates.
pub fn apply_env_overrides(mut config: Config) -> Result<Config, ConfigError> {
    if let Ok(bind) = std::env::var(ENV_BIND) {
        config.bind_address = bind;
    }
    if let Ok(path) = std::env::var(ENV_DATABASE) {
        config.database_path = Some(path.into());
    }
    if let Ok(matching) = std::env::var(ENV_MATCHING) {
        config.participant_matching = match matching.trim().to_ascii_lowercase().as_str() {
            "fuzzy" => ParticipantMatcher::Fuzzy,
            "exact" => ParticipantMatcher::Exact,
            other => {
                return Err(ConfigError::Validation {
                    message: format!(
                        "{} must be 'fuzzy' or 'exact', got '{}'",
                        ENV_MATCHING, other
                    ),
                })
            }
        };
    }

    validate_config(&config)?;
    Ok(config)
}

/// Loads the file named by `DENTFLOW_CONFIG` (or the defaults) and applies
/// the environment overrides.
pub fn load_from_env() -> Result<Config, ConfigError> {
    let config = match std::env::var(ENV_CONFIG) {
        Ok(path) if !path.trim().is_empty() => load_config(path.trim())?,
        _ => Config::default(),
    };
    apply_env_overrides(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.bind_address.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::Validation {
            message: format!("Invalid bind address: '{}'", config.bind_address),
        });
    }

    if config.broadcast_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "broadcastCapacity must be greater than zero".to_string(),
        });
    }

    Ok(())
}
