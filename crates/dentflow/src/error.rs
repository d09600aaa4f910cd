use std::path::PathBuf;
use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum DentflowError {
    /// A unique order identifier (`orderId`, `crateNo`) is already held by another order.
    #[error("{field} '{value}' is already assigned to another order")]
    DuplicateIdentifier { field: &'static str, value: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A record the operation depends on is missing, e.g. the clinic of an
    /// order when its chat is first provisioned.
    #[error("Missing dependency: {0}")]
    DependencyMissing(String),

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl DentflowError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DentflowError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Maps a UNIQUE violation on an order identifier to `DuplicateIdentifier`;
    /// any other database error passes through unchanged.
    pub(crate) fn from_order_write(err: DatabaseError, order_id: &str, crate_no: &str) -> Self {
        match err.unique_column() {
            Some("order_id") => DentflowError::DuplicateIdentifier {
                field: "orderId",
                value: order_id.to_string(),
            },
            Some("crate_no") => DentflowError::DuplicateIdentifier {
                field: "crateNo",
                value: crate_no.to_string(),
            },
            _ => DentflowError::Database(err),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

pub type Result<T> = std::result::Result<T, DentflowError>;
