//! Failures of the persistence layer.

use std::path::PathBuf;

use rusqlite::ffi::{ErrorCode, SQLITE_CONSTRAINT_UNIQUE};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database directory could not be created.
    #[error("cannot prepare database directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schema v{version} failed to apply: {reason}")]
    Migration { version: u32, reason: String },

    #[error("database connection lock poisoned")]
    LockPoisoned,
}

impl DatabaseError {
    /// Returns true when the error is a UNIQUE constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == ErrorCode::ConstraintViolation
                    && err.extended_code == SQLITE_CONSTRAINT_UNIQUE
            }
            _ => false,
        }
    }

    /// Name of the column behind a UNIQUE violation, when SQLite reports it.
    ///
    /// SQLite formats the message as `UNIQUE constraint failed: orders.order_id`.
    pub fn unique_column(&self) -> Option<&str> {
        match self {
            DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(_, Some(msg)))
                if self.is_unique_violation() =>
            {
                msg.rsplit('.').next()
            }
            _ => None,
        }
    }
}
