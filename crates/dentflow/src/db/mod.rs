//! SQLite persistence for orders, chats, messages, clinics and the lab team.
//!
//! One connection sits behind a mutex; repositories are plain functions over
//! `&Connection` so they compose inside [`Database::transaction`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, Transaction};

pub mod chat_repo;
pub mod clinic_repo;
pub mod error;
pub mod message_repo;
pub mod migrations;
pub mod order_repo;
pub mod team_repo;

pub use error::DatabaseError;

const FILE_PRAGMAS: &str = "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;";
const MEMORY_PRAGMAS: &str = "PRAGMA foreign_keys=ON;";

/// Shared handle to the lab database. Clones share the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the file at `path`, creating missing parent directories, and
    /// migrates it to the latest schema.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| DatabaseError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let db = Self::prepare(Connection::open(path)?, FILE_PRAGMAS)?;
        log::info!("Lab database ready at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::prepare(Connection::open_in_memory()?, MEMORY_PRAGMAS)
    }

    fn prepare(conn: Connection, pragmas: &str) -> Result<Self, DatabaseError> {
        conn.execute_batch(pragmas)?;
        migrations::run_all(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    /// Runs `f` with exclusive use of the connection.
    pub fn with_conn<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<DatabaseError>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Runs `f` inside one transaction: committed on `Ok`, rolled back on
    /// `Err` or when `f` panics.
    pub fn transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<DatabaseError>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(DatabaseError::from)?;
        let value = f(&tx)?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok(value)
    }
}

/// `~/.dentflow/data/dentflow.db`, or `None` without a home directory.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".dentflow").join("data").join("dentflow.db"))
}

/// A `Vec<String>` stored as JSON text (participants, attachments, read receipts).
///
/// NULL and empty text read back as an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct JsonList(pub Vec<String>);

impl FromSql for JsonList {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        if let ValueRef::Null = value {
            return Ok(JsonList(Vec::new()));
        }
        let text = value.as_str()?.trim();
        if text.is_empty() {
            return Ok(JsonList(Vec::new()));
        }
        serde_json::from_str(text)
            .map(JsonList)
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for JsonList {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let text = serde_json::to_string(&self.0)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        Ok(ToSqlOutput::from(text))
    }
}

/// Current time as a fixed-width RFC 3339 string, so stored timestamps sort
/// lexically.
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
