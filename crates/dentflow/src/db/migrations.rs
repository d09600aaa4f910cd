//! Schema versioning for the lab database.
//!
//! Every step is recorded in `_migrations` and applied once, inside its own
//! transaction, so a failed step leaves the schema at the previous version.

use std::collections::HashSet;

use rusqlite::{params, Connection};

use super::error::DatabaseError;
use super::now_timestamp;

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

/// Ordered by version.
const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "create_core_tables",
        sql: include_str!("sql/001_create_core_tables.sql"),
    },
    Step {
        version: 2,
        name: "unique_order_identifiers",
        sql: include_str!("sql/002_unique_identifiers.sql"),
    },
];

/// Number of schema steps this build knows about.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |s| s.version)
}

/// Brings `conn` up to [`latest_version`].
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version    INTEGER PRIMARY KEY,
            name       TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );",
    )?;

    let applied = applied_versions(conn)?;
    let pending: Vec<&Step> = STEPS
        .iter()
        .filter(|s| !applied.contains(&s.version))
        .collect();
    if pending.is_empty() {
        log::debug!("Schema is current at v{}", latest_version());
        return Ok(());
    }

    for step in pending {
        apply(conn, step)?;
    }
    Ok(())
}

fn applied_versions(conn: &Connection) -> Result<HashSet<u32>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT version FROM _migrations")?;
    let versions = stmt
        .query_map([], |r| r.get::<_, u32>(0))?
        .collect::<rusqlite::Result<HashSet<_>>>()?;
    Ok(versions)
}

fn apply(conn: &Connection, step: &Step) -> Result<(), DatabaseError> {
    log::info!("Applying schema v{} ({})", step.version, step.name);

    let failed = |e: rusqlite::Error| DatabaseError::Migration {
        version: step.version,
        reason: e.to_string(),
    };
    let tx = conn.unchecked_transaction().map_err(failed)?;
    tx.execute_batch(step.sql).map_err(failed)?;
    tx.execute(
        "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![step.version, step.name, now_timestamp()],
    )
    .map_err(failed)?;
    tx.commit().map_err(failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        run_all(&conn).unwrap();
        conn
    }

    fn count(conn: &Connection, sql: &str) -> u32 {
        conn.query_row(sql, [], |r| r.get(0)).unwrap()
    }

    fn index_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
            [name],
            |r| r.get::<_, u32>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn test_fresh_db_reaches_latest_version() {
        let conn = fresh();
        assert_eq!(
            count(&conn, "SELECT MAX(version) FROM _migrations"),
            latest_version()
        );
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM _migrations"),
            STEPS.len() as u32
        );
    }

    #[test]
    fn test_rerun_applies_nothing() {
        let conn = fresh();
        run_all(&conn).unwrap();
        run_all(&conn).unwrap();
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM _migrations"),
            STEPS.len() as u32
        );
    }

    #[test]
    fn test_partially_migrated_db_catches_up() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE _migrations (
                version INTEGER PRIMARY KEY, name TEXT NOT NULL, applied_at TEXT NOT NULL
            );",
        )
        .unwrap();
        conn.execute_batch(STEPS[0].sql).unwrap();
        conn.execute(
            "INSERT INTO _migrations VALUES (1, 'create_core_tables', '2026-01-01')",
            [],
        )
        .unwrap();

        run_all(&conn).unwrap();
        assert!(index_exists(&conn, "idx_orders_order_id_unique"));
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM _migrations"), 2);
    }

    #[test]
    fn test_unique_indexes_exist() {
        let conn = fresh();
        assert!(index_exists(&conn, "idx_orders_order_id_unique"));
        assert!(index_exists(&conn, "idx_orders_crate_no_unique"));
        assert!(index_exists(&conn, "idx_chats_order_id_unique"));
    }

    #[test]
    fn test_null_order_ids_do_not_collide() {
        let conn = fresh();
        for id in ["o1", "o2"] {
            conn.execute(
                "INSERT INTO orders (id, clinic_id, created_at, updated_at)
                 VALUES (?1, 'c1', '2026-01-01', '2026-01-01')",
                [id],
            )
            .unwrap();
        }
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM orders"), 2);
    }

    #[test]
    fn test_deleting_chat_cascades_messages() {
        let conn = fresh();
        conn.execute_batch(
            "INSERT INTO chats (id, order_id, title, clinic_id, created_at, updated_at)
                 VALUES ('ch1', 'o1', 'Order o1', 'c1', '2026-01-01', '2026-01-01');
             INSERT INTO messages (id, chat_id, order_id, sender, created_at)
                 VALUES ('m1', 'ch1', 'o1', 'Dr. Smith', '2026-01-01');",
        )
        .unwrap();
        conn.execute("DELETE FROM chats WHERE id = 'ch1'", []).unwrap();
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM messages"), 0);
    }
}
