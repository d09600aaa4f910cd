//! Chat repository: CRUD operations for the `chats` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{DatabaseError, JsonList};
use crate::models::Chat;

fn from_row(row: &Row<'_>) -> Result<Chat, rusqlite::Error> {
    let participants: JsonList = row.get("participants")?;
    Ok(Chat {
        id: row.get("id")?,
        order_id: row.get("order_id")?,
        chat_type: row.get("chat_type")?,
        title: row.get("title")?,
        participants: participants.0,
        is_active: row.get("is_active")?,
        clinic_id: row.get("clinic_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Inserts a new chat row.
pub fn insert(conn: &Connection, chat: &Chat) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO chats (id, order_id, chat_type, title, participants, is_active,
         clinic_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            chat.id,
            chat.order_id,
            chat.chat_type,
            chat.title,
            JsonList(chat.participants.clone()),
            chat.is_active,
            chat.clinic_id,
            chat.created_at,
            chat.updated_at,
        ],
    )?;
    Ok(())
}

/// Finds a chat by ID.
pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<Chat>, DatabaseError> {
    Ok(conn
        .query_row("SELECT * FROM chats WHERE id = ?1", params![id], from_row)
        .optional()?)
}

/// Finds the chat bound to an order.
pub fn find_by_order_id(conn: &Connection, order_id: &str) -> Result<Option<Chat>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT * FROM chats WHERE order_id = ?1",
            params![order_id],
            from_row,
        )
        .optional()?)
}

/// Lists a clinic's chats, most recently active first.
pub fn list_by_clinic(conn: &Connection, clinic_id: &str) -> Result<Vec<Chat>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT * FROM chats WHERE clinic_id = ?1 ORDER BY updated_at DESC, id")?;
    let rows = stmt
        .query_map(params![clinic_id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Lists every chat.
pub fn list_all(conn: &Connection) -> Result<Vec<Chat>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM chats ORDER BY updated_at DESC, id")?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Replaces the participant list.
pub fn update_participants(
    conn: &Connection,
    id: &str,
    participants: &[String],
    updated_at: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE chats SET participants = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, JsonList(participants.to_vec()), updated_at],
    )?;
    Ok(())
}

/// Sets the `is_active` flag.
pub fn set_active(
    conn: &Connection,
    id: &str,
    active: bool,
    updated_at: &str,
) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "UPDATE chats SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, active, updated_at],
    )?;
    Ok(affected > 0)
}

/// Bumps `updated_at`.
pub fn touch(conn: &Connection, id: &str, updated_at: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE chats SET updated_at = ?2 WHERE id = ?1",
        params![id, updated_at],
    )?;
    Ok(())
}

/// Deletes a chat; its messages go with it (`ON DELETE CASCADE`).
pub fn delete(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    let affected = conn.execute("DELETE FROM chats WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn sample_chat(id: &str, order_id: &str) -> Chat {
        Chat {
            id: id.to_string(),
            order_id: order_id.to_string(),
            chat_type: "order".to_string(),
            title: format!("Order {}", order_id),
            participants: vec!["Clinic A".to_string(), "Dr. Smith".to_string()],
            is_active: true,
            clinic_id: "c1".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            insert(conn, &sample_chat("ch1", "o1"))?;
            let by_id = find_by_id(conn, "ch1")?.unwrap();
            assert_eq!(by_id.participants, vec!["Clinic A", "Dr. Smith"]);
            assert!(by_id.is_active);
            assert_eq!(find_by_order_id(conn, "o1")?.unwrap().id, "ch1");
            assert!(find_by_order_id(conn, "o2")?.is_none());
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_one_chat_per_order() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .with_conn(|conn| {
                insert(conn, &sample_chat("ch1", "o1"))?;
                insert(conn, &sample_chat("ch2", "o1"))
            })
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_update_participants_and_archive() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            insert(conn, &sample_chat("ch1", "o1"))?;
            update_participants(
                conn,
                "ch1",
                &["Clinic A".to_string()],
                "2026-01-02T00:00:00Z",
            )?;
            assert!(set_active(conn, "ch1", false, "2026-01-03T00:00:00Z")?);

            let chat = find_by_id(conn, "ch1")?.unwrap();
            assert_eq!(chat.participants, vec!["Clinic A"]);
            assert!(!chat.is_active);
            assert_eq!(chat.updated_at, "2026-01-03T00:00:00Z");
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_list_by_clinic_orders_by_recent_activity() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            insert(conn, &sample_chat("ch1", "o1"))?;
            insert(conn, &sample_chat("ch2", "o2"))?;
            touch(conn, "ch1", "2026-02-01T00:00:00Z")?;

            let chats = list_by_clinic(conn, "c1")?;
            assert_eq!(chats[0].id, "ch1");
            assert_eq!(chats.len(), 2);
            assert!(list_by_clinic(conn, "c9")?.is_empty());
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }
}
