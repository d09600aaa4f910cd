//! Message repository: CRUD operations for the `messages` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{DatabaseError, JsonList};
use crate::models::Message;

fn from_row(row: &Row<'_>) -> Result<Message, rusqlite::Error> {
    let attachments: JsonList = row.get("attachments")?;
    let read_by: JsonList = row.get("read_by")?;
    Ok(Message {
        id: row.get("id")?,
        chat_id: row.get("chat_id")?,
        order_id: row.get("order_id")?,
        sender: row.get("sender")?,
        sender_role: row.get("sender_role")?,
        sender_type: row.get("sender_type")?,
        content: row.get("content")?,
        message_type: row.get("message_type")?,
        attachments: attachments.0,
        read_by: read_by.0,
        created_at: row.get("created_at")?,
    })
}

/// Inserts a new message row.
pub fn insert(conn: &Connection, message: &Message) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO messages (id, chat_id, order_id, sender, sender_role, sender_type,
         content, message_type, attachments, read_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            message.id,
            message.chat_id,
            message.order_id,
            message.sender,
            message.sender_role,
            message.sender_type,
            message.content,
            message.message_type,
            JsonList(message.attachments.clone()),
            JsonList(message.read_by.clone()),
            message.created_at,
        ],
    )?;
    Ok(())
}

/// Finds a message by ID.
pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<Message>, DatabaseError> {
    Ok(conn
        .query_row("SELECT * FROM messages WHERE id = ?1", params![id], from_row)
        .optional()?)
}

/// Lists a chat's messages in send order.
pub fn list_by_chat(conn: &Connection, chat_id: &str) -> Result<Vec<Message>, DatabaseError> {
    let mut stmt = conn
        .prepare("SELECT * FROM messages WHERE chat_id = ?1 ORDER BY created_at, rowid")?;
    let rows = stmt
        .query_map(params![chat_id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Lists an order's messages in send order, using the denormalized `order_id`.
pub fn list_by_order(conn: &Connection, order_id: &str) -> Result<Vec<Message>, DatabaseError> {
    let mut stmt = conn
        .prepare("SELECT * FROM messages WHERE order_id = ?1 ORDER BY created_at, rowid")?;
    let rows = stmt
        .query_map(params![order_id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Appends `reader` to one message's `read_by` list.
///
/// Reads and writes the single row, so the list only ever grows. Returns
/// false when the reader was already present or the message is gone.
pub fn add_reader(conn: &Connection, id: &str, reader: &str) -> Result<bool, DatabaseError> {
    let current: Option<JsonList> = conn
        .query_row(
            "SELECT read_by FROM messages WHERE id = ?1",
            params![id],
            |r| r.get(0),
        )
        .optional()?;

    let Some(JsonList(mut read_by)) = current else {
        return Ok(false);
    };
    if read_by.iter().any(|r| r == reader) {
        return Ok(false);
    }
    read_by.push(reader.to_string());

    conn.execute(
        "UPDATE messages SET read_by = ?2 WHERE id = ?1",
        params![id, JsonList(read_by)],
    )?;
    Ok(true)
}
