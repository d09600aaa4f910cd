//! Team member repository: CRUD operations for the `team_members` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;
use crate::models::TeamMember;

fn from_row(row: &Row<'_>) -> Result<TeamMember, rusqlite::Error> {
    Ok(TeamMember {
        id: row.get("id")?,
        full_name: row.get("full_name")?,
        role: row.get("role")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
    })
}

/// Inserts a new team member row.
pub fn insert(conn: &Connection, member: &TeamMember) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO team_members (id, full_name, role, email, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            member.id,
            member.full_name,
            member.role,
            member.email,
            member.created_at,
        ],
    )?;
    Ok(())
}

/// Finds a team member by ID.
pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<TeamMember>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT * FROM team_members WHERE id = ?1",
            params![id],
            from_row,
        )
        .optional()?)
}

/// Lists every team member, oldest first.
pub fn list_all(conn: &Connection) -> Result<Vec<TeamMember>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM team_members ORDER BY created_at, id")?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Deletes a team member. Returns false when no row matched.
pub fn delete(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    let affected = conn.execute("DELETE FROM team_members WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}
