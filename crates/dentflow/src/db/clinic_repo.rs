//! Clinic repository: CRUD operations for the `clinics` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;
use crate::models::Clinic;

fn from_row(row: &Row<'_>) -> Result<Clinic, rusqlite::Error> {
    Ok(Clinic {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        clinic_name: row.get("clinic_name")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
    })
}

/// Inserts a new clinic row.
pub fn insert(conn: &Connection, clinic: &Clinic) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clinics (id, first_name, last_name, clinic_name, email, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            clinic.id,
            clinic.first_name,
            clinic.last_name,
            clinic.clinic_name,
            clinic.email,
            clinic.created_at,
        ],
    )?;
    Ok(())
}

/// Finds a clinic by its ID.
pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<Clinic>, DatabaseError> {
    Ok(conn
        .query_row("SELECT * FROM clinics WHERE id = ?1", params![id], from_row)
        .optional()?)
}

/// Lists every clinic, oldest first.
pub fn list_all(conn: &Connection) -> Result<Vec<Clinic>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM clinics ORDER BY created_at, id")?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
