//! Order repository: CRUD operations for the `orders` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;
use crate::models::{Order, OrderStatus};

fn from_row(row: &Row<'_>) -> Result<Order, rusqlite::Error> {
    let status: String = row.get("order_status")?;
    Ok(Order {
        id: row.get("id")?,
        order_id: row.get("order_id")?,
        ref_id: row.get("ref_id")?,
        crate_no: row.get("crate_no")?,
        order_status: OrderStatus::from(status.as_str()),
        clinic_id: row.get("clinic_id")?,
        patient_name: row.get("patient_name")?,
        teeth_group: row.get("teeth_group")?,
        qa_note: row.get("qa_note")?,
        qa_id: row.get("qa_id")?,
        reason_of_reject: row.get("reson_of_reject")?,
        reason_of_rescan: row.get("reson_of_rescan")?,
        reject_note: row.get("reject_note")?,
        payment_status: row.get("payment_status")?,
        payment_amount: row.get("payment_amount")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Inserts a new order row.
pub fn insert(conn: &Connection, order: &Order) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO orders (id, order_id, ref_id, crate_no, order_status, clinic_id,
         patient_name, teeth_group, qa_note, qa_id, reson_of_reject, reson_of_rescan,
         reject_note, payment_status, payment_amount, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            order.id,
            order.order_id,
            order.ref_id,
            order.crate_no,
            order.order_status.as_str(),
            order.clinic_id,
            order.patient_name,
            order.teeth_group,
            order.qa_note,
            order.qa_id,
            order.reason_of_reject,
            order.reason_of_rescan,
            order.reject_note,
            order.payment_status,
            order.payment_amount,
            order.created_at,
            order.updated_at,
        ],
    )?;
    Ok(())
}

/// Updates an existing order row. All fields except `id` and `created_at` are overwritten.
pub fn update(conn: &Connection, order: &Order) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE orders SET order_id=?2, ref_id=?3, crate_no=?4, order_status=?5,
         clinic_id=?6, patient_name=?7, teeth_group=?8, qa_note=?9, qa_id=?10,
         reson_of_reject=?11, reson_of_rescan=?12, reject_note=?13, payment_status=?14,
         payment_amount=?15, updated_at=?16
         WHERE id=?1",
        params![
            order.id,
            order.order_id,
            order.ref_id,
            order.crate_no,
            order.order_status.as_str(),
            order.clinic_id,
            order.patient_name,
            order.teeth_group,
            order.qa_note,
            order.qa_id,
            order.reason_of_reject,
            order.reason_of_rescan,
            order.reject_note,
            order.payment_status,
            order.payment_amount,
            order.updated_at,
        ],
    )?;
    Ok(())
}

/// Finds an order by its internal ID.
pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<Order>, DatabaseError> {
    Ok(conn
        .query_row("SELECT * FROM orders WHERE id = ?1", params![id], from_row)
        .optional()?)
}

/// Finds the order holding a human-facing order number.
pub fn find_by_order_id(conn: &Connection, order_id: &str) -> Result<Option<Order>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT * FROM orders WHERE order_id = ?1",
            params![order_id],
            from_row,
        )
        .optional()?)
}

/// Finds the order holding a crate number.
pub fn find_by_crate_no(conn: &Connection, crate_no: &str) -> Result<Option<Order>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT * FROM orders WHERE crate_no = ?1",
            params![crate_no],
            from_row,
        )
        .optional()?)
}

/// Lists a clinic's orders, newest first.
pub fn list_by_clinic(conn: &Connection, clinic_id: &str) -> Result<Vec<Order>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT * FROM orders WHERE clinic_id = ?1 ORDER BY created_at DESC, id")?;
    let rows = stmt
        .query_map(params![clinic_id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn sample_order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            order_id: None,
            ref_id: None,
            crate_no: None,
            order_status: OrderStatus::Pending,
            clinic_id: "c1".to_string(),
            patient_name: Some("John Doe".to_string()),
            teeth_group: Some("crown 11".to_string()),
            qa_note: None,
            qa_id: None,
            reason_of_reject: None,
            reason_of_rescan: None,
            reject_note: None,
            payment_status: None,
            payment_amount: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            insert(conn, &sample_order("o1"))?;
            let found = find_by_id(conn, "o1")?.unwrap();
            assert_eq!(found.order_status, OrderStatus::Pending);
            assert_eq!(found.patient_name.as_deref(), Some("John Doe"));
            assert!(find_by_id(conn, "nope")?.is_none());
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_update_and_lookup_by_identifiers() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let mut order = sample_order("o1");
            insert(conn, &order)?;

            order.order_id = Some("LAB-001".to_string());
            order.crate_no = Some("CR-7".to_string());
            order.order_status = OrderStatus::Active;
            update(conn, &order)?;

            assert_eq!(find_by_order_id(conn, "LAB-001")?.unwrap().id, "o1");
            assert_eq!(find_by_crate_no(conn, "CR-7")?.unwrap().id, "o1");
            assert_eq!(
                find_by_id(conn, "o1")?.unwrap().order_status,
                OrderStatus::Active
            );
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_unique_index_rejects_duplicate_order_id() {
        let db = Database::open_in_memory().unwrap();
        let result = db.with_conn(|conn| {
            let mut a = sample_order("a");
            a.order_id = Some("LAB-001".to_string());
            insert(conn, &a)?;
            let mut b = sample_order("b");
            b.order_id = Some("LAB-001".to_string());
            insert(conn, &b)
        });
        let err = result.unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(err.unique_column(), Some("order_id"));
    }

    #[test]
    fn test_list_by_clinic() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            insert(conn, &sample_order("o1"))?;
            let mut other = sample_order("o2");
            other.clinic_id = "c2".to_string();
            insert(conn, &other)?;

            let rows = list_by_clinic(conn, "c1")?;
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].id, "o1");
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }
}
