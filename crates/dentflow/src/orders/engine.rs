//! Order status engine.
//!
//! Any status may follow any other; three targets carry extra rules:
//!
//! - `active`: `orderId`/`crateNo` must be unused by other orders, and the
//!   order's chat is provisioned on first activation (clinic + requester) or
//!   the requester is merged into the existing chat.
//! - `rejected`: records `resonOfReject` and `qaId`.
//! - `rescan`: records `resonOfRescan` (mirrored into `rejectNote`) and `qaId`.
//!
//! Every other target applies the supplied optional fields with PATCH
//! semantics. Each change runs in one transaction, so a rejected request
//! leaves no partial write.

use rusqlite::Connection;
use uuid::Uuid;

use crate::chat::{ChatManager, ParticipantMatcher};
use crate::db::{chat_repo, clinic_repo, now_timestamp, order_repo, Database};
use crate::error::{DentflowError, Result};
use crate::models::{Chat, NewOrder, Order, OrderStatus, StatusChange};

/// What happened to the order's chat during an activation.
#[derive(Debug, Clone)]
pub struct ChatProvision {
    pub chat: Chat,
    /// True when this activation created the chat.
    pub created: bool,
    /// Participant appended by this activation, if any.
    pub added: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusOutcome {
    pub order: Order,
    pub chat: Option<ChatProvision>,
}

#[derive(Clone)]
pub struct OrderStatusEngine {
    db: Database,
    matcher: ParticipantMatcher,
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl OrderStatusEngine {
    pub fn new(db: Database, matcher: ParticipantMatcher) -> Self {
        Self { db, matcher }
    }

    /// Records an intake submission as a `pending` order.
    pub fn create_order(&self, input: NewOrder) -> Result<Order> {
        if input.clinic_id.trim().is_empty() {
            return Err(DentflowError::Invalid("clinicId is required".to_string()));
        }
        let now = now_timestamp();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            order_id: None,
            ref_id: input.ref_id,
            crate_no: None,
            order_status: OrderStatus::Pending,
            clinic_id: input.clinic_id.trim().to_string(),
            patient_name: input.patient_name,
            teeth_group: input.teeth_group,
            qa_note: None,
            qa_id: None,
            reason_of_reject: None,
            reason_of_rescan: None,
            reject_note: None,
            payment_status: input.payment_status,
            payment_amount: input.payment_amount,
            created_at: now.clone(),
            updated_at: now,
        };
        self.db
            .with_conn(|conn| order_repo::insert(conn, &order).map_err(DentflowError::from))?;
        log::info!("Order {} received from clinic {}", order.id, order.clinic_id);
        Ok(order)
    }

    pub fn get_order(&self, id: &str) -> Result<Order> {
        self.db
            .with_conn(|conn| order_repo::find_by_id(conn, id).map_err(DentflowError::from))?
            .ok_or_else(|| DentflowError::not_found("Order", id))
    }

    pub fn list_clinic_orders(&self, clinic_id: &str) -> Result<Vec<Order>> {
        self.db
            .with_conn(|conn| order_repo::list_by_clinic(conn, clinic_id).map_err(Into::into))
    }

    /// Validates and applies a status change.
    pub fn change_status(&self, id: &str, change: &StatusChange) -> Result<StatusOutcome> {
        let _span = tracing::info_span!(
            "orders.change_status",
            order = %id,
            status = %change.order_status
        )
        .entered();

        let matcher = self.matcher;
        let outcome = self.db.transaction(|tx| {
            let mut order = order_repo::find_by_id(tx, id)?
                .ok_or_else(|| DentflowError::not_found("Order", id))?;

            let chat = match change.order_status {
                OrderStatus::Active => Some(Self::activate(tx, matcher, &mut order, change)?),
                OrderStatus::Rejected => {
                    if let Some(reason) = supplied(&change.reason_of_reject) {
                        order.reason_of_reject = Some(reason.to_string());
                    }
                    Self::apply_qa_id(&mut order, change);
                    None
                }
                OrderStatus::Rescan => {
                    if let Some(reason) = supplied(&change.reason_of_rescan) {
                        order.reason_of_rescan = Some(reason.to_string());
                        order.reject_note = Some(reason.to_string());
                    }
                    Self::apply_qa_id(&mut order, change);
                    None
                }
                _ => {
                    Self::ensure_identifiers_free(tx, &order, change)?;
                    Self::apply_identifiers(&mut order, change);
                    if let Some(reason) = supplied(&change.reason_of_rescan) {
                        order.reason_of_rescan = Some(reason.to_string());
                    }
                    None
                }
            };

            order.order_status = change.order_status.clone();
            order.updated_at = now_timestamp();
            order_repo::update(tx, &order).map_err(|e| {
                DentflowError::from_order_write(
                    e,
                    order.order_id.as_deref().unwrap_or_default(),
                    order.crate_no.as_deref().unwrap_or_default(),
                )
            })?;

            Ok::<_, DentflowError>(StatusOutcome { order, chat })
        });

        match &outcome {
            Ok(done) => log::info!(
                "Order {} moved to '{}'{}",
                id,
                done.order.order_status,
                match &done.chat {
                    Some(p) if p.created => " (chat created)",
                    Some(p) if p.added.is_some() => " (participant added)",
                    _ => "",
                }
            ),
            Err(e) => log::warn!(
                "Status change of order {} to '{}' rejected: {}",
                id,
                change.order_status,
                e
            ),
        }
        outcome
    }

    fn activate(
        conn: &Connection,
        matcher: ParticipantMatcher,
        order: &mut Order,
        change: &StatusChange,
    ) -> Result<ChatProvision> {
        Self::ensure_identifiers_free(conn, order, change)?;
        let requester = supplied(&change.user_name);

        match chat_repo::find_by_order_id(conn, &order.id)? {
            None => {
                let clinic = clinic_repo::find_by_id(conn, &order.clinic_id)?.ok_or_else(|| {
                    DentflowError::DependencyMissing(format!(
                        "clinic {} of order {} not found",
                        order.clinic_id, order.id
                    ))
                })?;

                Self::apply_identifiers(order, change);
                if let Some(note) = supplied(&change.qa_note) {
                    order.qa_note = Some(note.to_string());
                }
                Self::apply_qa_id(order, change);

                let mut initial = vec![clinic.full_name()];
                initial.extend(requester.map(str::to_string));
                let chat = ChatManager::create_in(conn, order, &initial)?;
                Ok(ChatProvision {
                    chat,
                    created: true,
                    added: None,
                })
            }
            Some(mut chat) => {
                let added = match requester {
                    Some(name)
                        if ChatManager::add_participant_in(conn, matcher, &mut chat, name)? =>
                    {
                        Some(name.to_string())
                    }
                    _ => None,
                };

                // qaNote is deliberately left untouched on re-activation.
                Self::apply_identifiers(order, change);
                Self::apply_qa_id(order, change);
                Ok(ChatProvision {
                    chat,
                    created: false,
                    added,
                })
            }
        }
    }

    /// Fails with `DuplicateIdentifier` when another order holds the supplied
    /// `orderId` or `crateNo`. The UNIQUE indexes back this check up.
    fn ensure_identifiers_free(
        conn: &Connection,
        order: &Order,
        change: &StatusChange,
    ) -> Result<()> {
        if let Some(order_id) = supplied(&change.order_id) {
            if let Some(holder) = order_repo::find_by_order_id(conn, order_id)? {
                if holder.id != order.id {
                    return Err(DentflowError::DuplicateIdentifier {
                        field: "orderId",
                        value: order_id.to_string(),
                    });
                }
            }
        }
        if let Some(crate_no) = supplied(&change.crate_no) {
            if let Some(holder) = order_repo::find_by_crate_no(conn, crate_no)? {
                if holder.id != order.id {
                    return Err(DentflowError::DuplicateIdentifier {
                        field: "crateNo",
                        value: crate_no.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn apply_identifiers(order: &mut Order, change: &StatusChange) {
        if let Some(order_id) = supplied(&change.order_id) {
            order.order_id = Some(order_id.to_string());
        }
        if let Some(crate_no) = supplied(&change.crate_no) {
            order.crate_no = Some(crate_no.to_string());
        }
    }

    fn apply_qa_id(order: &mut Order, change: &StatusChange) {
        if let Some(qa_id) = supplied(&change.qa_id) {
            order.qa_id = Some(qa_id.to_string());
        }
    }
}
