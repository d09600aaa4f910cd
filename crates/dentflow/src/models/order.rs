//! Orders and their status vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Status of an order in the lab workflow.
///
/// The engine accepts any target status, so values this build does not name
/// are carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Active,
    Rejected,
    Rescan,
    InProgress,
    QaPending,
    TrialReady,
    Completed,
    Dispatched,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Active => "active",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Rescan => "rescan",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::QaPending => "qa_pending",
            OrderStatus::TrialReady => "trial_ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Dispatched => "dispatched",
            OrderStatus::Other(other) => other,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "pending" => OrderStatus::Pending,
            "active" => OrderStatus::Active,
            "rejected" => OrderStatus::Rejected,
            "rescan" => OrderStatus::Rescan,
            "in_progress" => OrderStatus::InProgress,
            "qa_pending" => OrderStatus::QaPending,
            "trial_ready" => OrderStatus::TrialReady,
            "completed" => OrderStatus::Completed,
            "dispatched" => OrderStatus::Dispatched,
            _ => OrderStatus::Other(s.trim().to_string()),
        })
    }
}

impl From<&str> for OrderStatus {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(OrderStatus::from(raw.as_str()))
    }
}

/// A prosthetic order as stored by the lab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Internal, stable identifier.
    pub id: String,
    /// Human-facing order number, unique once assigned.
    pub order_id: Option<String>,
    pub ref_id: Option<String>,
    /// Physical crate number, unique once assigned.
    pub crate_no: Option<String>,
    pub order_status: OrderStatus,
    pub clinic_id: String,
    pub patient_name: Option<String>,
    pub teeth_group: Option<String>,
    pub qa_note: Option<String>,
    pub qa_id: Option<String>,
    #[serde(rename = "resonOfReject")]
    pub reason_of_reject: Option<String>,
    #[serde(rename = "resonOfRescan")]
    pub reason_of_rescan: Option<String>,
    pub reject_note: Option<String>,
    pub payment_status: Option<String>,
    pub payment_amount: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Intake submission that turns a draft into an order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub clinic_id: String,
    #[serde(default)]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub teeth_group: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub payment_amount: Option<f64>,
}

/// A requested status change, as received on `PATCH /orders/{id}/status`.
///
/// Wire names keep the lab frontend's spelling (`resonOfReject`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub order_status: OrderStatus,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub crate_no: Option<String>,
    #[serde(default)]
    pub qa_note: Option<String>,
    #[serde(default)]
    pub qa_id: Option<String>,
    #[serde(default, rename = "resonOfReject")]
    pub reason_of_reject: Option<String>,
    #[serde(default, rename = "resonOfRescan")]
    pub reason_of_rescan: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
}

impl StatusChange {
    pub fn to(status: OrderStatus) -> Self {
        Self {
            order_status: status,
            order_id: None,
            crate_no: None,
            qa_note: None,
            qa_id: None,
            reason_of_reject: None,
            reason_of_rescan: None,
            user_name: None,
        }
    }

    pub fn order_id(mut self, order_id: &str) -> Self {
        self.order_id = Some(order_id.to_string());
        self
    }

    pub fn crate_no(mut self, crate_no: &str) -> Self {
        self.crate_no = Some(crate_no.to_string());
        self
    }

    pub fn qa(mut self, qa_id: &str) -> Self {
        self.qa_id = Some(qa_id.to_string());
        self
    }

    pub fn qa_note(mut self, note: &str) -> Self {
        self.qa_note = Some(note.to_string());
        self
    }

    pub fn user(mut self, user_name: &str) -> Self {
        self.user_name = Some(user_name.to_string());
        self
    }

    pub fn reject_reason(mut self, reason: &str) -> Self {
        self.reason_of_reject = Some(reason.to_string());
        self
    }

    pub fn rescan_reason(mut self, reason: &str) -> Self {
        self.reason_of_rescan = Some(reason.to_string());
        self
    }
}
