//! Builders for intake records.

#![allow(dead_code)]

use dentflow::models::{NewClinic, NewOrder, NewTeamMember};

/// Builder for `NewClinic`.
pub struct ClinicBuilder {
    inner: NewClinic,
}

impl ClinicBuilder {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            inner: NewClinic {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                clinic_name: format!("{} {} Dental", first_name, last_name),
                email: None,
            },
        }
    }

    pub fn email(mut self, email: &str) -> Self {
        self.inner.email = Some(email.to_string());
        self
    }

    pub fn build(self) -> NewClinic {
        self.inner
    }
}

/// Builder for `NewOrder`.
pub struct OrderBuilder {
    inner: NewOrder,
}

impl OrderBuilder {
    pub fn for_clinic(clinic_id: &str) -> Self {
        Self {
            inner: NewOrder {
                clinic_id: clinic_id.to_string(),
                patient_name: Some("Jane Roe".to_string()),
                teeth_group: Some("crown 11-21".to_string()),
                ..Default::default()
            },
        }
    }

    pub fn ref_id(mut self, ref_id: &str) -> Self {
        self.inner.ref_id = Some(ref_id.to_string());
        self
    }

    pub fn payment(mut self, status: &str, amount: f64) -> Self {
        self.inner.payment_status = Some(status.to_string());
        self.inner.payment_amount = Some(amount);
        self
    }

    pub fn build(self) -> NewOrder {
        self.inner
    }
}

pub fn team_member(full_name: &str, role: &str) -> NewTeamMember {
    NewTeamMember {
        full_name: full_name.to_string(),
        role: role.to_string(),
        email: None,
    }
}
