//! Clinics and lab team members: the people who can appear in chats.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clinic {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub clinic_name: String,
    pub email: Option<String>,
    pub created_at: String,
}

impl Clinic {
    /// Display name used as the clinic's chat participant entry.
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.clinic_name.trim().to_string()
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClinic {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub clinic_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    /// Display name; also the member's chat participant entry.
    pub full_name: String,
    /// qa, technician, department_head, admin.
    pub role: String,
    pub email: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeamMember {
    pub full_name: String,
    pub role: String,
    #[serde(default)]
    pub email: Option<String>,
}
