//! Clinics and lab team members.
//!
//! Together they are the "known users" the realtime layer pushes unread
//! counts to.

use uuid::Uuid;

use crate::chat::normalize;
use crate::db::{clinic_repo, now_timestamp, team_repo, Database};
use crate::error::{DentflowError, Result};
use crate::models::{Clinic, NewClinic, NewTeamMember, TeamMember};

#[derive(Clone)]
pub struct Directory {
    db: Database,
}

impl Directory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create_clinic(&self, input: NewClinic) -> Result<Clinic> {
        let clinic = Clinic {
            id: Uuid::new_v4().to_string(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            clinic_name: input.clinic_name.trim().to_string(),
            email: input.email,
            created_at: now_timestamp(),
        };
        if clinic.full_name().is_empty() {
            return Err(DentflowError::Invalid(
                "clinic needs a contact name or clinic name".to_string(),
            ));
        }
        self.db
            .with_conn(|conn| clinic_repo::insert(conn, &clinic).map_err(DentflowError::from))?;
        log::info!("Registered clinic {} ({})", clinic.id, clinic.full_name());
        Ok(clinic)
    }

    pub fn get_clinic(&self, id: &str) -> Result<Clinic> {
        self.db
            .with_conn(|conn| clinic_repo::find_by_id(conn, id).map_err(DentflowError::from))?
            .ok_or_else(|| DentflowError::not_found("Clinic", id))
    }

    pub fn create_team_member(&self, input: NewTeamMember) -> Result<TeamMember> {
        let full_name = input.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(DentflowError::Invalid("fullName is required".to_string()));
        }
        let member = TeamMember {
            id: Uuid::new_v4().to_string(),
            full_name,
            role: input.role.trim().to_string(),
            email: input.email,
            created_at: now_timestamp(),
        };
        self.db
            .with_conn(|conn| team_repo::insert(conn, &member).map_err(DentflowError::from))?;
        log::info!("Added team member {} ({})", member.id, member.full_name);
        Ok(member)
    }

    pub fn get_team_member(&self, id: &str) -> Result<TeamMember> {
        self.db
            .with_conn(|conn| team_repo::find_by_id(conn, id).map_err(DentflowError::from))?
            .ok_or_else(|| DentflowError::not_found("TeamMember", id))
    }

    pub fn list_team_members(&self) -> Result<Vec<TeamMember>> {
        self.db
            .with_conn(|conn| team_repo::list_all(conn).map_err(Into::into))
    }

    pub fn delete_team_member(&self, id: &str) -> Result<()> {
        let deleted = self
            .db
            .with_conn(|conn| team_repo::delete(conn, id).map_err(DentflowError::from))?;
        if !deleted {
            return Err(DentflowError::not_found("TeamMember", id));
        }
        Ok(())
    }

    /// Display names of every team member and clinic, without duplicates.
    pub fn known_users(&self) -> Result<Vec<String>> {
        let (members, clinics) = self.db.with_conn(|conn| {
            Ok::<_, DentflowError>((team_repo::list_all(conn)?, clinic_repo::list_all(conn)?))
        })?;
        let names: Vec<String> = members
            .into_iter()
            .map(|m| m.full_name)
            .chain(clinics.iter().map(Clinic::full_name))
            .collect();
        Ok(normalize(&names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> Directory {
        Directory::new(Database::open_in_memory().unwrap())
    }

    fn member(name: &str) -> NewTeamMember {
        NewTeamMember {
            full_name: name.to_string(),
            role: "qa".to_string(),
            email: None,
        }
    }

    #[test]
    fn test_known_users_merges_clinics_and_team() {
        let dir = directory();
        dir.create_team_member(member("Dr. Smith")).unwrap();
        dir.create_team_member(member("Dr. Jones")).unwrap();
        dir.create_clinic(NewClinic {
            first_name: "Clinic".to_string(),
            last_name: "A".to_string(),
            ..Default::default()
        })
        .unwrap();
        // Same display name as an existing member.
        dir.create_clinic(NewClinic {
            clinic_name: "Dr. Smith".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            dir.known_users().unwrap(),
            vec!["Dr. Smith", "Dr. Jones", "Clinic A"]
        );
    }

    #[test]
    fn test_team_member_lifecycle() {
        let dir = directory();
        let m = dir.create_team_member(member("  Dr. Smith ")).unwrap();
        assert_eq!(m.full_name, "Dr. Smith");
        assert_eq!(dir.get_team_member(&m.id).unwrap(), m);

        dir.delete_team_member(&m.id).unwrap();
        assert!(matches!(
            dir.delete_team_member(&m.id),
            Err(DentflowError::NotFound { entity: "TeamMember", .. })
        ));
    }

    #[test]
    fn test_rejects_nameless_records() {
        let dir = directory();
        assert!(matches!(
            dir.create_team_member(member(" ")),
            Err(DentflowError::Invalid(_))
        ));
        assert!(matches!(
            dir.create_clinic(NewClinic::default()),
            Err(DentflowError::Invalid(_))
        ));
    }
}
