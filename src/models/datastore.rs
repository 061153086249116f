//! Persisted datastore record and the API snapshot view.
//!
//! The record keeps the field names of the original `data.json` layout
//! (`users`, `opportunities`, `applications`, snake_case fields, `role` and
//! `status` as strings) so existing files load unchanged. Surrogate keys and
//! the extra application fields are optional on input.

use serde::{Deserialize, Serialize};

use super::{
    Application, ApplicationStatus, Identity, IdentityKind, Opportunity, PublicIdentity, Role,
};

/// The root persisted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Datastore {
    #[serde(default)]
    pub revision_id: i64,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub opportunities: Vec<OpportunityRecord>,
    #[serde(default)]
    pub applications: Vec<ApplicationRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: u32,
    pub username: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub disabilities: String,
}

impl UserRecord {
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            name: identity.name.clone(),
            email: identity.email.clone(),
            phone: identity.phone.clone(),
            age: identity.age,
            username: identity.username.clone(),
            password: identity.password.clone(),
            role: identity.role().as_str().to_string(),
            disabilities: identity.disabilities.clone(),
        }
    }

    /// Rebuild the identity. Volunteer application lists start empty and are
    /// filled from the application collection by the caller.
    pub fn into_identity(self) -> Option<Identity> {
        let role: Role = self.role.parse().ok()?;
        Some(Identity {
            name: self.name,
            email: self.email,
            phone: self.phone,
            age: self.age,
            username: self.username,
            password: self.password,
            disabilities: self.disabilities,
            kind: IdentityKind::for_role(role),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpportunityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: String,
    pub posted_by: String,
}

impl OpportunityRecord {
    pub fn from_opportunity(opportunity: &Opportunity) -> Self {
        Self {
            id: Some(opportunity.id.clone()),
            title: opportunity.title.clone(),
            description: opportunity.description.clone(),
            location: opportunity.location.clone(),
            date: opportunity.date.clone(),
            posted_by: opportunity.posted_by.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opportunity_id: Option<String>,
    pub opportunity_title: String,
    pub posted_by: String,
    pub status: String,
    #[serde(default)]
    pub disability_info: String,
    #[serde(default)]
    pub notified: bool,
}

impl ApplicationRecord {
    pub fn from_application(application: &Application) -> Self {
        Self {
            id: Some(application.id.clone()),
            username: application.username.clone(),
            opportunity_id: application.opportunity_id.clone(),
            opportunity_title: application.opportunity_title.clone(),
            posted_by: application.posted_by.clone(),
            status: application.status.as_str().to_string(),
            disability_info: application.disability_info.clone(),
            notified: application.notified,
        }
    }

    pub fn parsed_status(&self) -> Option<ApplicationStatus> {
        self.status.parse().ok()
    }
}

/// Full snapshot as served by the API, with passwords stripped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatastoreView {
    pub revision_id: i64,
    pub generated_at: String,
    pub users: Vec<PublicIdentity>,
    pub opportunities: Vec<Opportunity>,
    pub applications: Vec<Application>,
}

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
