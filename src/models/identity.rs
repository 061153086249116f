//! Identity model: registered volunteers, recruits and listers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ApplicationId;
use crate::errors::ValidationError;

/// Role tag of a registered identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Volunteer,
    Recruit,
    Lister,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Volunteer => "Volunteer",
            Role::Recruit => "Recruit",
            Role::Lister => "Lister",
        }
    }

    /// Whether identities with this role may post opportunities and review applications.
    pub fn can_post(&self) -> bool {
        matches!(self, Role::Recruit | Role::Lister)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Volunteer" => Ok(Role::Volunteer),
            "Recruit" => Ok(Role::Recruit),
            "Lister" => Ok(Role::Lister),
            _ => Err(ValidationError::InvalidRole),
        }
    }
}

/// Per-role payload of an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityKind {
    /// Holds references into the global application collection, in apply order.
    Volunteer { applications: Vec<ApplicationId> },
    Recruit,
    Lister,
}

impl IdentityKind {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Volunteer => IdentityKind::Volunteer {
                applications: Vec::new(),
            },
            Role::Recruit => IdentityKind::Recruit,
            Role::Lister => IdentityKind::Lister,
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: u32,
    pub username: String,
    pub password: String,
    /// Free-text accessibility needs, empty when none were given.
    pub disabilities: String,
    pub kind: IdentityKind,
}

impl Identity {
    pub fn role(&self) -> Role {
        match self.kind {
            IdentityKind::Volunteer { .. } => Role::Volunteer,
            IdentityKind::Recruit => Role::Recruit,
            IdentityKind::Lister => Role::Lister,
        }
    }

    pub fn is_volunteer(&self) -> bool {
        matches!(self.kind, IdentityKind::Volunteer { .. })
    }

    /// Application references owned by a volunteer; empty for other roles.
    pub fn application_ids(&self) -> &[ApplicationId] {
        match &self.kind {
            IdentityKind::Volunteer { applications } => applications,
            _ => &[],
        }
    }

    pub(crate) fn push_application(&mut self, id: ApplicationId) {
        if let IdentityKind::Volunteer { applications } = &mut self.kind {
            applications.push(id);
        }
    }

    pub(crate) fn pop_application(&mut self, id: &ApplicationId) {
        if let IdentityKind::Volunteer { applications } = &mut self.kind {
            if applications.last() == Some(id) {
                applications.pop();
            }
        }
    }

    pub fn to_public(&self) -> PublicIdentity {
        PublicIdentity {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            age: self.age,
            username: self.username.clone(),
            role: self.role(),
            disabilities: self.disabilities.clone(),
        }
    }
}

/// Identity as exposed over the API, without the password.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicIdentity {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: u32,
    pub username: String,
    pub role: Role,
    pub disabilities: String,
}

/// Request body for registering a new identity.
///
/// Every field arrives as already-collected text; `age` and `role` are parsed
/// during validation so that each failure maps to its own error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub role: String,
    #[serde(default)]
    pub disabilities: Option<String>,
}

/// Request body for logging in.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_strings() {
        for role in [Role::Volunteer, Role::Recruit, Role::Lister] {
            assert_eq!(role.as_str().parse(), Ok(role));
        }
        assert_eq!("volunteer".parse::<Role>(), Err(ValidationError::InvalidRole));
        assert_eq!("Admin".parse::<Role>(), Err(ValidationError::InvalidRole));
    }

    #[test]
    fn test_only_posters_can_post() {
        assert!(!Role::Volunteer.can_post());
        assert!(Role::Recruit.can_post());
        assert!(Role::Lister.can_post());
    }

    #[test]
    fn test_application_ids_only_for_volunteers() {
        let mut recruit = Identity {
            name: "Rita".to_string(),
            email: "rita@example.org".to_string(),
            phone: "123".to_string(),
            age: 40,
            username: "rita".to_string(),
            password: "Secret1".to_string(),
            disabilities: String::new(),
            kind: IdentityKind::Recruit,
        };
        recruit.push_application("a1".to_string());
        assert!(recruit.application_ids().is_empty());

        let mut volunteer = Identity {
            kind: IdentityKind::for_role(Role::Volunteer),
            ..recruit
        };
        volunteer.push_application("a1".to_string());
        assert_eq!(volunteer.application_ids(), ["a1".to_string()]);
        volunteer.pop_application(&"a1".to_string());
        assert!(volunteer.application_ids().is_empty());
    }

    #[test]
    fn test_public_identity_hides_password() {
        let identity = Identity {
            name: "Vic".to_string(),
            email: "vic@example.com".to_string(),
            phone: "+4412".to_string(),
            age: 22,
            username: "vic".to_string(),
            password: "Hidden9".to_string(),
            disabilities: "wheelchair".to_string(),
            kind: IdentityKind::for_role(Role::Volunteer),
        };
        let json = serde_json::to_value(identity.to_public()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "Volunteer");
    }
}
