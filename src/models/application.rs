//! Application model and its status state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{OpportunityId, PublicIdentity};

/// Stable surrogate key of an application.
pub type ApplicationId = String;

/// Review status of an application.
///
/// `Pending` is the only non-terminal state; `Accepted` and `Rejected` are final.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApplicationStatus {
    Pending,
    #[serde(alias = "Approved")]
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }

    /// Whether a status update from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        *self == ApplicationStatus::Pending && next.is_terminal()
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ApplicationStatus::Pending),
            "Accepted" | "Approved" => Ok(ApplicationStatus::Accepted),
            "Rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A status string that names no [`ApplicationStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl std::fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown application status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

/// A volunteer's request to take part in an opportunity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    /// Applicant username.
    pub username: String,
    pub opportunity_id: Option<OpportunityId>,
    pub opportunity_title: String,
    /// Username of the opportunity poster, copied at apply time.
    pub posted_by: String,
    pub status: ApplicationStatus,
    /// Disability disclosure given when applying.
    pub disability_info: String,
    /// Set once the applicant has been told about a final decision.
    pub notified: bool,
}

impl Application {
    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }

    /// Whether this application targets the `(title, poster)` pair.
    pub fn targets(&self, title: &str, posted_by: &str) -> bool {
        self.opportunity_title == title && self.posted_by == posted_by
    }
}

/// A volunteer's application joined with its opportunity and poster contact.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetails {
    pub application: Application,
    pub location: Option<String>,
    pub date: Option<String>,
    pub poster: Option<PublicIdentity>,
}

/// Request body for applying to an opportunity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub username: String,
    #[serde(default)]
    pub disability_info: Option<String>,
}

/// Request body for an indexed status update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    pub status: ApplicationStatus,
}

/// Request body for processing the next pending application.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessNextRequest {
    pub status: ApplicationStatus,
}
