//! Opportunity model.

use serde::{Deserialize, Serialize};

/// Stable surrogate key of an opportunity.
pub type OpportunityId = String;

/// A volunteering engagement posted by a recruit or lister.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: OpportunityId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: String,
    /// Username of the poster.
    pub posted_by: String,
}

impl Opportunity {
    /// Whether this opportunity is the one addressed by a `(title, poster)` pair.
    pub fn matches(&self, title: &str, posted_by: &str) -> bool {
        self.title == title && self.posted_by == posted_by
    }
}

/// Request body for posting a new opportunity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostOpportunityRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: String,
    pub posted_by: String,
}
