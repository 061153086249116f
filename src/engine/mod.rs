//! Volunteer workflow engine.
//!
//! The engine owns the identity, opportunity and application collections and
//! is the only place they are mutated. Every successful mutation is written
//! to the [`Store`] in full; if the write fails the mutation is undone and
//! the error is returned, so memory and storage never silently diverge.
//!
//! Collections are plain vectors scanned linearly. That is fine for the
//! handful of records a single organisation keeps, and is the known scaling
//! limit of this design.

mod queue;

pub use queue::TakenApplication;

use std::collections::HashSet;

use chrono::Utc;

use crate::auth::constant_time_compare;
use crate::errors::{EngineError, ValidationError};
use crate::models::{
    Application, ApplicationDetails, ApplicationRecord, ApplicationStatus, Datastore,
    DatastoreView, Identity, IdentityKind, Opportunity, OpportunityRecord, RegisterRequest,
    RevisionInfo, Role, UserRecord,
};
use crate::store::Store;
use crate::validation::Rules;

/// The workflow engine and its three collections.
pub struct Engine {
    rules: Rules,
    store: Box<dyn Store>,
    users: Vec<Identity>,
    opportunities: Vec<Opportunity>,
    applications: Vec<Application>,
    /// Applications handed out by `take_next_pending` and not yet finalized
    /// or released, in take order.
    taken: Vec<queue::Parked>,
    revision_id: i64,
    generated_at: String,
}

impl Engine {
    /// Load the engine from a store. An empty store yields empty collections.
    pub fn open(rules: Rules, store: impl Store + 'static) -> Result<Self, EngineError> {
        let data = store.load()?.unwrap_or_default();
        let mut engine = Self {
            rules,
            store: Box::new(store),
            users: Vec::new(),
            opportunities: Vec::new(),
            applications: Vec::new(),
            taken: Vec::new(),
            revision_id: data.revision_id,
            generated_at: data.generated_at.clone(),
        };
        engine.restore(data)?;

        tracing::info!(
            users = engine.users.len(),
            opportunities = engine.opportunities.len(),
            applications = engine.applications.len(),
            "Loaded datastore at revision {}",
            engine.revision_id
        );
        Ok(engine)
    }

    fn restore(&mut self, data: Datastore) -> Result<(), EngineError> {
        let mut usernames = HashSet::new();
        for record in data.users {
            if !usernames.insert(record.username.clone()) {
                return Err(EngineError::Persistence(format!(
                    "Duplicate username in stored users: {}",
                    record.username
                )));
            }
            let role = record.role.clone();
            let identity = record.into_identity().ok_or_else(|| {
                EngineError::Persistence(format!("Unknown role in stored user: {}", role))
            })?;
            self.users.push(identity);
        }

        for record in data.opportunities {
            self.opportunities.push(Opportunity {
                id: record.id.unwrap_or_else(new_id),
                title: record.title,
                description: record.description,
                location: record.location,
                date: record.date,
                posted_by: record.posted_by,
            });
        }

        for record in data.applications {
            let status = record.parsed_status().ok_or_else(|| {
                EngineError::Persistence(format!(
                    "Unknown status in stored application: {}",
                    record.status
                ))
            })?;
            // Files written before surrogate keys link by (title, poster).
            let opportunity_id = record.opportunity_id.or_else(|| {
                self.opportunities
                    .iter()
                    .find(|o| o.matches(&record.opportunity_title, &record.posted_by))
                    .map(|o| o.id.clone())
            });
            if opportunity_id.is_none() {
                tracing::warn!(
                    applicant = %record.username,
                    posted_by = %record.posted_by,
                    "Stored application for '{}' matches no opportunity",
                    record.opportunity_title
                );
            }
            self.applications.push(Application {
                id: record.id.unwrap_or_else(new_id),
                username: record.username,
                opportunity_id,
                opportunity_title: record.opportunity_title,
                posted_by: record.posted_by,
                status,
                disability_info: record.disability_info,
                notified: record.notified,
            });
        }

        for user in &mut self.users {
            if let IdentityKind::Volunteer { applications } = &mut user.kind {
                *applications = self
                    .applications
                    .iter()
                    .filter(|a| a.username == user.username)
                    .map(|a| a.id.clone())
                    .collect();
            }
        }
        Ok(())
    }

    /// Build the persisted document from the current collections.
    ///
    /// Taken applications are written back at their former positions, still
    /// pending, so a crash mid-processing loses nothing.
    pub fn snapshot(&self) -> Datastore {
        Datastore {
            revision_id: self.revision_id,
            generated_at: self.generated_at.clone(),
            users: self.users.iter().map(UserRecord::from_identity).collect(),
            opportunities: self
                .opportunities
                .iter()
                .map(OpportunityRecord::from_opportunity)
                .collect(),
            applications: self
                .stored_applications()
                .iter()
                .map(ApplicationRecord::from_application)
                .collect(),
        }
    }

    /// Snapshot for API consumers, without passwords.
    pub fn view(&self) -> DatastoreView {
        DatastoreView {
            revision_id: self.revision_id,
            generated_at: self.generated_at.clone(),
            users: self.users.iter().map(Identity::to_public).collect(),
            opportunities: self.opportunities.clone(),
            applications: self.stored_applications(),
        }
    }

    pub fn revision_id(&self) -> i64 {
        self.revision_id
    }

    pub fn revision_info(&self) -> RevisionInfo {
        RevisionInfo {
            revision_id: self.revision_id,
            generated_at: self.generated_at.clone(),
        }
    }

    /// Write the full datastore with the next revision number.
    ///
    /// The in-memory revision only advances once the store accepted the write.
    fn commit(&mut self) -> Result<(), EngineError> {
        let mut data = self.snapshot();
        data.revision_id = self.revision_id + 1;
        data.generated_at = Utc::now().to_rfc3339();

        if let Err(err) = self.store.save(&data) {
            tracing::error!("Failed to save datastore: {}", err);
            return Err(err);
        }

        self.revision_id = data.revision_id;
        self.generated_at = data.generated_at;
        Ok(())
    }

    // ==================== IDENTITIES ====================

    pub fn users(&self) -> &[Identity] {
        &self.users
    }

    pub fn user(&self, username: &str) -> Option<&Identity> {
        self.users.iter().find(|u| u.username == username)
    }

    fn user_mut(&mut self, username: &str) -> Option<&mut Identity> {
        self.users.iter_mut().find(|u| u.username == username)
    }

    pub fn username_exists(&self, username: &str) -> bool {
        self.user(username).is_some()
    }

    /// Register a new identity.
    ///
    /// Checks run in a fixed order and stop at the first failure: username
    /// uniqueness, name, email, phone, age, password confirmation, password
    /// strength, volunteer minimum age, role.
    pub fn register(&mut self, request: &RegisterRequest) -> Result<Identity, EngineError> {
        let identity = self.validate_registration(request)?;

        self.users.push(identity.clone());
        if let Err(err) = self.commit() {
            self.users.pop();
            return Err(err);
        }

        tracing::info!(
            username = %identity.username,
            role = %identity.role(),
            "Registered identity"
        );
        Ok(identity)
    }

    fn validate_registration(&self, request: &RegisterRequest) -> Result<Identity, ValidationError> {
        let rules = &self.rules.fields;

        if self.username_exists(&request.username) {
            return Err(ValidationError::DuplicateUsername);
        }
        if !rules.valid_name(&request.name) {
            return Err(ValidationError::InvalidName);
        }
        if !rules.valid_email(&request.email) {
            return Err(ValidationError::InvalidEmail);
        }
        if !rules.valid_phone(&request.phone) {
            return Err(ValidationError::InvalidPhone);
        }
        let age = rules
            .parse_age(&request.age)
            .ok_or(ValidationError::InvalidAge)?;
        if request.password != request.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if !rules.valid_password(&request.password) {
            return Err(ValidationError::WeakPassword);
        }
        if request.role == Role::Volunteer.as_str() && age < rules.volunteer_min_age {
            return Err(ValidationError::Underage);
        }
        let role: Role = request.role.parse()?;

        Ok(Identity {
            name: request.name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            age,
            username: request.username.clone(),
            password: request.password.clone(),
            disabilities: request.disabilities.clone().unwrap_or_default(),
            kind: IdentityKind::for_role(role),
        })
    }

    /// Find the identity whose username and password both match exactly.
    pub fn login(&self, username: &str, password: &str) -> Result<&Identity, EngineError> {
        self.users
            .iter()
            .find(|u| u.username == username && constant_time_compare(&u.password, password))
            .ok_or_else(|| EngineError::NotFound("Invalid username or password".to_string()))
    }

    fn poster(&self, username: &str) -> Result<&Identity, EngineError> {
        let user = self
            .user(username)
            .ok_or_else(|| EngineError::NotFound(format!("User {} not found", username)))?;
        if !user.role().can_post() {
            return Err(EngineError::RoleMismatch {
                username: username.to_string(),
                expected: Role::Recruit,
            });
        }
        Ok(user)
    }

    // ==================== OPPORTUNITIES ====================

    pub fn opportunities(&self) -> &[Opportunity] {
        &self.opportunities
    }

    pub fn opportunities_posted_by(&self, username: &str) -> Vec<&Opportunity> {
        self.opportunities
            .iter()
            .filter(|o| o.posted_by == username)
            .collect()
    }

    /// Post an opportunity on behalf of a recruit or lister.
    pub fn post_opportunity(
        &mut self,
        title: &str,
        description: &str,
        location: &str,
        date: &str,
        posted_by: &str,
    ) -> Result<Opportunity, EngineError> {
        self.poster(posted_by)?;
        self.rules
            .opportunities
            .check(title, description, location, date)?;

        let opportunity = Opportunity {
            id: new_id(),
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            location: location.trim().to_string(),
            date: date.trim().to_string(),
            posted_by: posted_by.to_string(),
        };

        self.opportunities.push(opportunity.clone());
        if let Err(err) = self.commit() {
            self.opportunities.pop();
            return Err(err);
        }

        tracing::info!(
            id = %opportunity.id,
            posted_by = %opportunity.posted_by,
            "Posted opportunity '{}'",
            opportunity.title
        );
        Ok(opportunity)
    }

    // ==================== APPLICATIONS ====================

    /// All applications in their current iteration order.
    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    /// Apply a volunteer to the opportunity at `opportunity_index`.
    ///
    /// A volunteer may apply to a given `(title, poster)` pair only once.
    pub fn apply(
        &mut self,
        applicant: &str,
        opportunity_index: usize,
        disability_info: Option<&str>,
    ) -> Result<Application, EngineError> {
        let user = self
            .user(applicant)
            .ok_or_else(|| EngineError::NotFound(format!("User {} not found", applicant)))?;
        if !user.is_volunteer() {
            return Err(EngineError::RoleMismatch {
                username: applicant.to_string(),
                expected: Role::Volunteer,
            });
        }

        let opportunity = self
            .opportunities
            .get(opportunity_index)
            .ok_or(EngineError::OutOfRange {
                index: opportunity_index,
                len: self.opportunities.len(),
            })?;

        let duplicate = self
            .applications
            .iter()
            .chain(self.taken.iter().map(|parked| &parked.application))
            .any(|a| a.username == applicant && a.targets(&opportunity.title, &opportunity.posted_by));
        if duplicate {
            return Err(EngineError::DuplicateApplication {
                username: applicant.to_string(),
                title: opportunity.title.clone(),
            });
        }

        let application = Application {
            id: new_id(),
            username: applicant.to_string(),
            opportunity_id: Some(opportunity.id.clone()),
            opportunity_title: opportunity.title.clone(),
            posted_by: opportunity.posted_by.clone(),
            status: ApplicationStatus::Pending,
            disability_info: disability_info.unwrap_or_default().to_string(),
            notified: false,
        };

        self.applications.push(application.clone());
        if let Some(user) = self.user_mut(applicant) {
            user.push_application(application.id.clone());
        }

        if let Err(err) = self.commit() {
            self.applications.pop();
            if let Some(user) = self.user_mut(applicant) {
                user.pop_application(&application.id);
            }
            return Err(err);
        }

        tracing::info!(
            id = %application.id,
            applicant = %application.username,
            "Applied for '{}'",
            application.opportunity_title
        );
        Ok(application)
    }

    /// Applications to opportunities posted by `recruiter`, in iteration order.
    ///
    /// Indices passed to [`set_status`](Self::set_status) address this view.
    pub fn applications_for_recruiter(&self, recruiter: &str) -> Vec<&Application> {
        self.applications
            .iter()
            .filter(|a| a.posted_by == recruiter)
            .collect()
    }

    /// A volunteer's own applications, resolved from their reference list.
    ///
    /// Applications currently taken out of the queue are not listed.
    pub fn applications_for_volunteer(&self, username: &str) -> Result<Vec<&Application>, EngineError> {
        let user = self
            .user(username)
            .ok_or_else(|| EngineError::NotFound(format!("User {} not found", username)))?;

        Ok(user
            .application_ids()
            .iter()
            .filter_map(|id| self.applications.iter().find(|a| &a.id == id))
            .collect())
    }

    /// One of a volunteer's applications with its opportunity and poster contact.
    pub fn application_details(
        &self,
        username: &str,
        index: usize,
    ) -> Result<ApplicationDetails, EngineError> {
        let application = self
            .applications_for_volunteer(username)?
            .get(index)
            .map(|a| (*a).clone())
            .ok_or_else(|| EngineError::NotFound(format!("Application {} not found", index)))?;

        let opportunity = self
            .opportunities
            .iter()
            .find(|o| application.opportunity_id.as_ref() == Some(&o.id))
            .or_else(|| {
                self.opportunities
                    .iter()
                    .find(|o| o.matches(&application.opportunity_title, &application.posted_by))
            });
        let poster = self.user(&application.posted_by).map(Identity::to_public);

        Ok(ApplicationDetails {
            location: opportunity.map(|o| o.location.clone()),
            date: opportunity.map(|o| o.date.clone()),
            poster,
            application,
        })
    }

    /// Set the status of the `index`-th application in the recruiter's view.
    ///
    /// Only `Pending` applications can be decided, and only to a final status.
    pub fn set_status(
        &mut self,
        index: usize,
        new_status: ApplicationStatus,
        recruiter: &str,
    ) -> Result<Application, EngineError> {
        let position = self
            .applications
            .iter()
            .enumerate()
            .filter(|(_, a)| a.posted_by == recruiter)
            .nth(index)
            .map(|(i, _)| i)
            .ok_or_else(|| EngineError::NotFound(format!("Application {} not found", index)))?;

        let target = &mut self.applications[position];
        let previous = (target.status, target.notified);
        if !previous.0.can_transition_to(new_status) {
            return Err(EngineError::InvalidTransition {
                from: previous.0,
                to: new_status,
            });
        }
        target.status = new_status;
        target.notified = false;
        let updated = target.clone();

        if let Err(err) = self.commit() {
            let target = &mut self.applications[position];
            target.status = previous.0;
            target.notified = previous.1;
            return Err(err);
        }

        tracing::info!(
            id = %updated.id,
            recruiter = %recruiter,
            "Application by {} marked as {}",
            updated.username,
            updated.status
        );
        Ok(updated)
    }

    /// Decided applications the volunteer has not been told about yet.
    ///
    /// Returned applications are marked notified.
    pub fn take_notifications(&mut self, username: &str) -> Result<Vec<Application>, EngineError> {
        if !self.username_exists(username) {
            return Err(EngineError::NotFound(format!("User {} not found", username)));
        }

        let positions: Vec<usize> = self
            .applications
            .iter()
            .enumerate()
            .filter(|(_, a)| a.username == username && a.status.is_terminal() && !a.notified)
            .map(|(i, _)| i)
            .collect();
        if positions.is_empty() {
            return Ok(Vec::new());
        }

        for &i in &positions {
            self.applications[i].notified = true;
        }
        if let Err(err) = self.commit() {
            for &i in &positions {
                self.applications[i].notified = false;
            }
            return Err(err);
        }

        Ok(positions
            .into_iter()
            .map(|i| self.applications[i].clone())
            .collect())
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
