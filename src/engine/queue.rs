//! First-in-first-out processing of pending applications.
//!
//! Processing is a two-step protocol. [`Engine::take_next_pending`] moves
//! the oldest pending application of a recruiter out of the ordered
//! collection into the engine's taken list and hands the caller a
//! [`TakenApplication`] ticket; [`Engine::finalize_status`] records the
//! decision and appends the application at the tail, or
//! [`Engine::release_pending`] puts it back untouched.
//!
//! Taken applications stay owned by the engine. They still count for
//! duplicate checks and are still written by every commit, at their former
//! position and still pending. A ticket that is dropped leaves its
//! application parked until the engine is reopened, when it loads as an
//! ordinary pending application again.
//!
//! Finalized applications move to the end of the iteration order, so indices
//! into a recruiter's view shift after each processed application.

use super::Engine;
use crate::errors::EngineError;
use crate::models::{Application, ApplicationId, ApplicationStatus};

/// An application out of the ordered collection, remembered with the
/// position it was taken from.
#[derive(Debug, Clone)]
pub(super) struct Parked {
    pub(super) application: Application,
    pub(super) position: usize,
}

/// Ticket for an application taken out of the queue.
///
/// Consumed by [`Engine::finalize_status`] or [`Engine::release_pending`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a taken application must be finalized or released"]
pub struct TakenApplication {
    application: Application,
}

impl TakenApplication {
    /// The application as it was when taken.
    pub fn application(&self) -> &Application {
        &self.application
    }
}

impl Engine {
    fn next_pending_position(&self, recruiter: &str) -> Option<usize> {
        self.applications
            .iter()
            .position(|a| a.posted_by == recruiter && a.is_pending())
    }

    /// The application [`take_next_pending`](Self::take_next_pending) would return.
    pub fn peek_next_pending(&self, recruiter: &str) -> Option<&Application> {
        self.next_pending_position(recruiter)
            .map(|i| &self.applications[i])
    }

    /// Take the oldest pending application for `recruiter` out of the queue.
    ///
    /// Nothing is persisted until the application is finalized.
    pub fn take_next_pending(&mut self, recruiter: &str) -> Option<TakenApplication> {
        let position = self.next_pending_position(recruiter)?;
        let application = self.applications.remove(position);
        tracing::debug!(
            id = %application.id,
            recruiter = %recruiter,
            "Dequeued pending application"
        );

        let taken = TakenApplication {
            application: application.clone(),
        };
        self.taken.push(Parked {
            application,
            position,
        });
        Some(taken)
    }

    /// Put a taken application back where it was, still pending.
    pub fn release_pending(&mut self, taken: TakenApplication) -> Result<(), EngineError> {
        let slot = self.taken_slot(&taken.application.id)?;
        let parked = self.taken.remove(slot);
        self.unpark(parked);
        Ok(())
    }

    /// Record the decision for a taken application and append it at the tail.
    ///
    /// A non-final status or a failed save returns the application to its
    /// original position, still pending.
    pub fn finalize_status(
        &mut self,
        taken: TakenApplication,
        status: ApplicationStatus,
    ) -> Result<Application, EngineError> {
        let slot = self.taken_slot(&taken.application.id)?;
        let parked = self.taken.remove(slot);

        let from = parked.application.status;
        if !from.can_transition_to(status) {
            self.unpark(parked);
            return Err(EngineError::InvalidTransition { from, to: status });
        }

        let mut application = parked.application.clone();
        application.status = status;
        application.notified = false;
        self.applications.push(application.clone());

        if let Err(err) = self.commit() {
            self.applications.pop();
            self.unpark(parked);
            return Err(err);
        }

        tracing::info!(
            id = %application.id,
            "Processed application by {} as {}",
            application.username,
            application.status
        );
        Ok(application)
    }

    /// Take the next pending application and decide it in one step.
    ///
    /// Returns `Ok(None)` when the recruiter has nothing pending.
    pub fn process_next_pending(
        &mut self,
        recruiter: &str,
        status: ApplicationStatus,
    ) -> Result<Option<Application>, EngineError> {
        match self.take_next_pending(recruiter) {
            Some(taken) => self.finalize_status(taken, status).map(Some),
            None => Ok(None),
        }
    }

    /// The ordered collection with every taken application back in place.
    pub(super) fn stored_applications(&self) -> Vec<Application> {
        let mut applications = self.applications.clone();
        for parked in self.taken.iter().rev() {
            let position = parked.position.min(applications.len());
            applications.insert(position, parked.application.clone());
        }
        applications
    }

    fn taken_slot(&self, id: &ApplicationId) -> Result<usize, EngineError> {
        self.taken
            .iter()
            .position(|parked| &parked.application.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("Application {} is not taken", id)))
    }

    fn unpark(&mut self, parked: Parked) {
        let position = parked.position.min(self.applications.len());
        self.applications.insert(position, parked.application);
    }
}
