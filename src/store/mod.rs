//! Persistence collaborator for the workflow engine.
//!
//! The engine always writes the full datastore; there are no delta writes.

mod json_file;

pub use json_file::*;

use std::sync::Mutex;

use crate::errors::EngineError;
use crate::models::Datastore;

/// Backing storage for the three collections.
pub trait Store: Send + Sync {
    /// Load the stored document. `Ok(None)` means nothing has been saved yet.
    fn load(&self) -> Result<Option<Datastore>, EngineError>;

    /// Replace the stored document.
    fn save(&self, data: &Datastore) -> Result<(), EngineError>;
}

/// Store that keeps the last saved document in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Option<Datastore>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document.
    pub fn with_data(data: Datastore) -> Self {
        Self {
            data: Mutex::new(Some(data)),
        }
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<Option<Datastore>, EngineError> {
        let guard = self
            .data
            .lock()
            .map_err(|_| EngineError::Persistence("memory store lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, data: &Datastore) -> Result<(), EngineError> {
        let mut guard = self
            .data
            .lock()
            .map_err(|_| EngineError::Persistence("memory store lock poisoned".to_string()))?;
        *guard = Some(data.clone());
        Ok(())
    }
}
