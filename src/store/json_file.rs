//! JSON file store.
//!
//! The whole datastore lives in one pretty-printed JSON document. Writes go to
//! a sibling temp file first and are renamed into place.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::Store;
use crate::errors::EngineError;
use crate::models::Datastore;

/// File-backed store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Store for JsonFileStore {
    fn load(&self) -> Result<Option<Datastore>, EngineError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No data file at {:?}, starting empty", self.path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let data = serde_json::from_str(&content).map_err(|e| {
            EngineError::Persistence(format!("Invalid JSON in {}: {}", self.path.display(), e))
        })?;
        Ok(Some(data))
    }

    fn save(&self, data: &Datastore) -> Result<(), EngineError> {
        let content = serde_json::to_string_pretty(data)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("json.tmp");
        if let Err(e) = write_then_rename(&temp_path, &self.path, &content) {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove {:?}: {}", temp_path, cleanup);
                }
            }
            return Err(e.into());
        }
        Ok(())
    }
}

fn write_then_rename(temp_path: &Path, path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(temp_path)?;
    file.write_all(content.as_bytes())?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    drop(file);

    fs::rename(temp_path, path)
}
