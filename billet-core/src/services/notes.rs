//! Note service - CRUD orchestration over the configured store

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::domain::result::Result;
use crate::domain::{validate_note_name, SetOutcome};
use crate::ports::NoteStore;

/// Thin orchestration over the store: name validation, delegation, and
/// mutation logging. Handlers and CLI commands go through this, never the
/// store directly.
#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        validate_note_name(name)?;
        self.store.get(name)
    }

    pub fn set(&self, name: &str, body: &[u8], clobber: bool) -> Result<SetOutcome> {
        validate_note_name(name)?;
        let outcome = self.store.set(name, body, clobber)?;
        match outcome {
            SetOutcome::Created => info!(note = name, "new note"),
            SetOutcome::Updated => info!(note = name, "updated note"),
            SetOutcome::Conflict => {}
        }
        Ok(outcome)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        validate_note_name(name)?;
        self.store.delete(name)?;
        info!(note = name, "deleted note");
        Ok(())
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<String>> {
        self.store.recent(limit)
    }

    pub fn delete_older_than(&self, age: Duration) -> Result<usize> {
        self.store.delete_older_than(age)
    }
}
