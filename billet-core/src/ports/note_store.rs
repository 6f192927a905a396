//! Note store port - storage abstraction
//!
//! The backend (database or flat files) is chosen once at startup; callers
//! only ever see this trait. Every operation is independently transactional
//! and safe to call from concurrent request handlers.

use std::time::Duration;

use crate::domain::result::Result;
use crate::domain::SetOutcome;

/// Storage abstraction for notes.
pub trait NoteStore: Send + Sync {
    /// Fetch a note body by name, touching its last-viewed time on success.
    /// `None` means the note does not exist - not an error.
    fn get(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Store a note. When `clobber` is false and the name already exists,
    /// returns `SetOutcome::Conflict` and leaves the stored body unchanged.
    fn set(&self, name: &str, body: &[u8], clobber: bool) -> Result<SetOutcome>;

    /// Delete a note. Succeeds even if the name does not exist.
    fn delete(&self, name: &str) -> Result<()>;

    /// Names of the most recently created notes, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<String>>;

    /// Delete every note whose last-viewed time is older than `age`.
    /// Returns the number of notes removed.
    fn delete_older_than(&self, age: Duration) -> Result<usize>;
}
