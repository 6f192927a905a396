//! Core domain entities
//!
//! Pure data structures with validation logic - no I/O or external
//! dependencies beyond parsing.

mod migration;
mod note;
pub mod result;

pub use migration::MigrationId;
pub use note::{validate_note_name, SetOutcome};
