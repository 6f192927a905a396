//! Service layer - business logic orchestration

mod expiry;
pub mod ledger;
pub mod migration;
mod notes;

pub use expiry::{ExpiryService, SWEEP_INTERVAL};
pub use ledger::Ledger;
pub use migration::{MigrationError, MigrationReport, MigrationService};
pub use notes::NoteService;
