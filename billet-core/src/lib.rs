//! Billet Core - storage and migration logic for the Billet note service
//!
//! This crate implements the core logic following hexagonal architecture:
//!
//! - **domain**: pure entities (MigrationId, note validation, errors)
//! - **ports**: trait definitions for external dependencies (NoteStore, ScriptSource)
//! - **services**: the migration engine, ledger, note CRUD, expiry sweep
//! - **adapters**: concrete implementations (DuckDB, flat files, script sources)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;

use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::{DuckDbStore, EmbeddedScripts, FlatFileStore};
use config::{Config, StorageBackend};
use services::{ExpiryService, NoteService};

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{MigrationId, SetOutcome};
pub use ports::{NoteStore, ScriptFile, ScriptSource};
pub use services::{MigrationError, MigrationReport};

/// Main context for Billet operations
///
/// Primary entry point: picks the configured store variant, brings its
/// schema up to date, and wires the services. The migration run happens
/// here, before any request traffic exists.
pub struct BilletContext {
    pub config: Config,
    pub store: Arc<dyn NoteStore>,
    pub note_service: NoteService,
}

impl BilletContext {
    pub fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn NoteStore> = match &config.storage {
            StorageBackend::Database { path } => {
                let store = DuckDbStore::open(path)
                    .with_context(|| format!("opening database {}", path.display()))?;
                store
                    .run_migrations(&EmbeddedScripts::baseline())
                    .context("running migrations")?;
                Arc::new(store)
            }
            StorageBackend::FlatFile { dir } => {
                let store = FlatFileStore::open(dir)
                    .with_context(|| format!("opening note directory {}", dir.display()))?;
                Arc::new(store)
            }
        };

        let note_service = NoteService::new(Arc::clone(&store));

        Ok(Self {
            config,
            store,
            note_service,
        })
    }

    /// Expiry sweeper for the configured age, or `None` when expiry is
    /// disabled.
    pub fn expiry_service(&self) -> Option<ExpiryService> {
        self.config
            .note_expiry
            .map(|age| ExpiryService::new(Arc::clone(&self.store), age))
    }
}
