//! CLI command implementations

pub mod migrate;
pub mod serve;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use billet_core::config::{Config, StorageBackend};
use billet_core::BilletContext;

use crate::StoreArgs;

/// Get the billet directory from environment or default
pub fn get_billet_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BILLET_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".billet")
    }
}

/// Default database file inside the billet directory.
pub fn default_db_path() -> PathBuf {
    get_billet_dir().join("billet.duckdb")
}

/// Resolve the storage backend from command-line args.
pub fn resolve_backend(store: &StoreArgs) -> StorageBackend {
    if let Some(dir) = &store.flat_dir {
        StorageBackend::FlatFile { dir: dir.clone() }
    } else {
        StorageBackend::Database {
            path: store.db_path.clone().unwrap_or_else(default_db_path),
        }
    }
}

/// Build a context for the given config, creating the billet directory when
/// the default paths are in use.
pub fn get_context(config: Config) -> Result<BilletContext> {
    let billet_dir = get_billet_dir();
    std::fs::create_dir_all(&billet_dir)
        .with_context(|| format!("failed to create billet directory {billet_dir:?}"))?;

    BilletContext::new(config).context("failed to initialize billet context")
}
