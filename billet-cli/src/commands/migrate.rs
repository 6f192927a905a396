//! Migrate command - apply pending schema migrations and exit

use std::path::PathBuf;

use anyhow::{Context, Result};

use billet_core::adapters::{DirScriptSource, DuckDbStore, EmbeddedScripts};
use billet_core::ScriptSource;

use crate::commands::{default_db_path, get_billet_dir};
use crate::output;

pub fn run(db_path: Option<PathBuf>, schema_dir: Option<PathBuf>) -> Result<()> {
    let db_path = db_path.unwrap_or_else(default_db_path);
    std::fs::create_dir_all(get_billet_dir())?;

    let store = DuckDbStore::open(&db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;

    // One source per store: either the embedded baseline or an
    // operator-managed directory, never a mix.
    let source: Box<dyn ScriptSource> = match schema_dir {
        Some(dir) => Box::new(DirScriptSource::new(dir)),
        None => Box::new(EmbeddedScripts::baseline()),
    };

    let report = store
        .run_migrations(source.as_ref())
        .context("migration run failed")?;

    if report.applied.is_empty() {
        output::success(&format!(
            "{} is up to date ({} migrations applied previously)",
            db_path.display(),
            report.already_applied
        ));
    } else {
        for id in &report.applied {
            println!("applied {id}");
        }
        output::success(&format!("applied {} migrations", report.applied.len()));
    }
    Ok(())
}
