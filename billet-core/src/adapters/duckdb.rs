//! DuckDB note store

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use duckdb::{params, Config, Connection};
use tracing::debug;

use crate::domain::result::Result as CoreResult;
use crate::domain::SetOutcome;
use crate::ports::{NoteStore, ScriptSource};
use crate::services::migration::{MigrationError, MigrationReport, MigrationService};

/// Maximum number of retries when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// Timestamps are computed here and bound as parameters; the database never
/// calls its own clock (no ICU, and every comparison stays in UTC).
fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Database-backed note store.
///
/// Owns the only connection to the database file; note operations take the
/// lock per call, a migration run holds it for the whole run.
pub struct DuckDbStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbStore {
    /// Open (creating if needed) the database file.
    ///
    /// Includes retry logic with exponential backoff for file locking
    /// errors, which can occur when another process still holds the file
    /// (e.g. a server shutting down while a migrate command starts).
    pub fn open(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        debug!(
                            "database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("failed to open database after {} retries", MAX_RETRIES)))
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Disable extension autoloading to avoid macOS code signing issues
        // (cached extensions in ~/.duckdb/extensions may have different Team IDs)
        let config = Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Run migrations from `source`, holding the connection exclusively for
    /// the whole run. Call before admitting request traffic.
    pub fn run_migrations(
        &self,
        source: &dyn ScriptSource,
    ) -> std::result::Result<MigrationReport, MigrationError> {
        let mut conn = self.conn.lock().unwrap();
        MigrationService::new(&mut conn).run(source)
    }
}

impl NoteStore for DuckDbStore {
    fn get(&self, name: &str) -> CoreResult<Option<Vec<u8>>> {
        let conn = self.conn.lock().unwrap();
        let body: Vec<u8> = match conn.query_row(
            "SELECT body FROM note WHERE name = ?",
            params![name],
            |row| row.get(0),
        ) {
            Ok(body) => body,
            Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        conn.execute(
            "UPDATE note SET last_viewed = CAST(? AS TIMESTAMP) WHERE name = ?",
            params![timestamp(Utc::now()), name],
        )?;
        Ok(Some(body))
    }

    fn set(&self, name: &str, body: &[u8], clobber: bool) -> CoreResult<SetOutcome> {
        let conn = self.conn.lock().unwrap();
        let now = timestamp(Utc::now());

        // Duplicate names are detected structurally through the changed-row
        // count, not by matching constraint-violation text.
        let inserted = conn.execute(
            "INSERT INTO note (name, body, create_time, last_viewed)
             VALUES (?, ?, CAST(? AS TIMESTAMP), CAST(? AS TIMESTAMP))
             ON CONFLICT DO NOTHING",
            params![name, body, now, now],
        )?;
        if inserted > 0 {
            return Ok(SetOutcome::Created);
        }
        if !clobber {
            return Ok(SetOutcome::Conflict);
        }

        conn.execute(
            "UPDATE note SET body = ? WHERE name = ?",
            params![body, name],
        )?;
        Ok(SetOutcome::Updated)
    }

    fn delete(&self, name: &str) -> CoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM note WHERE name = ?", params![name])?;
        Ok(())
    }

    fn recent(&self, limit: usize) -> CoreResult<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT name FROM note ORDER BY create_time DESC, name LIMIT ?",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| row.get::<_, String>(0))?;

        let mut names = Vec::new();
        for name in rows {
            names.push(name?);
        }
        Ok(names)
    }

    fn delete_older_than(&self, age: Duration) -> CoreResult<usize> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(age)
                .map_err(|e| crate::domain::result::Error::database(e.to_string()))?;
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute(
            "DELETE FROM note WHERE last_viewed < CAST(? AS TIMESTAMP)",
            params![timestamp(cutoff)],
        )?;
        Ok(removed)
    }
}
