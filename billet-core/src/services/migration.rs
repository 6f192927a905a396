//! Migration engine - brings a store from any historical state to the
//! current schema
//!
//! Scripts come from a [`ScriptSource`], are sorted by parsed identifier,
//! validated against the ledger, and each pending script is applied inside
//! its own transaction together with its ledger entry. Atomicity is
//! per-script, not per-run: a run that fails halfway leaves the earlier
//! scripts committed, and rerunning after the fix resumes where it stopped.

use std::collections::BTreeMap;

use duckdb::Connection;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::MigrationId;
use crate::ports::{ScriptFile, ScriptSource};
use crate::services::ledger::Ledger;

/// Fatal conditions a migration run can end with.
///
/// None of these are retried; the operator fixes the script collection (or
/// the script) and reruns, which is safe because applied scripts are skipped.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("parsing migration name {name:?}: bad format")]
    BadScriptName { name: String },

    #[error("duplicate migration: {id} appears more than once")]
    Duplicate { id: MigrationId },

    #[error("migrations are out of order: new migration {id} is no newer than latest migration {latest}")]
    OutOfOrder {
        id: MigrationId,
        latest: MigrationId,
    },

    #[error("migrations are out of order: recorded migration {id} is newer than latest migration {latest}")]
    RecordedAhead {
        id: MigrationId,
        latest: MigrationId,
    },

    #[error("missing migration: {id} was applied but its script was not found")]
    Missing { id: MigrationId },

    #[error("running migration {name}: {source}")]
    Script {
        name: String,
        source: duckdb::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("reading migration scripts: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a migration run.
#[derive(Debug)]
pub struct MigrationReport {
    /// Identifiers applied by this run, in order. Empty on an up-to-date
    /// store.
    pub applied: Vec<MigrationId>,
    /// Count of scripts that were already recorded and skipped.
    pub already_applied: usize,
}

impl MigrationReport {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

/// The migration engine. Borrows the store's connection exclusively for the
/// duration of one run; it is a startup-time gate, not a concurrent service.
pub struct MigrationService<'a> {
    conn: &'a mut Connection,
}

impl<'a> MigrationService<'a> {
    pub fn new(conn: &'a mut Connection) -> Self {
        Self { conn }
    }

    /// Apply every pending script from `source`, in identifier order.
    ///
    /// Validates the whole collection against the ledger: malformed names,
    /// duplicate identifiers, scripts older than the latest applied entry,
    /// and ledger entries whose script has disappeared are all fatal. Fails
    /// fast on the first inconsistency.
    pub fn run(&mut self, source: &dyn ScriptSource) -> Result<MigrationReport, MigrationError> {
        let ledger = Ledger::new(self.conn);
        ledger.ensure()?;

        // Ledger working set: each entry starts unmatched, and anything
        // still unmatched after the scan means its script file is gone.
        let mut visited: BTreeMap<MigrationId, bool> =
            ledger.entries()?.into_iter().map(|id| (id, false)).collect();
        let mut latest = visited.keys().next_back().copied();

        if visited.is_empty() {
            info!("creating database");
        }

        let scripts = discover(source)?;

        let mut report = MigrationReport {
            applied: Vec::new(),
            already_applied: 0,
        };

        for (id, script) in scripts {
            if let Some(matched) = visited.get_mut(&id) {
                // Already applied. The tracked latest must dominate every
                // recorded entry; if it does not, the ledger was tampered
                // with after the fact.
                *matched = true;
                if let Some(latest) = latest {
                    if id > latest {
                        return Err(MigrationError::RecordedAhead { id, latest });
                    }
                }
                debug!(migration = %id, "already applied, skipping");
                report.already_applied += 1;
                continue;
            }

            // Pending script: must extend the history, never rewrite it.
            if let Some(latest) = latest {
                if id <= latest {
                    return Err(MigrationError::OutOfOrder { id, latest });
                }
            }

            self.apply(id, &script)?;
            latest = Some(id);
            report.applied.push(id);
        }

        // Tamper check: every recorded entry must have been seen on disk.
        for (id, matched) in &visited {
            if !matched {
                return Err(MigrationError::Missing { id: *id });
            }
        }

        if !report.applied.is_empty() {
            info!(count = report.applied.len(), "applied migrations");
        }
        Ok(report)
    }

    /// Execute one script and record it, atomically.
    fn apply(&mut self, id: MigrationId, script: &ScriptFile) -> Result<(), MigrationError> {
        debug!(migration = %id, "applying");
        let tx = self.conn.transaction()?;
        tx.execute_batch(&script.sql)
            .map_err(|source| MigrationError::Script {
                name: script.name.clone(),
                source,
            })?;
        Ledger::new(&tx).record(id)?;
        tx.commit()?;
        Ok(())
    }
}

/// Enumerate, parse, and order the script collection.
///
/// Sorting by parsed identifier (rather than trusting enumeration order)
/// makes application order independent of filesystem traversal; the
/// adjacency scan then surfaces duplicates before any script executes.
fn discover(
    source: &dyn ScriptSource,
) -> Result<Vec<(MigrationId, ScriptFile)>, MigrationError> {
    let mut scripts = Vec::new();
    for file in source.scripts()? {
        let id = MigrationId::from_file_name(&file.name).ok_or_else(|| {
            MigrationError::BadScriptName {
                name: file.name.clone(),
            }
        })?;
        scripts.push((id, file));
    }
    scripts.sort_by_key(|(id, _)| *id);

    for pair in scripts.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(MigrationError::Duplicate { id: pair[0].0 });
        }
    }
    Ok(scripts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::EmbeddedScripts;

    /// In-memory source built from (name, sql) pairs.
    fn source(scripts: &[(&str, &str)]) -> EmbeddedScripts {
        EmbeddedScripts::from_pairs(
            scripts
                .iter()
                .map(|(n, s)| (n.to_string(), s.to_string()))
                .collect(),
        )
    }

    fn ledger_rows(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT date, number FROM _migration ORDER BY date, number")
            .unwrap();
        let rows = stmt
            .query_map([], |row| {
                Ok(format!(
                    "{}.{}",
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?
                ))
            })
            .unwrap();
        rows.map(|r| r.unwrap()).collect()
    }

    #[test]
    fn applies_all_scripts_to_fresh_store() {
        let mut conn = Connection::open_in_memory().unwrap();
        let src = source(&[
            ("2020-01-01.0.sql", "CREATE TABLE a (x INTEGER)"),
            ("2020-01-01.1.sql", "CREATE TABLE b (x INTEGER)"),
            ("2020-01-02.0.sql", "CREATE TABLE c (x INTEGER)"),
        ]);

        let report = MigrationService::new(&mut conn).run(&src).unwrap();
        assert_eq!(report.applied_count(), 3);
        assert_eq!(
            ledger_rows(&conn),
            vec!["2020-01-01.0", "2020-01-01.1", "2020-01-02.0"]
        );
        let latest = Ledger::new(&conn).latest().unwrap().unwrap();
        assert_eq!(latest.to_string(), "2020-01-02.0");
    }

    #[test]
    fn second_run_applies_nothing() {
        let mut conn = Connection::open_in_memory().unwrap();
        let src = source(&[("2020-01-01.0.sql", "CREATE TABLE a (x INTEGER)")]);

        MigrationService::new(&mut conn).run(&src).unwrap();
        let report = MigrationService::new(&mut conn).run(&src).unwrap();
        assert_eq!(report.applied_count(), 0);
        assert_eq!(report.already_applied, 1);
    }

    #[test]
    fn rejects_malformed_name() {
        let mut conn = Connection::open_in_memory().unwrap();
        let src = source(&[("2020-1-1.0.sql", "CREATE TABLE a (x INTEGER)")]);

        let err = MigrationService::new(&mut conn).run(&src).unwrap_err();
        assert!(matches!(err, MigrationError::BadScriptName { .. }), "{err}");
        // nothing executed
        assert_eq!(ledger_rows(&conn), Vec::<String>::new());
    }

    #[test]
    fn rejects_duplicate_identifiers() {
        let mut conn = Connection::open_in_memory().unwrap();
        let src = source(&[
            ("2020-01-01.0.sql", "CREATE TABLE a (x INTEGER)"),
            ("2020-01-01.0.sql", "CREATE TABLE b (x INTEGER)"),
        ]);

        let err = MigrationService::new(&mut conn).run(&src).unwrap_err();
        assert!(matches!(err, MigrationError::Duplicate { .. }), "{err}");
        assert_eq!(ledger_rows(&conn), Vec::<String>::new());
    }

    #[test]
    fn rejects_script_introduced_in_the_past() {
        let mut conn = Connection::open_in_memory().unwrap();
        let v1 = source(&[("2020-02-01.0.sql", "CREATE TABLE a (x INTEGER)")]);
        MigrationService::new(&mut conn).run(&v1).unwrap();

        // A "new" script that is chronologically earlier than what's applied.
        let v2 = source(&[
            ("2020-01-15.0.sql", "CREATE TABLE b (x INTEGER)"),
            ("2020-02-01.0.sql", "CREATE TABLE a (x INTEGER)"),
        ]);
        let err = MigrationService::new(&mut conn).run(&v2).unwrap_err();
        assert!(matches!(err, MigrationError::OutOfOrder { .. }), "{err}");
    }

    #[test]
    fn detects_removed_script_file() {
        let mut conn = Connection::open_in_memory().unwrap();
        let v1 = source(&[
            ("2020-01-01.0.sql", "CREATE TABLE a (x INTEGER)"),
            ("2020-01-02.0.sql", "CREATE TABLE b (x INTEGER)"),
        ]);
        MigrationService::new(&mut conn).run(&v1).unwrap();

        // First script deleted after being applied.
        let v2 = source(&[("2020-01-02.0.sql", "CREATE TABLE b (x INTEGER)")]);
        let err = MigrationService::new(&mut conn).run(&v2).unwrap_err();
        match err {
            MigrationError::Missing { id } => assert_eq!(id.to_string(), "2020-01-01.0"),
            other => panic!("expected Missing, got {other}"),
        }
    }

    #[test]
    fn failed_script_rolls_back_and_rerun_resumes() {
        let mut conn = Connection::open_in_memory().unwrap();
        let broken = source(&[
            ("2020-01-01.0.sql", "CREATE TABLE a (x INTEGER)"),
            ("2020-01-02.0.sql", "THIS IS NOT SQL"),
        ]);

        let err = MigrationService::new(&mut conn).run(&broken).unwrap_err();
        assert!(matches!(err, MigrationError::Script { .. }), "{err}");
        // First script committed, second rolled back entirely.
        assert_eq!(ledger_rows(&conn), vec!["2020-01-01.0"]);

        let fixed = source(&[
            ("2020-01-01.0.sql", "CREATE TABLE a (x INTEGER)"),
            ("2020-01-02.0.sql", "CREATE TABLE b (x INTEGER)"),
        ]);
        let report = MigrationService::new(&mut conn).run(&fixed).unwrap();
        assert_eq!(report.applied_count(), 1);
        assert_eq!(report.applied[0].to_string(), "2020-01-02.0");
        assert_eq!(ledger_rows(&conn), vec!["2020-01-01.0", "2020-01-02.0"]);
    }

    #[test]
    fn zero_scripts_on_fresh_store_is_valid() {
        let mut conn = Connection::open_in_memory().unwrap();
        let report = MigrationService::new(&mut conn).run(&source(&[])).unwrap();
        assert_eq!(report.applied_count(), 0);
        assert!(Ledger::new(&conn).latest().unwrap().is_none());
    }

    #[test]
    fn ledger_contains_reports_membership() {
        let mut conn = Connection::open_in_memory().unwrap();
        let src = source(&[("2020-01-01.0.sql", "CREATE TABLE a (x INTEGER)")]);
        MigrationService::new(&mut conn).run(&src).unwrap();

        let ledger = Ledger::new(&conn);
        let applied = MigrationId::from_file_name("2020-01-01.0.sql").unwrap();
        let other = MigrationId::from_file_name("2020-01-02.0.sql").unwrap();
        assert!(ledger.contains(applied).unwrap());
        assert!(!ledger.contains(other).unwrap());
    }
}
