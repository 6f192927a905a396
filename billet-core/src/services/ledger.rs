//! Migration ledger - the `_migration` table
//!
//! One row per applied migration script, keyed by (date, number). Rows are
//! written by the engine inside the same transaction as the script's own
//! effects and are never updated or deleted afterwards.

use duckdb::{params, Connection};

use crate::domain::MigrationId;

/// Thin accessor over the `_migration` table.
pub struct Ledger<'a> {
    conn: &'a Connection,
}

impl<'a> Ledger<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create the ledger table when it does not exist yet. Idempotent.
    pub fn ensure(&self) -> duckdb::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migration (
                date    TEXT NOT NULL,
                number  BIGINT NOT NULL,
                PRIMARY KEY (date, number)
            )",
        )
    }

    /// Every recorded entry, in no particular order.
    pub fn entries(&self) -> duckdb::Result<Vec<MigrationId>> {
        let mut stmt = self.conn.prepare("SELECT date, number FROM _migration")?;
        let rows = stmt.query_map([], |row| {
            let date: String = row.get(0)?;
            let number: i64 = row.get(1)?;
            Ok((date, number))
        })?;

        let mut ids = Vec::new();
        for row in rows {
            let (date, number) = row?;
            // Entries are only ever written from a parsed MigrationId, so a
            // row that fails to parse means the table was edited by hand.
            let parsed = chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| {
                duckdb::Error::InvalidColumnName(format!("bad date in _migration: {date:?}"))
            })?;
            ids.push(MigrationId::new(parsed, number as u32));
        }
        Ok(ids)
    }

    /// The greatest recorded identifier, or `None` on a brand-new store.
    pub fn latest(&self) -> duckdb::Result<Option<MigrationId>> {
        Ok(self.entries()?.into_iter().max())
    }

    /// Whether `id` has been recorded as applied.
    pub fn contains(&self, id: MigrationId) -> duckdb::Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM _migration WHERE date = ? AND number = ?",
            params![id.date_key(), id.number as i64],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Record `id` as applied. Callers pass the transaction that carries the
    /// script's own effects so the two commit together or not at all.
    pub fn record(&self, id: MigrationId) -> duckdb::Result<()> {
        self.conn.execute(
            "INSERT INTO _migration (date, number) VALUES (?, ?)",
            params![id.date_key(), id.number as i64],
        )?;
        Ok(())
    }
}
