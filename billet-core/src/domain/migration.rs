//! Migration identifiers
//!
//! Every schema script is named `YYYY-MM-DD.N.sql`: a calendar date plus a
//! serial number within that date. The pair is the script's identity and its
//! position in the single linear migration history. Zero-padding in the date
//! keeps lexicographic file-name order equal to identifier order.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static SCRIPT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})\.(\d+)\.sql$").expect("valid regex"));

/// Identifier of one migration script: calendar date plus serial within
/// that date. Ordered by date, then number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MigrationId {
    pub date: NaiveDate,
    pub number: u32,
}

impl MigrationId {
    pub fn new(date: NaiveDate, number: u32) -> Self {
        Self { date, number }
    }

    /// Parse an identifier from a script file name.
    ///
    /// Returns `None` when the name does not match `YYYY-MM-DD.N.sql`
    /// exactly: unpadded dates, impossible dates, and oversized serial
    /// numbers are all rejected.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let caps = SCRIPT_NAME.captures(name)?;
        let date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()?;
        let number: u32 = caps[2].parse().ok()?;
        Some(Self { date, number })
    }

    /// The `date` column value recorded in the ledger.
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.date.format("%Y-%m-%d"), self.number)
    }
}
