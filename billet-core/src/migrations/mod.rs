//! Baseline schema - embedded SQL scripts
//!
//! The scripts are compiled into the binary with include_str!. Each entry is
//! (file name, sql); the name encodes the migration identifier as
//! `YYYY-MM-DD.N.sql` and the engine applies entries in identifier order.
//!
//! IMPORTANT: when adding a migration:
//! 1. Create the SQL file named with today's date: YYYY-MM-DD.0.sql
//!    (bump the serial for a second migration on the same day)
//! 2. Add an entry here

/// All baseline migrations, embedded at compile time.
pub const SCHEMA: &[(&str, &str)] = &[
    ("2024-06-01.0.sql", include_str!("2024-06-01.0.sql")),
    ("2024-07-19.0.sql", include_str!("2024-07-19.0.sql")),
];
