//! Configuration
//!
//! Billet is flag-driven: the CLI assembles a `Config` from command-line
//! arguments and hands it to `BilletContext::new`. Credentials may come
//! inline or from a file with one `user:password` pair per line.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::result::{Error, Result};

/// Default number of notes shown on the index page.
pub const DEFAULT_RECENT_NOTES: usize = 8;

/// Default note expiry in days (0 disables expiry).
pub const DEFAULT_EXPIRY_DAYS: u64 = 7;

/// Which storage backend to use, chosen once at startup.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// DuckDB database file (the default).
    Database { path: PathBuf },
    /// One file per note under a directory.
    FlatFile { dir: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    /// Accepted `user:password` pairs; `None` disables authentication.
    pub credentials: Option<HashSet<String>>,
    /// Notes unread for longer than this are deleted; `None` disables expiry.
    pub note_expiry: Option<Duration>,
    /// How many recent notes the index page lists.
    pub recent_notes: usize,
}

impl Config {
    pub fn new(storage: StorageBackend) -> Self {
        Self {
            storage,
            credentials: None,
            note_expiry: Some(Duration::from_secs(DEFAULT_EXPIRY_DAYS * 24 * 60 * 60)),
            recent_notes: DEFAULT_RECENT_NOTES,
        }
    }

    /// Set expiry from a flag value in days; zero disables expiry.
    pub fn with_expiry_days(mut self, days: u64) -> Self {
        self.note_expiry = if days == 0 {
            None
        } else {
            Some(Duration::from_secs(days * 24 * 60 * 60))
        };
        self
    }

    pub fn with_recent_notes(mut self, count: usize) -> Self {
        self.recent_notes = count;
        self
    }

    /// Combine inline credentials and a credentials file into the accepted
    /// set. Returns `None` (auth disabled) when neither is given.
    pub fn load_credentials(
        inline: Option<&str>,
        file: Option<&Path>,
    ) -> Result<Option<HashSet<String>>> {
        if inline.is_none() && file.is_none() {
            return Ok(None);
        }

        let mut creds = HashSet::new();
        if let Some(path) = file {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::config(format!("unable to open credentials file {path:?}: {e}"))
            })?;
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if !line.contains(':') {
                    return Err(Error::config(format!(
                        "credentials file {path:?}: line is not user:password"
                    )));
                }
                creds.insert(line.to_string());
            }
        }
        if let Some(pair) = inline {
            if !pair.contains(':') {
                return Err(Error::config("credentials are not in user:password form"));
            }
            creds.insert(pair.to_string());
        }

        if creds.is_empty() {
            return Err(Error::config("credentials were configured but none were found"));
        }
        Ok(Some(creds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_credentials_disables_auth() {
        assert!(Config::load_credentials(None, None).unwrap().is_none());
    }

    #[test]
    fn inline_credentials() {
        let creds = Config::load_credentials(Some("alice:s3cret"), None)
            .unwrap()
            .unwrap();
        assert!(creds.contains("alice:s3cret"));
    }

    #[test]
    fn credentials_file_skips_blank_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("creds");
        std::fs::write(&path, "alice:one\n\nbob:two\n").unwrap();

        let creds = Config::load_credentials(None, Some(&path)).unwrap().unwrap();
        assert_eq!(creds.len(), 2);
        assert!(creds.contains("bob:two"));
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert!(Config::load_credentials(Some("nopassword"), None).is_err());
    }

    #[test]
    fn zero_days_disables_expiry() {
        let config = Config::new(StorageBackend::FlatFile {
            dir: PathBuf::from("/tmp/notes"),
        })
        .with_expiry_days(0);
        assert!(config.note_expiry.is_none());
    }
}
