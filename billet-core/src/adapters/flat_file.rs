//! Flat-file note store
//!
//! One file per note under a root directory. The file's modification time
//! doubles as the last-viewed time (touched on every successful read), and
//! its creation time - falling back to mtime on filesystems without one -
//! orders the recent-notes listing. Note names are validated before they
//! ever become paths.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::domain::result::Result;
use crate::domain::{validate_note_name, SetOutcome};
use crate::ports::NoteStore;

pub struct FlatFileStore {
    root: PathBuf,
}

impl FlatFileStore {
    /// Open the store, creating the root directory if needed.
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn note_path(&self, name: &str) -> Result<PathBuf> {
        validate_note_name(name)?;
        Ok(self.root.join(name))
    }
}

fn created_or_modified(meta: &fs::Metadata) -> SystemTime {
    meta.created()
        .or_else(|_| meta.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

impl NoteStore for FlatFileStore {
    fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.note_path(name)?;
        let body = match fs::read(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        // Touch the last-viewed time.
        let file = fs::File::options().append(true).open(&path)?;
        file.set_modified(SystemTime::now())?;
        Ok(Some(body))
    }

    fn set(&self, name: &str, body: &[u8], clobber: bool) -> Result<SetOutcome> {
        let path = self.note_path(name)?;
        let exists = path.exists();
        if exists && !clobber {
            return Ok(SetOutcome::Conflict);
        }
        fs::write(&path, body)?;
        Ok(if exists {
            SetOutcome::Updated
        } else {
            SetOutcome::Created
        })
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.note_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn recent(&self, limit: usize) -> Result<Vec<String>> {
        let mut notes: Vec<(SystemTime, String)> = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            notes.push((created_or_modified(&meta), name));
        }
        // Newest first; name as tie-breaker for stable output.
        notes.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        Ok(notes.into_iter().take(limit).map(|(_, name)| name).collect())
    }

    fn delete_older_than(&self, age: Duration) -> Result<usize> {
        let cutoff = SystemTime::now()
            .checked_sub(age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut removed = 0;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            if meta.modified()? < cutoff {
                match fs::remove_file(entry.path()) {
                    Ok(()) => removed += 1,
                    // Raced with an explicit delete; nothing to do.
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FlatFileStore) {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FlatFileStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn rejects_traversal_names() {
        let (_dir, store) = store();
        assert!(store.set("../evil", b"x", false).is_err());
        assert!(store.get(".hidden").is_err());
    }

    #[test]
    fn round_trip_and_conflict() {
        let (_dir, store) = store();
        assert_eq!(store.set("a", b"hello", false).unwrap(), SetOutcome::Created);
        assert_eq!(store.get("a").unwrap().unwrap(), b"hello");
        assert_eq!(store.set("a", b"nope", false).unwrap(), SetOutcome::Conflict);
        assert_eq!(store.get("a").unwrap().unwrap(), b"hello");
        assert_eq!(store.set("a", b"bye", true).unwrap(), SetOutcome::Updated);
        assert_eq!(store.get("a").unwrap().unwrap(), b"bye");
    }

    #[test]
    fn delete_is_idempotent() {
        let (_dir, store) = store();
        store.set("a", b"x", false).unwrap();
        store.delete("a").unwrap();
        store.delete("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn expiry_removes_stale_and_keeps_fresh() {
        let (dir, store) = store();
        store.set("stale", b"x", false).unwrap();
        store.set("fresh", b"y", false).unwrap();

        // Age the stale note by rewinding its mtime a day.
        let old = SystemTime::now() - Duration::from_secs(24 * 60 * 60);
        let file = fs::File::options()
            .append(true)
            .open(dir.path().join("stale"))
            .unwrap();
        file.set_modified(old).unwrap();

        let removed = store.delete_older_than(Duration::from_secs(60 * 60)).unwrap();
        assert_eq!(removed, 1);
        assert!(store.get("stale").unwrap().is_none());
        assert!(store.get("fresh").unwrap().is_some());
    }
}
