//! Note entities and validation

use crate::domain::result::{Error, Result};

/// Outcome of a `set` operation.
///
/// `Conflict` is a normal outcome, not an error: it means the name already
/// exists and the caller asked not to clobber it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Created,
    Updated,
    Conflict,
}

/// Validate a note name before it reaches a store.
///
/// Names are URL path segments and, in the flat-file backend, file names -
/// so path separators and dot-prefixed names are rejected outright.
pub fn validate_note_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_name("note name is empty"));
    }
    if name.len() > 255 {
        return Err(Error::invalid_name(format!(
            "note name is too long ({} bytes, max 255)",
            name.len()
        )));
    }
    if name.starts_with('.') {
        return Err(Error::invalid_name(format!(
            "note name {:?} starts with a dot",
            name
        )));
    }
    if name.contains(['/', '\\']) || name.contains('\0') {
        return Err(Error::invalid_name(format!(
            "note name {:?} contains a path separator",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        for name in ["todo", "todo.txt", "meeting-2024", "a b c", "ünïcode"] {
            assert!(validate_note_name(name).is_ok(), "rejected {:?}", name);
        }
    }

    #[test]
    fn rejects_path_escapes() {
        for name in ["", "../etc/passwd", "a/b", "a\\b", ".hidden", "..", "nul\0"] {
            assert!(validate_note_name(name).is_err(), "accepted {:?}", name);
        }
    }
}
