//! Script source over a directory tree

use std::path::PathBuf;

use walkdir::WalkDir;

use crate::ports::{ScriptFile, ScriptSource};

/// Migration scripts read from a directory on disk.
///
/// Nested directories are descended; everything that is not a regular file
/// is skipped. The engine validates and orders by file name, so a file with
/// a name that is not a well-formed identifier fails the run - this source
/// does no filtering of its own.
pub struct DirScriptSource {
    root: PathBuf,
}

impl DirScriptSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ScriptSource for DirScriptSource {
    fn scripts(&self) -> std::io::Result<Vec<ScriptFile>> {
        let mut scripts = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(std::io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let sql = std::fs::read_to_string(entry.path())?;
            scripts.push(ScriptFile { name, sql });
        }
        Ok(scripts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_nested_directories_and_skips_non_files() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("2020-01-01.0.sql"), "SELECT 1").unwrap();
        let nested = dir.path().join("later");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("2020-01-02.0.sql"), "SELECT 2").unwrap();

        let mut names: Vec<String> = DirScriptSource::new(dir.path())
            .scripts()
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["2020-01-01.0.sql", "2020-01-02.0.sql"]);
    }
}
