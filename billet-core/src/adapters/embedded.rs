//! Script source over SQL embedded at compile time

use crate::migrations::SCHEMA;
use crate::ports::{ScriptFile, ScriptSource};

/// Migration scripts compiled into the binary.
///
/// The default collection is the baseline `note` schema from
/// `billet-core/src/migrations/`.
pub struct EmbeddedScripts {
    scripts: Vec<(String, String)>,
}

impl EmbeddedScripts {
    /// The baseline schema shipped with the binary.
    pub fn baseline() -> Self {
        Self::from_pairs(
            SCHEMA
                .iter()
                .map(|(name, sql)| (name.to_string(), sql.to_string()))
                .collect(),
        )
    }

    /// Build a source from arbitrary (name, sql) pairs.
    pub fn from_pairs(scripts: Vec<(String, String)>) -> Self {
        Self { scripts }
    }
}

impl ScriptSource for EmbeddedScripts {
    fn scripts(&self) -> std::io::Result<Vec<ScriptFile>> {
        Ok(self
            .scripts
            .iter()
            .map(|(name, sql)| ScriptFile {
                name: name.clone(),
                sql: sql.clone(),
            })
            .collect())
    }
}
