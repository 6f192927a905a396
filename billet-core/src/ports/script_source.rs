//! Script source port - where migration scripts come from
//!
//! The engine never touches the filesystem itself; a source hands it named
//! SQL blobs. Sources do not need to return scripts in any particular order,
//! the engine sorts by parsed identifier before validating anything.

/// One discovered migration script.
#[derive(Debug, Clone)]
pub struct ScriptFile {
    /// Base file name, e.g. `2024-06-01.0.sql`. Encodes the identifier.
    pub name: String,
    /// Full script text, executed as one batch.
    pub sql: String,
}

/// A read-only collection of migration scripts.
pub trait ScriptSource {
    /// Enumerate every script in the collection.
    fn scripts(&self) -> std::io::Result<Vec<ScriptFile>>;
}
