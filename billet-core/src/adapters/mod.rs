//! Concrete adapter implementations

mod dir_source;
mod duckdb;
mod embedded;
mod flat_file;

pub use dir_source::DirScriptSource;
pub use self::duckdb::DuckDbStore;
pub use embedded::EmbeddedScripts;
pub use flat_file::FlatFileStore;
