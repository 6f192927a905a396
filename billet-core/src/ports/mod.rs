//! Port traits - seams between the core and its collaborators

mod note_store;
mod script_source;

pub use note_store::NoteStore;
pub use script_source::{ScriptFile, ScriptSource};
