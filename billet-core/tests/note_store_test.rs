//! Note store tests against the database backend
//!
//! The flat-file backend has its own unit tests; these cover the DuckDB
//! adapter plus context wiring, using real database files in temp dirs.

use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use billet_core::adapters::{DuckDbStore, EmbeddedScripts};
use billet_core::config::{Config, StorageBackend};
use billet_core::{BilletContext, NoteStore, SetOutcome};

fn open_store(tmp: &TempDir) -> DuckDbStore {
    let store = DuckDbStore::open(&tmp.path().join("notes.duckdb")).unwrap();
    store.run_migrations(&EmbeddedScripts::baseline()).unwrap();
    store
}

#[test]
fn set_get_round_trip() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    assert_eq!(store.set("a", b"hello", false).unwrap(), SetOutcome::Created);
    assert_eq!(store.get("a").unwrap().unwrap(), b"hello");
}

#[test]
fn no_clobber_conflict_leaves_body_unchanged() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    store.set("a", b"hello", false).unwrap();
    assert_eq!(store.set("a", b"other", false).unwrap(), SetOutcome::Conflict);
    assert_eq!(store.get("a").unwrap().unwrap(), b"hello");

    assert_eq!(store.set("a", b"bye", true).unwrap(), SetOutcome::Updated);
    assert_eq!(store.get("a").unwrap().unwrap(), b"bye");
}

#[test]
fn get_missing_note_is_none_not_error() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);
    assert!(store.get("nothing-here").unwrap().is_none());
}

#[test]
fn binary_bodies_survive() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    let body: Vec<u8> = (0..=255u8).collect();
    store.set("bin", &body, false).unwrap();
    assert_eq!(store.get("bin").unwrap().unwrap(), body);
}

#[test]
fn delete_succeeds_even_when_absent() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    store.set("a", b"x", false).unwrap();
    store.delete("a").unwrap();
    assert!(store.get("a").unwrap().is_none());
    store.delete("a").unwrap();
}

#[test]
fn recent_lists_newest_first_up_to_limit() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    for name in ["one", "two", "three"] {
        store.set(name, b"x", false).unwrap();
        // Distinct create_time per note.
        thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(store.recent(2).unwrap(), vec!["three", "two"]);
    assert_eq!(store.recent(10).unwrap(), vec!["three", "two", "one"]);
}

#[test]
fn expiry_deletes_stale_and_keeps_viewed() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    store.set("stale", b"x", false).unwrap();
    thread::sleep(Duration::from_millis(250));
    store.set("fresh", b"y", false).unwrap();

    // Cutoff falls between the two writes.
    let removed = store.delete_older_than(Duration::from_millis(100)).unwrap();
    assert_eq!(removed, 1);
    assert!(store.get("stale").unwrap().is_none());
    assert!(store.get("fresh").unwrap().is_some());
}

#[test]
fn viewing_a_note_refreshes_its_expiry() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    store.set("kept", b"x", false).unwrap();
    thread::sleep(Duration::from_millis(250));
    // The read touches last_viewed.
    store.get("kept").unwrap().unwrap();

    let removed = store.delete_older_than(Duration::from_millis(100)).unwrap();
    assert_eq!(removed, 0);
    assert!(store.get("kept").unwrap().is_some());
}

#[test]
fn context_wires_database_backend_and_runs_migrations() {
    let tmp = TempDir::new().unwrap();
    let config = Config::new(StorageBackend::Database {
        path: tmp.path().join("notes.duckdb"),
    });

    let ctx = BilletContext::new(config).unwrap();
    assert_eq!(
        ctx.note_service.set("a", b"hi", false).unwrap(),
        SetOutcome::Created
    );
    assert_eq!(ctx.note_service.get("a").unwrap().unwrap(), b"hi");
    // Name validation happens above the store.
    assert!(ctx.note_service.get("../escape").is_err());
}

#[test]
fn context_wires_flat_file_backend() {
    let tmp = TempDir::new().unwrap();
    let config = Config::new(StorageBackend::FlatFile {
        dir: tmp.path().join("notes"),
    })
    .with_expiry_days(0);

    let ctx = BilletContext::new(config).unwrap();
    assert!(ctx.expiry_service().is_none());
    ctx.note_service.set("a", b"hi", false).unwrap();
    assert_eq!(ctx.note_service.get("a").unwrap().unwrap(), b"hi");
}
