//! Expiry service - periodic deletion of stale notes

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::ports::NoteStore;

/// How often the sweep runs while the server is up.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Deletes notes whose last-viewed time is older than the configured age.
///
/// The sweep shares the store with request handlers and needs no extra
/// coordination: `delete_older_than` is a single store operation.
pub struct ExpiryService {
    store: Arc<dyn NoteStore>,
    age: Duration,
}

impl ExpiryService {
    pub fn new(store: Arc<dyn NoteStore>, age: Duration) -> Self {
        Self { store, age }
    }

    /// One sweep pass. Failures are logged, not propagated - the next tick
    /// retries anyway.
    pub fn sweep(&self) {
        match self.store.delete_older_than(self.age) {
            Ok(0) => {}
            Ok(removed) => info!(removed, "expired stale notes"),
            Err(e) => warn!("expiry sweep failed: {e}"),
        }
    }

    /// Sweep forever at `interval`. Spawn as a background task.
    pub async fn run(self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        // The immediate first tick would race server startup for no benefit.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            self.sweep();
        }
    }
}
