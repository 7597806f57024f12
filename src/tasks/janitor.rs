//! Janitor Task
//!
//! Background task that periodically sweeps expired entries out of a store.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

// == Janitor Handle ==
/// Owns the running janitor task.
///
/// The task never ends on its own; [`abort`](JanitorHandle::abort) stops it.
#[derive(Debug)]
pub struct JanitorHandle {
    handle: JoinHandle<()>,
}

impl JanitorHandle {
    /// Stops the janitor. Safe to call more than once.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Returns true once the task has stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawns a background task that sweeps `store` every `interval`.
///
/// The interval is the cache TTL itself, so an entry can survive for up to
/// roughly twice the TTL before a sweep catches it. When `logging_enabled` is
/// set, each sweep reports how many entries it visited at info level;
/// otherwise the report goes to debug.
///
/// # Panics
/// Must be called from within a Tokio runtime.
///
/// # Example
/// ```ignore
/// let store = Arc::new(CacheStore::new());
/// let janitor = spawn_janitor_task(store.clone(), Duration::from_secs(30), true);
/// // Later, during shutdown:
/// janitor.abort();
/// ```
pub fn spawn_janitor_task(
    store: Arc<CacheStore>,
    interval: Duration,
    logging_enabled: bool,
) -> JanitorHandle {
    let handle = tokio::spawn(async move {
        debug!(interval = ?interval, "Starting cache janitor");

        loop {
            tokio::time::sleep(interval).await;

            let report = store.purge_expired();

            if logging_enabled {
                info!(
                    "Current cache size: {} (removed {} expired entries)",
                    report.visited, report.removed
                );
            } else {
                debug!(
                    visited = report.visited,
                    removed = report.removed,
                    "Cache sweep finished"
                );
            }
        }
    });

    JanitorHandle { handle }
}
