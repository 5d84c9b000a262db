use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-event run locks
///
/// Matching runs over the same event must not overlap. A run holds the
/// event's guard for its whole duration; a second request for the same event
/// fails fast instead of queueing.
///
/// `finished_runs` counts runs that wrote to the store. A reader that fills a
/// cache compares it before and after, and drops its entry when a run
/// finished in between.
#[derive(Debug, Default)]
pub struct EventLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    finished_runs: AtomicU64,
}

impl EventLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the event's lock, or `None` if a run is already in flight
    pub fn try_acquire(&self, event_id: &str) -> Option<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Drop entries nobody holds so the map stays bounded by live runs
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(event_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        lock.try_lock_owned().ok()
    }

    pub fn finished_runs(&self) -> u64 {
        self.finished_runs.load(Ordering::SeqCst)
    }

    /// Record that a run has committed its writes
    pub fn mark_finished(&self) {
        self.finished_runs.fetch_add(1, Ordering::SeqCst);
    }
}
