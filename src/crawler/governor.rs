//! Per-origin serialization and adaptive pacing
//!
//! The governor is what turns a wide parallel crawler into a polite one:
//! at most one in-flight fetch per origin, with a pre-fetch delay derived
//! from that origin's success/error history.

use crate::state::OriginStats;
use crate::url::Origin;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Scoped origin hold; releasing it (by drop) lets the next waiter through
pub struct OriginHold {
    _guard: OwnedMutexGuard<()>,
}

/// Per-origin lock table and statistics
///
/// Lock objects are created lazily and never removed; the table mutex is
/// held only for the map lookup, never across the async acquisition.
/// Waiters on one origin are served in FIFO order (tokio mutex fairness);
/// different origins do not block each other.
pub struct OriginGovernor {
    locks: Mutex<HashMap<Origin, Arc<AsyncMutex<()>>>>,
    stats: Mutex<HashMap<Origin, OriginStats>>,
}

impl OriginGovernor {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            stats: Mutex::new(HashMap::new()),
        }
    }

    /// Acquires the exclusive hold for an origin
    ///
    /// Sleeps for the origin's current adaptive delay before returning, so
    /// a returned hold means the caller may fetch immediately.
    pub async fn acquire(&self, origin: &Origin) -> OriginHold {
        let lock = self.lock_for(origin);
        let guard = lock.lock_owned().await;

        let delay = self.current_stats(origin).adaptive_delay();
        tracing::trace!("origin {} delay {:?}", origin, delay);
        tokio::time::sleep(delay).await;

        OriginHold { _guard: guard }
    }

    /// Records a fetch outcome for an origin
    pub fn record(&self, origin: &Origin, success: bool) {
        let mut stats = self.stats.lock().unwrap();
        stats.entry(origin.clone()).or_default().record(success);
    }

    /// Current counters for an origin (zeroes if never seen)
    pub fn current_stats(&self, origin: &Origin) -> OriginStats {
        let stats = self.stats.lock().unwrap();
        stats.get(origin).copied().unwrap_or_default()
    }

    /// Copies out all per-origin counters, keyed by origin display form
    pub fn stats_snapshot(&self) -> HashMap<String, OriginStats> {
        let stats = self.stats.lock().unwrap();
        stats
            .iter()
            .map(|(origin, s)| (origin.to_string(), *s))
            .collect()
    }

    fn lock_for(&self, origin: &Origin) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks.entry(origin.clone()).or_default().clone()
    }
}

impl Default for OriginGovernor {
    fn default() -> Self {
        Self::new()
    }
}
