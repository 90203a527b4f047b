//! Dirty signal shared between writers and the broadcaster

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use crate::stats::SyncStats;

/// Set by writers after a committed mutation, cleared only by the broadcaster
///
/// Raising is lock-free and never blocks. Any number of raises between two
/// ticks collapse into one pending pass.
#[derive(Debug, Clone)]
pub struct DirtySignal {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    dirty: AtomicBool,
    wake: Notify,
    stats: Arc<SyncStats>,
}

impl DirtySignal {
    /// Create a clear signal
    pub fn new(stats: Arc<SyncStats>) -> Self {
        Self {
            inner: Arc::new(Inner {
                dirty: AtomicBool::new(false),
                wake: Notify::new(),
                stats,
            }),
        }
    }

    /// Request a broadcast
    pub fn raise(&self) {
        self.inner.stats.record_broadcast_request();
        self.inner.dirty.store(true, Ordering::Release);
        // Stores a permit when nobody is waiting, so a raise is never missed
        self.inner.wake.notify_one();
    }

    /// Whether a broadcast is pending
    pub fn is_raised(&self) -> bool {
        self.inner.dirty.load(Ordering::Acquire)
    }

    /// Clear the flag, returning whether it was set
    pub(crate) fn take(&self) -> bool {
        self.inner.dirty.swap(false, Ordering::AcqRel)
    }

    /// Wait for the next raise (may return early on a stale permit)
    pub(crate) async fn raised(&self) {
        self.inner.wake.notified().await;
    }
}
