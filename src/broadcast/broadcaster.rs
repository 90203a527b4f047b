//! Coalescing broadcaster
//!
//! The only component that writes to output sinks. Each tick checks the dirty
//! signal; if raised, it clears it *before* taking the snapshot, so a mutation
//! that lands during the fan-out re-raises the signal and is carried by the
//! next pass.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use super::frame::{SinkKind, StateFrame};
use super::signal::DirtySignal;
use super::sink::StateSink;
use crate::state::StateStore;
use crate::stats::SyncStats;

/// Default interval at which the run loop re-checks the signal without a wakeup
pub const DEFAULT_FALLBACK_INTERVAL: Duration = Duration::from_millis(250);

/// Fans committed state out to every attached sink, at most once per tick
pub struct Broadcaster {
    store: Arc<StateStore>,
    stats: Arc<SyncStats>,
    signal: DirtySignal,
    sinks: Vec<(SinkKind, Arc<dyn StateSink>)>,
    last_seq: AtomicU64,
    fallback_interval: Duration,
}

impl Broadcaster {
    /// Create a broadcaster with no sinks attached
    pub fn new(store: Arc<StateStore>, stats: Arc<SyncStats>) -> Self {
        Self {
            signal: DirtySignal::new(Arc::clone(&stats)),
            store,
            stats,
            sinks: Vec::new(),
            last_seq: AtomicU64::new(0),
            fallback_interval: DEFAULT_FALLBACK_INTERVAL,
        }
    }

    /// Set the fallback re-check interval
    pub fn fallback_interval(mut self, interval: Duration) -> Self {
        self.fallback_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Attach a sink
    ///
    /// Sinks are visited in [`SinkKind`] order regardless of attach order;
    /// sinks of the same kind keep their attach order.
    pub fn attach(&mut self, kind: SinkKind, sink: Arc<dyn StateSink>) {
        let at = self.sinks.partition_point(|(k, _)| *k <= kind);
        self.sinks.insert(at, (kind, sink));
    }

    /// Number of attached sinks
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Handle for writers to request a broadcast
    pub fn signal(&self) -> DirtySignal {
        self.signal.clone()
    }

    /// Request a broadcast
    pub fn request(&self) {
        self.signal.raise();
    }

    /// Sequence number of the last completed pass (0 before the first)
    pub fn last_pass(&self) -> u64 {
        self.last_seq.load(Ordering::Acquire)
    }

    /// Run one scheduling tick
    ///
    /// Returns the pass sequence number, or `None` when nothing was pending.
    pub fn tick(&self) -> Option<u64> {
        if !self.signal.take() {
            return None;
        }

        let snapshot = self.store.snapshot();
        let seq = self.last_seq.load(Ordering::Acquire) + 1;
        let frame = StateFrame::new(seq, snapshot);

        for (kind, sink) in &self.sinks {
            if let Err(e) = sink.deliver(&frame) {
                self.stats.record_sink_failure();
                tracing::warn!(pass = seq, sink = %kind, error = %e, "Sink delivery failed");
            }
        }

        self.last_seq.store(seq, Ordering::Release);
        self.stats.record_fanout_pass();

        tracing::debug!(
            pass = seq,
            sinks = self.sinks.len(),
            bytes = frame.payload.len(),
            "Fan-out pass complete"
        );

        Some(seq)
    }

    /// Wait until a broadcast is requested, then run the pass
    pub async fn next_pass(&self) -> u64 {
        loop {
            if let Some(seq) = self.tick() {
                return seq;
            }
            self.signal.raised().await;
        }
    }

    /// Run the scheduling loop until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut fallback = tokio::time::interval(self.fallback_interval);
        fallback.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::debug!(sinks = self.sinks.len(), "Broadcaster started");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = self.signal.raised() => {}
                _ = fallback.tick() => {}
            }
            self.tick();
        }

        tracing::debug!(passes = self.last_pass(), "Broadcaster stopped");
    }

    /// Spawn the scheduling loop on the runtime
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let broadcaster = Arc::clone(self);
        tokio::spawn(async move { broadcaster.run_until(std::future::pending()).await })
    }
}
