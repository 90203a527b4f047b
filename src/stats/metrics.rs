//! Synchronization statistics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Live counters shared by the dispatcher, broadcaster and transports
#[derive(Debug)]
pub struct SyncStats {
    started_at: Instant,
    updates_applied: AtomicU64,
    updates_rejected: AtomicU64,
    decode_errors: AtomicU64,
    broadcast_requests: AtomicU64,
    fanout_passes: AtomicU64,
    sink_failures: AtomicU64,
    push_subscribers: AtomicU64,
}

impl SyncStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            updates_applied: AtomicU64::new(0),
            updates_rejected: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            broadcast_requests: AtomicU64::new(0),
            fanout_passes: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            push_subscribers: AtomicU64::new(0),
        }
    }

    pub fn record_applied(&self) {
        self.updates_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.updates_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broadcast_request(&self) {
        self.broadcast_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fanout_pass(&self) {
        self.fanout_passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn push_subscriber_added(&self) {
        self.push_subscribers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn push_subscriber_removed(&self) {
        // Never underflow if a removal races a reset
        let _ = self
            .push_subscribers
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime: self.started_at.elapsed(),
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
            updates_rejected: self.updates_rejected.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            broadcast_requests: self.broadcast_requests.load(Ordering::Relaxed),
            fanout_passes: self.fanout_passes.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            push_subscribers: self.push_subscribers.load(Ordering::Relaxed),
        }
    }
}

impl Default for SyncStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy of [`SyncStats`] at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Time since the counters were created
    pub uptime: Duration,
    /// Updates fully applied
    pub updates_applied: u64,
    /// Updates stopped by a hard validation failure
    pub updates_rejected: u64,
    /// Malformed envelopes on any transport
    pub decode_errors: u64,
    /// Broadcast requests from writers
    pub broadcast_requests: u64,
    /// Fan-out passes actually run
    pub fanout_passes: u64,
    /// Individual sink deliveries that failed
    pub sink_failures: u64,
    /// Currently attached push-stream clients
    pub push_subscribers: u64,
}

impl StatsSnapshot {
    /// Broadcast requests absorbed by coalescing
    pub fn coalesced(&self) -> u64 {
        self.broadcast_requests.saturating_sub(self.fanout_passes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let snapshot = SyncStats::new().snapshot();

        assert_eq!(snapshot.updates_applied, 0);
        assert_eq!(snapshot.updates_rejected, 0);
        assert_eq!(snapshot.decode_errors, 0);
        assert_eq!(snapshot.fanout_passes, 0);
        assert_eq!(snapshot.coalesced(), 0);
    }

    #[test]
    fn test_coalesced_count() {
        let stats = SyncStats::new();
        for _ in 0..10 {
            stats.record_broadcast_request();
        }
        stats.record_fanout_pass();

        assert_eq!(stats.snapshot().coalesced(), 9);
    }

    #[test]
    fn test_push_subscribers_never_underflow() {
        let stats = SyncStats::new();

        stats.push_subscriber_removed();
        assert_eq!(stats.snapshot().push_subscribers, 0);

        stats.push_subscriber_added();
        stats.push_subscriber_added();
        stats.push_subscriber_removed();
        assert_eq!(stats.snapshot().push_subscribers, 1);
    }

    #[test]
    fn test_counters_accumulate() {
        let stats = SyncStats::new();
        stats.record_applied();
        stats.record_applied();
        stats.record_rejected();
        stats.record_decode_error();
        stats.record_sink_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.updates_applied, 2);
        assert_eq!(snapshot.updates_rejected, 1);
        assert_eq!(snapshot.decode_errors, 1);
        assert_eq!(snapshot.sink_failures, 1);
    }
}
