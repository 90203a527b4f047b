//! Push-stream hub
//!
//! Fans state envelopes out to every attached HTTP event-stream client through
//! a `tokio::sync::broadcast` channel. A client that falls behind by more than
//! the channel depth skips ahead to the newest frames.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::broadcast;

use crate::broadcast::{StateFrame, StateSink};
use crate::error::Result;
use crate::protocol::encode_state;
use crate::state::StateStore;
use crate::stats::SyncStats;

/// Broadcast hub for push-stream subscribers
#[derive(Debug, Clone)]
pub struct PushHub {
    tx: broadcast::Sender<Bytes>,
    stats: Arc<SyncStats>,
}

/// A push-stream client attachment
///
/// Dropping it detaches the client.
#[derive(Debug)]
pub struct PushSubscription {
    /// State envelope at the time of attaching
    pub initial: Bytes,
    /// Envelopes from every later fan-out pass
    pub rx: broadcast::Receiver<Bytes>,
    stats: Arc<SyncStats>,
}

impl Drop for PushSubscription {
    fn drop(&mut self) {
        self.stats.push_subscriber_removed();
        tracing::debug!("Push-stream client detached");
    }
}

impl PushHub {
    pub fn new(capacity: usize, stats: Arc<SyncStats>) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx, stats }
    }

    /// Attach a client
    ///
    /// The receiver is created before the snapshot is taken, so a pass that
    /// commits in between reaches the client as an event rather than being
    /// missed.
    pub fn subscribe(&self, store: &StateStore) -> PushSubscription {
        let rx = self.tx.subscribe();
        let initial = encode_state(&store.snapshot());

        self.stats.push_subscriber_added();
        tracing::debug!(subscribers = self.tx.receiver_count(), "Push-stream client attached");

        PushSubscription {
            initial,
            rx,
            stats: Arc::clone(&self.stats),
        }
    }

    /// Number of attached clients
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl StateSink for PushHub {
    fn deliver(&self, frame: &StateFrame) -> Result<()> {
        // No subscribers is not a failure
        let _ = self.tx.send(frame.payload.clone());
        Ok(())
    }
}
