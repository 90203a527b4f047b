//! Inbound command dispatch
//!
//! Every transport turns its input into a [`Command`] on one bounded queue. The
//! [`Dispatcher`] drains it, applies each command to the store, requests a
//! broadcast when the state changed and answers the originator.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::broadcast::DirtySignal;
use crate::error::{Error, Result, ValidationError};
use crate::protocol::StateUpdate;
use crate::state::{ApplyOutcome, StateStore};
use crate::stats::SyncStats;

/// Reply to an [`Command::Apply`]
pub type ApplyReply = std::result::Result<ApplyOutcome, ValidationError>;

/// Input from a transport
#[derive(Debug)]
pub enum Command {
    /// Apply a partial update; the reply carries the outcome, if requested
    Apply {
        update: StateUpdate,
        origin: &'static str,
        reply: Option<oneshot::Sender<ApplyReply>>,
    },
    /// Wireless controller connected or disconnected
    WirelessPresence(bool),
}

impl Command {
    /// Build an apply command and the receiver for its reply
    pub fn apply(
        update: StateUpdate,
        origin: &'static str,
    ) -> (Self, oneshot::Receiver<ApplyReply>) {
        let (tx, rx) = oneshot::channel();
        let command = Command::Apply {
            update,
            origin,
            reply: Some(tx),
        };
        (command, rx)
    }
}

/// Send an update through `inbound` and wait for its outcome
pub async fn submit(
    inbound: &mpsc::Sender<Command>,
    update: StateUpdate,
    origin: &'static str,
) -> Result<ApplyReply> {
    let (command, reply) = Command::apply(update, origin);
    inbound.send(command).await.map_err(|_| Error::ChannelClosed)?;
    reply.await.map_err(|_| Error::ChannelClosed)
}

/// Sole consumer of the inbound queue
pub struct Dispatcher {
    store: Arc<StateStore>,
    signal: DirtySignal,
    stats: Arc<SyncStats>,
    inbound: mpsc::Receiver<Command>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<StateStore>,
        signal: DirtySignal,
        stats: Arc<SyncStats>,
        inbound: mpsc::Receiver<Command>,
    ) -> Self {
        Self {
            store,
            signal,
            stats,
            inbound,
        }
    }

    /// Handle one command
    pub fn handle(&self, command: Command) {
        match command {
            Command::Apply {
                update,
                origin,
                reply,
            } => {
                let result = self.apply(&update, origin);
                if let Some(reply) = reply {
                    // The originator may have given up waiting
                    let _ = reply.send(result);
                }
            }
            Command::WirelessPresence(connected) => {
                if self.store.set_wireless_connected(connected) {
                    self.signal.raise();
                }
                tracing::info!(connected, "Wireless controller presence changed");
            }
        }
    }

    fn apply(&self, update: &StateUpdate, origin: &'static str) -> ApplyReply {
        match self.store.apply(update) {
            Ok(outcome) => {
                self.stats.record_applied();
                if outcome.changed {
                    self.signal.raise();
                }
                tracing::debug!(
                    origin,
                    fields = outcome.fields_applied,
                    changed = outcome.changed,
                    "Update applied"
                );
                Ok(outcome)
            }
            Err(rejected) => {
                self.stats.record_rejected();
                // Fields ahead of the failing one are already committed
                if rejected.partial.changed {
                    self.signal.raise();
                }
                tracing::warn!(
                    origin,
                    field = rejected.error.field(),
                    applied = rejected.partial.fields_applied,
                    error = %rejected.error,
                    "Update rejected"
                );
                Err(rejected.error)
            }
        }
    }

    /// Process commands until every sender is dropped
    pub async fn run(mut self) {
        while let Some(command) = self.inbound.recv().await {
            self.handle(command);
        }
        tracing::debug!("Inbound queue closed");
    }

    /// Process commands until `shutdown` resolves or every sender is dropped
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                command = self.inbound.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Team;

    fn setup() -> (
        Arc<StateStore>,
        DirtySignal,
        Arc<SyncStats>,
        mpsc::Sender<Command>,
        Dispatcher,
    ) {
        let store = Arc::new(StateStore::new());
        let stats = Arc::new(SyncStats::new());
        let signal = DirtySignal::new(Arc::clone(&stats));
        let (tx, rx) = mpsc::channel(8);
        let dispatcher = Dispatcher::new(Arc::clone(&store), signal.clone(), Arc::clone(&stats), rx);
        (store, signal, stats, tx, dispatcher)
    }

    #[tokio::test]
    async fn test_apply_raises_signal_and_replies() {
        let (store, signal, stats, _tx, dispatcher) = setup();

        let (command, reply) = Command::apply(StateUpdate::new().with_scores(5, 3), "test");
        dispatcher.handle(command);

        let outcome = reply.await.unwrap().unwrap();
        assert_eq!(outcome.fields_applied, 2);
        assert!(outcome.changed);
        assert!(signal.is_raised());
        assert_eq!(store.snapshot().team(Team::A).score, 5);
        assert_eq!(stats.snapshot().updates_applied, 1);
    }

    #[tokio::test]
    async fn test_unchanged_update_does_not_raise() {
        let (_store, signal, _stats, _tx, dispatcher) = setup();

        let (command, reply) = Command::apply(StateUpdate::new().with_scores(0, 0), "test");
        dispatcher.handle(command);

        assert!(!reply.await.unwrap().unwrap().changed);
        assert!(!signal.is_raised());
    }

    #[tokio::test]
    async fn test_rejection_replies_error() {
        let (store, signal, stats, _tx, dispatcher) = setup();

        let (command, reply) = Command::apply(StateUpdate::new().with_serving("C"), "test");
        dispatcher.handle(command);

        let err = reply.await.unwrap().unwrap_err();
        assert_eq!(err, ValidationError::InvalidServing("C".into()));
        assert!(!signal.is_raised());
        assert_eq!(store.snapshot().serving, Team::A);
        assert_eq!(stats.snapshot().updates_rejected, 1);
    }

    #[tokio::test]
    async fn test_partial_rejection_broadcasts_committed_fields() {
        let (store, signal, _stats, _tx, dispatcher) = setup();

        let update = StateUpdate::new().with_scores(9, 8).with_best_of(4);
        let (command, reply) = Command::apply(update, "test");
        dispatcher.handle(command);

        assert!(reply.await.unwrap().is_err());
        assert!(signal.is_raised());
        assert_eq!(store.snapshot().team(Team::A).score, 9);
    }

    #[test]
    fn test_wireless_presence() {
        let (store, signal, _stats, _tx, dispatcher) = setup();

        dispatcher.handle(Command::WirelessPresence(true));
        assert!(store.snapshot().wireless_connected);
        assert!(signal.take());

        dispatcher.handle(Command::WirelessPresence(true));
        assert!(!signal.is_raised());
    }

    #[tokio::test]
    async fn test_submit_through_queue() {
        let (store, _signal, _stats, tx, dispatcher) = setup();
        let runner = tokio::spawn(dispatcher.run());

        let reply = submit(&tx, StateUpdate::new().with_best_of(5), "test")
            .await
            .unwrap();
        assert!(reply.unwrap().changed);
        assert_eq!(store.snapshot().best_of.sets(), 5);

        drop(tx);
        runner.await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_fails() {
        let (_store, _signal, _stats, tx, dispatcher) = setup();
        drop(dispatcher);

        let err = submit(&tx, StateUpdate::new(), "test").await.unwrap_err();
        assert!(matches!(err, Error::ChannelClosed));
    }
}
