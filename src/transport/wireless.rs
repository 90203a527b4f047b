//! Wireless controller link
//!
//! Models the two-characteristic wireless service: controllers write envelope
//! fragments to one and receive notifications on the other. Writes are
//! reassembled by a [`FragmentAssembler`] owned by this link, decoded, and
//! forwarded to the dispatcher. Errors go back to the writer as `error`
//! envelopes on the notify channel and are never broadcast.

use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::broadcast::{StateFrame, StateSink};
use crate::error::{DecodeError, Error, Result};
use crate::protocol::{encode_error, ErrorCode, FragmentAssembler, Inbound};
use crate::server::dispatch::{submit, Command};
use crate::stats::SyncStats;

const ORIGIN: &str = "wireless";

/// Input side of the wireless link
#[derive(Debug)]
pub struct WirelessLink {
    inbound: mpsc::Sender<Command>,
    notify: mpsc::Sender<Bytes>,
    assembler: Mutex<FragmentAssembler>,
    stats: Arc<SyncStats>,
}

impl WirelessLink {
    /// Create a link and the receiving end of its notify characteristic
    pub fn new(
        inbound: mpsc::Sender<Command>,
        stats: Arc<SyncStats>,
        notify_capacity: usize,
        max_fragment_buffer: usize,
    ) -> (Self, mpsc::Receiver<Bytes>) {
        let (notify, notify_rx) = mpsc::channel(notify_capacity.max(1));
        let link = Self {
            inbound,
            notify,
            assembler: Mutex::new(FragmentAssembler::with_max_buffer(max_fragment_buffer)),
            stats,
        };
        (link, notify_rx)
    }

    /// Sink that pushes every fan-out pass to the notify characteristic
    pub fn sink(&self) -> WirelessNotifySink {
        WirelessNotifySink {
            notify: self.notify.clone(),
        }
    }

    /// Controller connected
    pub async fn on_connect(&self) -> Result<()> {
        tracing::info!("Wireless controller connected");
        self.inbound
            .send(Command::WirelessPresence(true))
            .await
            .map_err(|_| Error::ChannelClosed)
    }

    /// Controller disconnected; any partial message is discarded
    pub async fn on_disconnect(&self) -> Result<()> {
        self.assembler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
        tracing::info!("Wireless controller disconnected");
        self.inbound
            .send(Command::WirelessPresence(false))
            .await
            .map_err(|_| Error::ChannelClosed)
    }

    /// Handle one write to the input characteristic
    pub async fn on_write(&self, chunk: &[u8]) -> Result<()> {
        // The guard must be gone before the first await
        let decoded = self
            .assembler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(chunk);

        let update = match decoded {
            Ok(None) | Err(DecodeError::Incomplete) => return Ok(()),
            Ok(Some(Inbound::StateUpdate(update))) => update,
            Ok(Some(Inbound::Unrecognized(kind))) => {
                tracing::debug!(kind = %kind, "Ignoring wireless message");
                return Ok(());
            }
            Err(e) => {
                self.stats.record_decode_error();
                tracing::warn!(error = %e, "Malformed wireless message");
                self.notify_error(ErrorCode::Parse, &e.to_string());
                return Ok(());
            }
        };

        if let Err(e) = submit(&self.inbound, update, ORIGIN).await? {
            self.notify_error(ErrorCode::Validation, &e.to_string());
        }
        Ok(())
    }

    fn notify_error(&self, code: ErrorCode, msg: &str) {
        if let Err(e) = self.notify.try_send(encode_error(code, msg)) {
            tracing::warn!(error = %e, "Dropped wireless error notification");
        }
    }
}

/// Output side of the wireless link
#[derive(Debug, Clone)]
pub struct WirelessNotifySink {
    notify: mpsc::Sender<Bytes>,
}

impl StateSink for WirelessNotifySink {
    fn deliver(&self, frame: &StateFrame) -> Result<()> {
        match self.notify.try_send(frame.payload.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                // The next pass carries a newer full state
                tracing::warn!(pass = frame.seq, "Wireless notify queue full, dropping frame");
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(Error::SinkClosed("wireless")),
        }
    }
}
