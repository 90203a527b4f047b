//! Broadcast frame and sink ordering types

use std::sync::Arc;

use bytes::Bytes;

use crate::protocol::encode_state;
use crate::state::MatchState;

/// Sink slot; fan-out visits slots in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SinkKind {
    /// Local display
    Render,
    /// Wireless notify characteristic
    Wireless,
    /// HTTP push-stream clients
    PushStream,
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkKind::Render => f.write_str("render"),
            SinkKind::Wireless => f.write_str("wireless"),
            SinkKind::PushStream => f.write_str("push-stream"),
        }
    }
}

/// One fan-out pass worth of state
///
/// Cheap to clone: the snapshot sits behind an `Arc` and the encoded envelope
/// is reference-counted `Bytes`, so every sink shares one encoding.
#[derive(Debug, Clone)]
pub struct StateFrame {
    /// Pass sequence number, starting at 1
    pub seq: u64,
    /// Snapshot the payload was encoded from
    pub state: Arc<MatchState>,
    /// Encoded `state` envelope
    pub payload: Bytes,
}

impl StateFrame {
    /// Encode a snapshot into a frame
    pub fn new(seq: u64, state: MatchState) -> Self {
        let payload = encode_state(&state);
        Self {
            seq,
            state: Arc::new(state),
            payload,
        }
    }
}
