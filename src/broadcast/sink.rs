//! Sink capability
//!
//! Anything that consumes committed state implements [`StateSink`]. Delivery
//! happens only on the broadcaster task, never on a writer's context.

use crate::error::Result;

use super::frame::StateFrame;

/// A consumer of fan-out passes
///
/// Implementations must hand the frame off without waiting on a slow peer
/// (queue it, or drop it when backlogged): the next pass carries a complete
/// state, so a dropped frame is never a lost update.
pub trait StateSink: Send + Sync {
    /// Deliver one frame
    fn deliver(&self, frame: &StateFrame) -> Result<()>;
}
