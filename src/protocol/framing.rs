//! Fragment reassembly for MTU-bounded transports
//!
//! The wireless link delivers one envelope across several writes. The
//! assembler appends each fragment and retries the decode:
//!
//! ```text
//! push(chunk) ──► decode(buffer)
//!                  ├─ Ok(msg)         → reset, return Some(msg)
//!                  ├─ Incomplete      → keep buffer, return None
//!                  └─ Malformed(err)  → reset, return Err
//! ```

use bytes::BytesMut;

use super::envelope::{decode, Inbound};
use crate::error::DecodeError;

/// Default cap on buffered bytes before the stream is declared malformed
///
/// Controllers resend the full state on every point, including both event
/// logs, which they never trim. A long five-set match runs to a few hundred
/// entries at roughly 60 bytes each.
pub const DEFAULT_MAX_BUFFER: usize = 64 * 1024;

/// Initial buffer allocation
const INITIAL_CAPACITY: usize = 1024;

/// Accumulates fragments until a complete envelope decodes
#[derive(Debug)]
pub struct FragmentAssembler {
    buffer: BytesMut,
    max_buffer: usize,
}

impl FragmentAssembler {
    /// Create an assembler with the default buffer cap
    pub fn new() -> Self {
        Self::with_max_buffer(DEFAULT_MAX_BUFFER)
    }

    /// Create an assembler with a custom buffer cap
    pub fn with_max_buffer(max_buffer: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(max_buffer.min(INITIAL_CAPACITY)),
            max_buffer: max_buffer.max(1),
        }
    }

    /// Append a fragment and try to decode the accumulated bytes
    ///
    /// `Ok(None)` means the envelope is still incomplete.
    pub fn push(&mut self, fragment: &[u8]) -> Result<Option<Inbound>, DecodeError> {
        if self.buffer.len() + fragment.len() > self.max_buffer {
            let size = self.buffer.len() + fragment.len();
            self.reset();
            return Err(DecodeError::Malformed(format!(
                "buffered message exceeds {} bytes ({})",
                self.max_buffer, size
            )));
        }

        self.buffer.extend_from_slice(fragment);

        match decode(&self.buffer) {
            Ok(msg) => {
                self.reset();
                Ok(Some(msg))
            }
            Err(DecodeError::Incomplete) => Ok(None),
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// Discard any buffered bytes
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Number of buffered bytes
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for FragmentAssembler {
    fn default() -> Self {
        Self::new()
    }
}
