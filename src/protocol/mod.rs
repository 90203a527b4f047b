//! Wire protocol
//!
//! JSON envelopes shared by every transport:
//!
//! - [`envelope`]: `{type, data}` encoder/decoder and message classification
//! - [`update`]: lenient partial-update extraction keyed by the deployed field codes
//! - [`framing`]: fragment reassembly distinguishing incomplete from malformed input

pub mod envelope;
pub mod framing;
pub mod update;

pub use envelope::{
    decode, encode_ack, encode_error, encode_state, encode_update, ErrorCode, Inbound,
    MessageType,
};
pub use framing::FragmentAssembler;
pub use update::{StateUpdate, FIELD_CODES};
