//! Envelope encoder and decoder
//!
//! Every message on every transport is a JSON object of the form:
//!
//! ```text
//! { "type": "state" | "ack" | "error" | ..., "data": { ... } }
//! ```
//!
//! Server to client: `state` (full state), `ack`, `error`.
//! Client to server: `state` (partial update). Other types are ignored.

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use super::update::StateUpdate;
use crate::error::DecodeError;
use crate::state::{LogEntry, MatchState, Team};

/// Envelope type tag for state messages (both directions)
pub const TYPE_STATE: &str = "state";
/// Envelope type tag for mutation acknowledgements
pub const TYPE_ACK: &str = "ack";
/// Envelope type tag for error reports
pub const TYPE_ERROR: &str = "error";

/// Classified envelope type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    State,
    Ack,
    Error,
    Other,
}

impl MessageType {
    /// Classify a `type` tag
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            TYPE_STATE => MessageType::State,
            TYPE_ACK => MessageType::Ack,
            TYPE_ERROR => MessageType::Error,
            _ => MessageType::Other,
        }
    }
}

/// Error code carried in an `error` envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCode {
    /// Malformed or incomplete bytes
    Parse,
    /// A field violated a hard domain constraint
    Validation,
}

/// A decoded inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Partial update to apply
    StateUpdate(StateUpdate),
    /// Any other envelope type; ignored
    Unrecognized(String),
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    #[serde(rename = "type")]
    kind: &'a str,
    data: T,
}

#[derive(Serialize)]
struct AckData {
    ok: bool,
}

#[derive(Serialize)]
struct ErrorData<'a> {
    code: ErrorCode,
    msg: &'a str,
}

/// Borrowed wire view of the full state
#[derive(Serialize)]
struct StateData<'a> {
    ta: &'a str,
    tb: &'a str,
    ca: &'a str,
    cb: &'a str,
    abg: &'a str,
    bbg: &'a str,
    a: u8,
    b: u8,
    sv: &'static str,
    set: u8,
    ma: u8,
    mb: u8,
    bo: u8,
    ble: bool,
    ra: &'a [String],
    rb: &'a [String],
    rsa: u8,
    rsb: u8,
    la: &'a [LogEntry],
    lb: &'a [LogEntry],
}

impl<'a> From<&'a MatchState> for StateData<'a> {
    fn from(state: &'a MatchState) -> Self {
        let a = state.team(Team::A);
        let b = state.team(Team::B);
        Self {
            ta: &a.name,
            tb: &b.name,
            ca: &a.color,
            cb: &b.color,
            abg: &a.background,
            bbg: &b.background,
            a: a.score,
            b: b.score,
            sv: state.serving.code(),
            set: state.set_number,
            ma: a.sets_won,
            mb: b.sets_won,
            bo: state.best_of.sets(),
            ble: state.wireless_connected,
            ra: &a.rotation,
            rb: &b.rotation,
            rsa: a.server_slot,
            rsb: b.server_slot,
            la: a.recent.entries(),
            lb: b.recent.entries(),
        }
    }
}

fn to_bytes<T: Serialize>(kind: &str, data: T) -> Bytes {
    // Serializing plain structs of strings and integers into a Vec cannot fail
    let json = serde_json::to_vec(&Envelope { kind, data }).unwrap_or_default();
    Bytes::from(json)
}

/// Encode the full state as a `state` envelope
pub fn encode_state(state: &MatchState) -> Bytes {
    to_bytes(TYPE_STATE, StateData::from(state))
}

/// Encode a partial update as a client-side `state` envelope
pub fn encode_update(update: &StateUpdate) -> Bytes {
    to_bytes(TYPE_STATE, update)
}

/// Encode a successful mutation acknowledgement
pub fn encode_ack() -> Bytes {
    to_bytes(TYPE_ACK, AckData { ok: true })
}

/// Encode an error report
pub fn encode_error(code: ErrorCode, msg: &str) -> Bytes {
    to_bytes(TYPE_ERROR, ErrorData { code, msg })
}

/// Decode an inbound envelope
///
/// Returns [`DecodeError::Incomplete`] when the bytes are a valid prefix of a
/// JSON document (the caller should wait for more), and
/// [`DecodeError::Malformed`] otherwise.
pub fn decode(bytes: &[u8]) -> Result<Inbound, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Incomplete);
    }

    let value: Value = serde_json::from_slice(bytes).map_err(|e| {
        if e.is_eof() {
            DecodeError::Incomplete
        } else {
            DecodeError::Malformed(e.to_string())
        }
    })?;

    let Value::Object(mut envelope) = value else {
        return Err(DecodeError::Malformed("envelope is not an object".into()));
    };

    // A missing type tag is treated as a state update
    let tag = envelope
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or(TYPE_STATE)
        .to_owned();

    match MessageType::from_tag(&tag) {
        MessageType::State => {
            let update = match envelope.remove("data") {
                Some(Value::Object(data)) => StateUpdate::from_object(&data),
                _ => StateUpdate::default(),
            };
            Ok(Inbound::StateUpdate(update))
        }
        _ => Ok(Inbound::Unrecognized(tag)),
    }
}
