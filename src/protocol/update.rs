//! Partial state updates
//!
//! A client submits any subset of the two/three-letter field codes used by the
//! deployed protocol. Decoding is lenient: a field whose JSON type does not
//! match is treated as absent. Domain checks (`sv`, `bo`) are left to the
//! validator so it can report them.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::state::LogEntry;

/// Every field code a partial update may carry, in application order
pub const FIELD_CODES: [&str; 19] = [
    "ta", "tb", "ca", "cb", "abg", "bbg", "a", "b", "sv", "ra", "rb", "rsa", "rsb", "la", "lb",
    "set", "ma", "mb", "bo",
];

/// A partial update to the match state
///
/// Only `Some` fields are applied. Serializes back to the wire object with
/// absent fields omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateUpdate {
    #[serde(rename = "ta", skip_serializing_if = "Option::is_none")]
    pub team_a_name: Option<String>,
    #[serde(rename = "tb", skip_serializing_if = "Option::is_none")]
    pub team_b_name: Option<String>,
    #[serde(rename = "ca", skip_serializing_if = "Option::is_none")]
    pub team_a_color: Option<String>,
    #[serde(rename = "cb", skip_serializing_if = "Option::is_none")]
    pub team_b_color: Option<String>,
    #[serde(rename = "abg", skip_serializing_if = "Option::is_none")]
    pub team_a_background: Option<String>,
    #[serde(rename = "bbg", skip_serializing_if = "Option::is_none")]
    pub team_b_background: Option<String>,
    #[serde(rename = "a", skip_serializing_if = "Option::is_none")]
    pub team_a_score: Option<i64>,
    #[serde(rename = "b", skip_serializing_if = "Option::is_none")]
    pub team_b_score: Option<i64>,
    /// Raw serving code; anything but `"A"`/`"B"` is rejected by the validator
    #[serde(rename = "sv", skip_serializing_if = "Option::is_none")]
    pub serving: Option<String>,
    #[serde(rename = "ra", skip_serializing_if = "Option::is_none")]
    pub team_a_rotation: Option<Vec<String>>,
    #[serde(rename = "rb", skip_serializing_if = "Option::is_none")]
    pub team_b_rotation: Option<Vec<String>>,
    #[serde(rename = "rsa", skip_serializing_if = "Option::is_none")]
    pub team_a_server_slot: Option<i64>,
    #[serde(rename = "rsb", skip_serializing_if = "Option::is_none")]
    pub team_b_server_slot: Option<i64>,
    #[serde(rename = "la", skip_serializing_if = "Option::is_none")]
    pub team_a_events: Option<Vec<LogEntry>>,
    #[serde(rename = "lb", skip_serializing_if = "Option::is_none")]
    pub team_b_events: Option<Vec<LogEntry>>,
    #[serde(rename = "set", skip_serializing_if = "Option::is_none")]
    pub set_number: Option<i64>,
    #[serde(rename = "ma", skip_serializing_if = "Option::is_none")]
    pub team_a_sets_won: Option<i64>,
    #[serde(rename = "mb", skip_serializing_if = "Option::is_none")]
    pub team_b_sets_won: Option<i64>,
    /// Raw best-of count; anything but 3 or 5 is rejected by the validator
    #[serde(rename = "bo", skip_serializing_if = "Option::is_none")]
    pub best_of: Option<i64>,
}

impl StateUpdate {
    /// Create an empty update
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract an update from a decoded `data` object
    ///
    /// Unknown keys (including the outbound-only `ble`) are ignored.
    pub fn from_object(data: &Map<String, Value>) -> Self {
        Self {
            team_a_name: string_field(data, "ta"),
            team_b_name: string_field(data, "tb"),
            team_a_color: string_field(data, "ca"),
            team_b_color: string_field(data, "cb"),
            team_a_background: string_field(data, "abg"),
            team_b_background: string_field(data, "bbg"),
            team_a_score: int_field(data, "a"),
            team_b_score: int_field(data, "b"),
            serving: string_field(data, "sv"),
            team_a_rotation: rotation_field(data, "ra"),
            team_b_rotation: rotation_field(data, "rb"),
            team_a_server_slot: int_field(data, "rsa"),
            team_b_server_slot: int_field(data, "rsb"),
            team_a_events: events_field(data, "la"),
            team_b_events: events_field(data, "lb"),
            set_number: int_field(data, "set"),
            team_a_sets_won: int_field(data, "ma"),
            team_b_sets_won: int_field(data, "mb"),
            best_of: int_field(data, "bo"),
        }
    }

    /// Whether no field is present
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Number of present fields
    pub fn field_count(&self) -> usize {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.len(),
            _ => 0,
        }
    }

    /// Set both scores
    pub fn with_scores(mut self, a: i64, b: i64) -> Self {
        self.team_a_score = Some(a);
        self.team_b_score = Some(b);
        self
    }

    /// Set the serving code
    pub fn with_serving(mut self, code: impl Into<String>) -> Self {
        self.serving = Some(code.into());
        self
    }

    /// Set the best-of count
    pub fn with_best_of(mut self, sets: i64) -> Self {
        self.best_of = Some(sets);
        self
    }
}

fn string_field(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// Integral JSON numbers only; floats and strings are ignored
fn int_field(data: &Map<String, Value>, key: &str) -> Option<i64> {
    let value = data.get(key)?;
    value
        .as_i64()
        .or_else(|| value.as_u64().map(|v| i64::try_from(v).unwrap_or(i64::MAX)))
}

/// Non-string entries become empty labels
fn rotation_field(data: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let items = data.get(key)?.as_array()?;
    Some(
        items
            .iter()
            .map(|v| v.as_str().unwrap_or_default().to_owned())
            .collect(),
    )
}

/// Missing or mistyped entry members take their defaults
fn events_field(data: &Map<String, Value>, key: &str) -> Option<Vec<LogEntry>> {
    let items = data.get(key)?.as_array()?;
    Some(items.iter().map(log_entry).collect())
}

fn log_entry(value: &Value) -> LogEntry {
    let reason = value.get("reason").and_then(Value::as_str).unwrap_or_default();
    let scorer = value.get("scorer").and_then(Value::as_str).unwrap_or_default();
    let ts = value.get("ts").and_then(Value::as_u64).unwrap_or(0);
    LogEntry::new(reason, scorer, ts)
}
