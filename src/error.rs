//! Error types
//!
//! Leaf errors for decoding and validation, aggregated into [`Error`] for
//! the runtime.

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to decode an inbound envelope
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Bytes are a valid prefix; wait for more before retrying
    #[error("incomplete")]
    Incomplete,
    /// Bytes can never form a valid envelope; discard them
    #[error("parse error: {0}")]
    Malformed(String),
}

impl DecodeError {
    /// Whether the caller should keep its buffer and wait for more bytes
    pub fn is_incomplete(&self) -> bool {
        matches!(self, DecodeError::Incomplete)
    }
}

/// A field value outside its legal domain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `sv` was not `"A"` or `"B"`
    #[error("sv must be 'A' or 'B'")]
    InvalidServing(String),
    /// `bo` was not 3 or 5
    #[error("bo must be 3 or 5")]
    InvalidBestOf(i64),
}

impl ValidationError {
    /// Wire code of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidServing(_) => "sv",
            ValidationError::InvalidBestOf(_) => "bo",
        }
    }
}

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A sink's downstream consumer has gone away
    #[error("sink closed: {0}")]
    SinkClosed(&'static str),

    /// The inbound command channel or a reply channel was dropped
    #[error("channel closed")]
    ChannelClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        assert_eq!(DecodeError::Incomplete.to_string(), "incomplete");
        assert_eq!(
            DecodeError::Malformed("expected value".into()).to_string(),
            "parse error: expected value"
        );
        assert!(DecodeError::Incomplete.is_incomplete());
        assert!(!DecodeError::Malformed(String::new()).is_incomplete());
    }

    #[test]
    fn test_validation_error_fields() {
        assert_eq!(ValidationError::InvalidServing("C".into()).field(), "sv");
        assert_eq!(ValidationError::InvalidBestOf(4).field(), "bo");
        assert_eq!(ValidationError::InvalidBestOf(4).to_string(), "bo must be 3 or 5");
    }

    #[test]
    fn test_error_conversions() {
        let err: Error = DecodeError::Incomplete.into();
        assert!(matches!(err, Error::Decode(DecodeError::Incomplete)));
        assert_eq!(err.to_string(), "incomplete");

        let err: Error = ValidationError::InvalidBestOf(2).into();
        assert_eq!(err.to_string(), "bo must be 3 or 5");
    }
}
