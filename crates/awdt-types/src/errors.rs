//! # Error Types
//!
//! Errors raised while building, stepping or (de)serializing envelopes.

use thiserror::Error;

/// Errors from envelope construction and cursor movement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Cursor points past the end of the history.
    #[error("Cursor {cursor} exceeds history length {len}")]
    CursorOutOfRange { cursor: usize, len: usize },

    /// Rewind requested on an envelope with no hop to undo.
    #[error("Cannot rewind an envelope at cursor 0")]
    CannotRewind,

    /// Scenario id outside 1..=8.
    #[error("Invalid scenario: {0} (expected 1-8)")]
    InvalidScenario(u8),

    /// Unrecognised signature variant name.
    #[error("Unknown signature variant: {0}")]
    UnknownVariant(String),

    /// Unrecognised crypto mode name.
    #[error("Unknown crypto mode: {0}")]
    UnknownCryptoMode(String),

    /// Unrecognised hash algorithm name.
    #[error("Unknown hash algorithm: {0}")]
    UnknownHashAlgorithm(String),
}

/// Errors from the wire document.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Failed to encode envelope: {0}")]
    Encode(String),

    #[error("Failed to decode envelope: {0}")]
    Decode(String),

    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

impl From<serde_json::Error> for WireError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            WireError::Decode(e.to_string())
        } else {
            WireError::Encode(e.to_string())
        }
    }
}
