//! Error types for the server
//!
//! Illegal moves are not errors at this level. They are reported back to the
//! player as [`shared::IllegalMoveReason`] and the game continues.

use std::time::Duration;
use thiserror::Error;

/// A client broke the protocol; its connection is closed
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("line longer than {max} bytes")]
    LineTooLong { max: usize },

    #[error("message is not valid UTF-8")]
    InvalidUtf8,

    #[error("expected a join message first")]
    ExpectedJoin,

    #[error("display name must be 1 to {max} printable characters")]
    BadName { max: usize },

    #[error("no join message within {0:?}")]
    HandshakeTimeout(Duration),

    /// A message that is valid in general but not in the current phase
    #[error("'{message}' is not allowed {phase}")]
    OutOfSequence {
        message: &'static str,
        phase: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
