//! Error types for the message-passing environment.

use crate::types::{MessageTag, Rank};
use thiserror::Error;

/// Errors that can occur while moving envelopes between ranks.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Destination or source rank outside `0..size`
    #[error("Rank {rank} out of range for a ring of {size}")]
    RankOutOfRange { rank: Rank, size: usize },

    /// The peer went away (task aborted, process exited, socket closed)
    #[error("Peer closed: {0}")]
    PeerClosed(Rank),

    /// A receive found a different protocol step than the one it expected
    #[error("Unexpected tag from {from}: expected {expected:?}, got {got:?}")]
    UnexpectedTag {
        from: Rank,
        expected: MessageTag,
        got: MessageTag,
    },

    /// Malformed frame on a socket
    #[error("Frame error: {0}")]
    Frame(String),

    /// Connection setup failed
    #[error("Connect error: {0}")]
    Connect(String),

    /// Socket I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EnvError {
    /// Creates a frame error.
    pub fn frame(msg: impl Into<String>) -> Self {
        Self::Frame(msg.into())
    }
}
