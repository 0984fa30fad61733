//! # Sync Error Types
//!
//! Transport and protocol faults. Logical faults (missing puppet slot,
//! unresolved name) are not errors: handlers log them and drop the effect.

use thiserror::Error;

/// Errors that can occur in the sync layer.
#[derive(Error, Debug)]
pub enum NetError {
    /// Socket-level failure.
    #[error("transport i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the control connection.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// Operation needs a live connection.
    #[error("not connected")]
    NotConnected,

    /// Header carried a type tag outside the known range.
    #[error("unknown packet type {0}")]
    UnknownPacketType(i16),

    /// Buffer ended before the fixed layout was complete.
    #[error("truncated packet: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes the layout requires.
        needed: usize,
        /// Bytes actually present.
        available: usize,
    },

    /// Header payload length disagrees with the fixed size for its type.
    #[error("payload length mismatch for {packet_type}: expected {expected}, got {actual}")]
    PayloadMismatch {
        /// Human-readable packet type.
        packet_type: &'static str,
        /// Fixed body size for the type.
        expected: usize,
        /// Length announced by the header.
        actual: usize,
    },

    /// Header announced a payload that cannot fit in a packet.
    #[error("oversized payload: {0} bytes")]
    Oversized(usize),

    /// Connection attempts exhausted.
    #[error("gave up connecting after {0} attempts")]
    ConnectAttemptsExhausted(u32),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NetError {
    /// True for faults that end the connection.
    ///
    /// Protocol faults only cost the offending packet.
    #[must_use]
    pub const fn is_transport_fault(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::ConnectionClosed | Self::NotConnected | Self::Oversized(_)
        )
    }
}

/// Result type for sync operations.
pub type NetResult<T> = Result<T, NetError>;
