//! # Transport Layer
//!
//! The socket side of the client, behind one trait.
//!
//! ## Design
//!
//! - TCP control channel carries every packet type and is the only
//!   disconnect signal
//! - Optional UDP channel for high-frequency position packets, negotiated
//!   after connect with `UdpInit` / `HolePunch`
//! - Sends are queued to a writer thread so game ticks never block on I/O
//! - Receives block until one whole frame is available

mod channel;
mod tcp;

pub use channel::{ChannelTransport, ServerEnd};
pub use tcp::TcpTransport;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::NetResult;
use crate::protocol::{Frame, Packet};

/// Connection state reported for the debug overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TransportState {
    /// Never connected, or closed cleanly.
    #[default]
    Idle = 0,
    /// Socket connect in progress.
    Connecting = 1,
    /// Control channel is up.
    Connected = 2,
    /// Control channel failed or was closed by the peer.
    Disconnected = 3,
}

impl TransportState {
    /// Decodes the stored discriminant.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Disconnected,
            _ => Self::Idle,
        }
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
            Self::Disconnected => "Socket Disconnected",
        })
    }
}

/// Packets waiting in each direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueDepths {
    /// Queued for sending.
    pub send: usize,
    /// Received but not yet taken by the dispatch loop.
    pub receive: usize,
}

/// Transport statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Packets sent.
    pub packets_sent: u64,
    /// Packets received.
    pub packets_received: u64,
    /// Bytes sent.
    pub bytes_sent: u64,
    /// Bytes received.
    pub bytes_received: u64,
    /// Send errors.
    pub send_errors: u64,
    /// Receive errors.
    pub recv_errors: u64,
}

/// Lock-free counters behind [`TransportStats`].
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    packets_sent: AtomicU64,
    packets_received: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    send_errors: AtomicU64,
    recv_errors: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_send(&self, bytes: usize) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_receive(&self, bytes: usize) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_send_error(&self) {
        self.send_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_recv_error(&self) {
        self.recv_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> TransportStats {
        TransportStats {
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            packets_received: self.packets_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            recv_errors: self.recv_errors.load(Ordering::Relaxed),
        }
    }
}

/// A connection to the relay server.
///
/// Shared between the read thread (`try_receive_packet`) and the game thread
/// (everything else), so every method takes `&self`.
pub trait Transport: Send + Sync {
    /// Opens the control channel. Replaces any previous session.
    fn init(&self, host: &str, port: u16) -> NetResult<()>;

    /// Blocks until one whole frame arrives.
    ///
    /// Errors are transport faults except for malformed frames, which the
    /// caller can skip.
    fn try_receive_packet(&self) -> NetResult<Frame>;

    /// Queues a packet for the writer. Never blocks.
    fn queue_packet(&self, packet: Packet) -> NetResult<()>;

    /// Writes a packet on the control channel immediately.
    fn send(&self, packet: &Packet) -> NetResult<()>;

    /// Sends a packet over UDP. Silently skipped when UDP is not negotiated.
    fn send_udp(&self, packet: &Packet) -> NetResult<()>;

    /// Records the server's UDP port from `UdpInit`.
    fn set_peer_udp_port(&self, port: u16);

    /// Local UDP port, or `None` when UDP is disabled.
    fn local_udp_port(&self) -> Option<u16>;

    /// Current state.
    fn state(&self) -> TransportState;

    /// Queue depths in both directions.
    fn queue_depths(&self) -> QueueDepths;

    /// Counters since construction.
    fn stats(&self) -> TransportStats;

    /// Closes the session. A blocked `try_receive_packet` returns an error.
    fn close(&self);
}
