//! In-memory transport.
//!
//! The client side implements [`Transport`]; the [`ServerEnd`] plays the relay
//! server. Inbound traffic is raw encoded bytes so tests can inject malformed
//! or unknown frames exactly as a socket would deliver them.

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{select, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::debug;

use super::{QueueDepths, StatsCounters, Transport, TransportState, TransportStats};
use crate::error::{NetError, NetResult};
use crate::protocol::{encode, Frame, Packet};

/// Client half of an in-memory connection.
pub struct ChannelTransport {
    inbound: Receiver<Vec<u8>>,
    outbound: Sender<Packet>,
    shutdown: Mutex<Option<Sender<()>>>,
    shutdown_rx: Mutex<Receiver<()>>,
    refusals: Arc<AtomicU32>,
    connected: AtomicBool,
    state: AtomicU8,
    peer_udp_port: AtomicU16,
    udp_port: Option<u16>,
    stats: StatsCounters,
}

/// Server half of an in-memory connection.
pub struct ServerEnd {
    inbound: Sender<Vec<u8>>,
    outbound: Receiver<Packet>,
    refusals: Arc<AtomicU32>,
}

impl ChannelTransport {
    /// Creates a connected pair. `udp_port` is what the client reports as its
    /// local UDP port; `None` disables UDP.
    #[must_use]
    pub fn pair(udp_port: Option<u16>) -> (Self, ServerEnd) {
        let (inbound_tx, inbound_rx) = unbounded();
        let (outbound_tx, outbound_rx) = unbounded();
        let (shutdown_tx, shutdown_rx) = unbounded();
        let refusals = Arc::new(AtomicU32::new(0));

        let client = Self {
            inbound: inbound_rx,
            outbound: outbound_tx,
            shutdown: Mutex::new(Some(shutdown_tx)),
            shutdown_rx: Mutex::new(shutdown_rx),
            refusals: Arc::clone(&refusals),
            connected: AtomicBool::new(false),
            state: AtomicU8::new(TransportState::Idle as u8),
            peer_udp_port: AtomicU16::new(0),
            udp_port,
            stats: StatsCounters::default(),
        };
        let server = ServerEnd {
            inbound: inbound_tx,
            outbound: outbound_rx,
            refusals,
        };
        (client, server)
    }

    /// Server UDP port recorded from `UdpInit`, 0 if none.
    #[must_use]
    pub fn peer_udp_port(&self) -> u16 {
        self.peer_udp_port.load(Ordering::Acquire)
    }

    fn set_state(&self, state: TransportState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn push(&self, packet: Packet) -> NetResult<()> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(NetError::NotConnected);
        }
        self.outbound.send(packet).map_err(|_| NetError::ConnectionClosed)?;
        self.stats.record_send(packet.wire_size());
        Ok(())
    }
}

impl Transport for ChannelTransport {
    fn init(&self, host: &str, port: u16) -> NetResult<()> {
        self.set_state(TransportState::Connecting);
        let refused = self
            .refusals
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            self.set_state(TransportState::Disconnected);
            return Err(NetError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("{host}:{port} refused"),
            )));
        }

        let mut shutdown = self.shutdown.lock();
        if shutdown.is_none() {
            let (tx, rx) = unbounded();
            *shutdown = Some(tx);
            *self.shutdown_rx.lock() = rx;
        }
        self.peer_udp_port.store(0, Ordering::Release);
        self.connected.store(true, Ordering::Release);
        self.set_state(TransportState::Connected);
        debug!(host, port, "in-memory session open");
        Ok(())
    }

    fn try_receive_packet(&self) -> NetResult<Frame> {
        let shutdown = self.shutdown_rx.lock().clone();
        select! {
            recv(self.inbound) -> bytes => match bytes {
                Ok(bytes) => {
                    self.stats.record_receive(bytes.len());
                    Frame::from_bytes(&bytes)
                }
                Err(_) => {
                    self.connected.store(false, Ordering::Release);
                    self.set_state(TransportState::Disconnected);
                    Err(NetError::ConnectionClosed)
                }
            },
            recv(shutdown) -> _ => Err(NetError::ConnectionClosed),
        }
    }

    fn queue_packet(&self, packet: Packet) -> NetResult<()> {
        self.push(packet)
    }

    fn send(&self, packet: &Packet) -> NetResult<()> {
        self.push(*packet)
    }

    fn send_udp(&self, packet: &Packet) -> NetResult<()> {
        if self.udp_port.is_none() || self.peer_udp_port() == 0 {
            return Ok(());
        }
        self.push(*packet)
    }

    fn set_peer_udp_port(&self, port: u16) {
        self.peer_udp_port.store(port, Ordering::Release);
    }

    fn local_udp_port(&self) -> Option<u16> {
        self.udp_port
    }

    fn state(&self) -> TransportState {
        TransportState::from_raw(self.state.load(Ordering::Acquire))
    }

    fn queue_depths(&self) -> QueueDepths {
        QueueDepths {
            send: self.outbound.len(),
            receive: self.inbound.len(),
        }
    }

    fn stats(&self) -> TransportStats {
        self.stats.snapshot()
    }

    fn close(&self) {
        self.connected.store(false, Ordering::Release);
        self.shutdown.lock().take();
        self.set_state(TransportState::Idle);
    }
}

impl ServerEnd {
    /// Sends a packet to the client.
    pub fn send(&self, packet: &Packet) -> NetResult<()> {
        self.send_raw(encode(packet)?)
    }

    /// Sends raw bytes to the client, one frame per call.
    pub fn send_raw(&self, bytes: Vec<u8>) -> NetResult<()> {
        self.inbound.send(bytes).map_err(|_| NetError::ConnectionClosed)
    }

    /// Waits for the next packet from the client.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Packet> {
        match self.outbound.recv_timeout(timeout) {
            Ok(packet) => Some(packet),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Everything the client has sent so far.
    #[must_use]
    pub fn drain(&self) -> Vec<Packet> {
        self.outbound.try_iter().collect()
    }

    /// Makes the next `count` connection attempts fail.
    pub fn refuse_connections(&self, count: u32) {
        self.refusals.store(count, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{PacketBody, UdpInit};
    use odyssey_shared::PlayerId;

    #[test]
    fn test_pair_roundtrip() {
        let (client, server) = ChannelTransport::pair(Some(4000));
        client.init("relay", 1027).unwrap();

        let packet = Packet::new(PlayerId::from_u128(5), PacketBody::UdpInit(UdpInit { port: 55 }));
        server.send(&packet).unwrap();
        assert_eq!(client.try_receive_packet().unwrap().decode().unwrap(), packet);

        client.queue_packet(packet).unwrap();
        assert_eq!(server.drain(), vec![packet]);
    }

    #[test]
    fn test_refusals_then_connect() {
        let (client, server) = ChannelTransport::pair(None);
        server.refuse_connections(2);

        assert!(client.init("relay", 1027).is_err());
        assert!(client.init("relay", 1027).is_err());
        assert!(client.init("relay", 1027).is_ok());
        assert_eq!(client.state(), TransportState::Connected);
    }

    #[test]
    fn test_dropped_server_closes() {
        let (client, server) = ChannelTransport::pair(None);
        client.init("relay", 1027).unwrap();
        drop(server);
        assert!(matches!(
            client.try_receive_packet(),
            Err(NetError::ConnectionClosed)
        ));
        assert_eq!(client.state(), TransportState::Disconnected);
    }

    #[test]
    fn test_close_unblocks_reader() {
        let (client, _server) = ChannelTransport::pair(None);
        client.init("relay", 1027).unwrap();
        client.close();
        assert!(client.try_receive_packet().is_err());
        assert!(client.queue_packet(Packet::new(PlayerId::NIL, PacketBody::HolePunch)).is_err());
    }

    #[test]
    fn test_udp_skipped_until_negotiated() {
        let (client, server) = ChannelTransport::pair(Some(4000));
        client.init("relay", 1027).unwrap();
        let punch = Packet::new(PlayerId::NIL, PacketBody::HolePunch);

        client.send_udp(&punch).unwrap();
        assert!(server.drain().is_empty());

        client.set_peer_udp_port(5000);
        client.send_udp(&punch).unwrap();
        assert_eq!(server.drain().len(), 1);
    }
}
