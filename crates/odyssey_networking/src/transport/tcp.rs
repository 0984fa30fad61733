//! TCP control channel with an optional UDP side channel.
//!
//! Each session owns three threads:
//!
//! ```text
//!   queue_packet ──► [send queue] ──► writer ──► TCP / UDP
//!
//!   TCP ──► tcp reader ──┐
//!                        ├──► [inbound] ──► try_receive_packet
//!   UDP ──► udp reader ──┘
//! ```
//!
//! Only the TCP reader reports disconnects. UDP errors are counted and
//! otherwise ignored.

use std::io::{self, BufReader, Write};
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use odyssey_shared::MAX_PACKET_SIZE;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{QueueDepths, StatsCounters, Transport, TransportState, TransportStats};
use crate::error::{NetError, NetResult};
use crate::protocol::{read_frame, Frame, Packet, PacketHeader, PacketSerializer};

/// Queued sends beyond this are dropped.
const SEND_QUEUE_CAPACITY: usize = 512;

/// How often the UDP reader checks for shutdown.
const UDP_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Command to the writer thread.
enum WriterCommand {
    /// Encode and send.
    Send(Packet),
    /// Stop after draining nothing further.
    Shutdown,
}

/// Message from a reader thread.
enum Inbound {
    Frame(Frame),
    Closed(NetError),
}

/// Sockets shared by the writer thread and the immediate-send path.
#[derive(Clone)]
struct Link {
    server_ip: IpAddr,
    control: Arc<Mutex<TcpStream>>,
    udp: Option<Arc<UdpSocket>>,
    peer_udp_port: Arc<AtomicU16>,
    stats: Arc<StatsCounters>,
}

impl Link {
    fn write_tcp(&self, bytes: &[u8]) -> io::Result<()> {
        self.control.lock().write_all(bytes)
    }

    /// Returns `false` when UDP is not negotiated yet.
    fn write_udp(&self, bytes: &[u8]) -> io::Result<bool> {
        let port = self.peer_udp_port.load(Ordering::Acquire);
        match &self.udp {
            Some(socket) if port != 0 => {
                socket.send_to(bytes, SocketAddr::new(self.server_ip, port))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn transmit(&self, packet: &Packet, serializer: &mut PacketSerializer, force_udp: bool) {
        if !serializer.serialize(packet) {
            self.stats.record_send_error();
            warn!(packet = packet.packet_type().name(), "packet does not fit send buffer");
            return;
        }
        let bytes = serializer.as_slice();

        let result = if force_udp || packet.packet_type().prefers_udp() {
            match self.write_udp(bytes) {
                Ok(true) => Ok(()),
                Ok(false) if force_udp => return,
                Ok(false) => self.write_tcp(bytes),
                Err(e) => Err(e),
            }
        } else {
            self.write_tcp(bytes)
        };

        match result {
            Ok(()) => self.stats.record_send(bytes.len()),
            Err(e) => {
                self.stats.record_send_error();
                debug!(error = %e, packet = packet.packet_type().name(), "send failed");
            }
        }
    }
}

struct Session {
    link: Link,
    commands: Sender<WriterCommand>,
    running: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

/// Socket transport to a relay server.
pub struct TcpTransport {
    udp_enabled: bool,
    session: Mutex<Option<Session>>,
    inbound_tx: Sender<Inbound>,
    inbound_rx: Receiver<Inbound>,
    peer_udp_port: Arc<AtomicU16>,
    state: Arc<AtomicU8>,
    stats: Arc<StatsCounters>,
}

impl TcpTransport {
    /// Creates an unconnected transport.
    #[must_use]
    pub fn new(udp_enabled: bool) -> Self {
        let (inbound_tx, inbound_rx) = unbounded();
        Self {
            udp_enabled,
            session: Mutex::new(None),
            inbound_tx,
            inbound_rx,
            peer_udp_port: Arc::new(AtomicU16::new(0)),
            state: Arc::new(AtomicU8::new(TransportState::Idle as u8)),
            stats: Arc::new(StatsCounters::default()),
        }
    }

    fn set_state(&self, state: TransportState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn bind_udp() -> Option<Arc<UdpSocket>> {
        let socket = match UdpSocket::bind(("0.0.0.0", 0)) {
            Ok(socket) => socket,
            Err(e) => {
                warn!(error = %e, "udp bind failed, continuing tcp-only");
                return None;
            }
        };
        if let Err(e) = socket.set_read_timeout(Some(UDP_POLL_INTERVAL)) {
            warn!(error = %e, "udp read timeout not supported, continuing tcp-only");
            return None;
        }
        Some(Arc::new(socket))
    }

    fn spawn_tcp_reader(
        &self,
        stream: TcpStream,
        running: Arc<AtomicBool>,
    ) -> io::Result<JoinHandle<()>> {
        let inbound = self.inbound_tx.clone();
        let state = Arc::clone(&self.state);
        let stats = Arc::clone(&self.stats);

        thread::Builder::new()
            .name("odyssey-recv-tcp".into())
            .spawn(move || {
                let mut reader = BufReader::new(stream);
                loop {
                    match read_frame(&mut reader) {
                        Ok(frame) => {
                            stats.record_receive(PacketHeader::SIZE + frame.payload().len());
                            if inbound.send(Inbound::Frame(frame)).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            if running.load(Ordering::Acquire) {
                                stats.record_recv_error();
                                state.store(TransportState::Disconnected as u8, Ordering::Release);
                                info!(error = %e, "control channel lost");
                            }
                            let _ = inbound.send(Inbound::Closed(e));
                            break;
                        }
                    }
                }
            })
    }

    fn spawn_udp_reader(
        &self,
        socket: Arc<UdpSocket>,
        server_ip: IpAddr,
        running: Arc<AtomicBool>,
    ) -> io::Result<JoinHandle<()>> {
        let inbound = self.inbound_tx.clone();
        let stats = Arc::clone(&self.stats);

        thread::Builder::new()
            .name("odyssey-recv-udp".into())
            .spawn(move || {
                let mut buffer = [0u8; MAX_PACKET_SIZE];
                while running.load(Ordering::Acquire) {
                    match socket.recv_from(&mut buffer) {
                        Ok((len, from)) if from.ip() == server_ip => {
                            match Frame::from_bytes(&buffer[..len]) {
                                Ok(frame) => {
                                    stats.record_receive(len);
                                    if inbound.send(Inbound::Frame(frame)).is_err() {
                                        break;
                                    }
                                }
                                Err(e) => {
                                    stats.record_recv_error();
                                    debug!(error = %e, "dropping malformed datagram");
                                }
                            }
                        }
                        Ok((_, from)) => debug!(%from, "ignoring datagram from unknown peer"),
                        Err(e)
                            if matches!(
                                e.kind(),
                                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                            ) => {}
                        Err(e) => {
                            stats.record_recv_error();
                            debug!(error = %e, "udp receive failed");
                        }
                    }
                }
            })
    }

    fn open_session(&self, host: &str, port: u16) -> NetResult<Session> {
        let addr = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            NetError::Io(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("{host}:{port} did not resolve"),
            ))
        })?;

        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let reader_stream = stream.try_clone()?;

        let udp = if self.udp_enabled { Self::bind_udp() } else { None };
        self.peer_udp_port.store(0, Ordering::Release);

        let link = Link {
            server_ip: addr.ip(),
            control: Arc::new(Mutex::new(stream)),
            udp: udp.clone(),
            peer_udp_port: Arc::clone(&self.peer_udp_port),
            stats: Arc::clone(&self.stats),
        };

        let running = Arc::new(AtomicBool::new(true));
        let (commands, command_rx) = bounded(SEND_QUEUE_CAPACITY);

        let writer_link = link.clone();
        let mut threads = vec![thread::Builder::new()
            .name("odyssey-send".into())
            .spawn(move || run_writer(&command_rx, &writer_link))?];
        threads.push(self.spawn_tcp_reader(reader_stream, Arc::clone(&running))?);
        if let Some(socket) = udp {
            threads.push(self.spawn_udp_reader(socket, addr.ip(), Arc::clone(&running))?);
        }

        info!(%addr, udp = link.udp.is_some(), "control channel open");
        Ok(Session {
            link,
            commands,
            running,
            threads,
        })
    }
}

fn run_writer(commands: &Receiver<WriterCommand>, link: &Link) {
    let mut serializer = PacketSerializer::new();
    for command in commands {
        match command {
            WriterCommand::Send(packet) => link.transmit(&packet, &mut serializer, false),
            WriterCommand::Shutdown => break,
        }
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Transport for TcpTransport {
    fn init(&self, host: &str, port: u16) -> NetResult<()> {
        self.close();
        while self.inbound_rx.try_recv().is_ok() {}

        self.set_state(TransportState::Connecting);
        match self.open_session(host, port) {
            Ok(session) => {
                *self.session.lock() = Some(session);
                self.set_state(TransportState::Connected);
                Ok(())
            }
            Err(e) => {
                self.set_state(TransportState::Disconnected);
                Err(e)
            }
        }
    }

    fn try_receive_packet(&self) -> NetResult<Frame> {
        match self.inbound_rx.recv() {
            Ok(Inbound::Frame(frame)) => Ok(frame),
            Ok(Inbound::Closed(e)) => Err(e),
            Err(_) => Err(NetError::ConnectionClosed),
        }
    }

    fn queue_packet(&self, packet: Packet) -> NetResult<()> {
        let guard = self.session.lock();
        let session = guard.as_ref().ok_or(NetError::NotConnected)?;
        match session.commands.try_send(WriterCommand::Send(packet)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.stats.record_send_error();
                warn!(packet = packet.packet_type().name(), "send queue full, dropping");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(NetError::NotConnected),
        }
    }

    fn send(&self, packet: &Packet) -> NetResult<()> {
        let guard = self.session.lock();
        let session = guard.as_ref().ok_or(NetError::NotConnected)?;
        let mut serializer = PacketSerializer::new();
        if !serializer.serialize(packet) {
            return Err(NetError::Oversized(packet.wire_size()));
        }
        session.link.write_tcp(serializer.as_slice())?;
        self.stats.record_send(serializer.len());
        Ok(())
    }

    fn send_udp(&self, packet: &Packet) -> NetResult<()> {
        let guard = self.session.lock();
        let session = guard.as_ref().ok_or(NetError::NotConnected)?;
        session.link.transmit(packet, &mut PacketSerializer::new(), true);
        Ok(())
    }

    fn set_peer_udp_port(&self, port: u16) {
        self.peer_udp_port.store(port, Ordering::Release);
    }

    fn local_udp_port(&self) -> Option<u16> {
        let guard = self.session.lock();
        let socket = guard.as_ref()?.link.udp.as_ref()?;
        socket.local_addr().ok().map(|addr| addr.port())
    }

    fn state(&self) -> TransportState {
        TransportState::from_raw(self.state.load(Ordering::Acquire))
    }

    fn queue_depths(&self) -> QueueDepths {
        QueueDepths {
            send: self.session.lock().as_ref().map_or(0, |s| s.commands.len()),
            receive: self.inbound_rx.len(),
        }
    }

    fn stats(&self) -> TransportStats {
        self.stats.snapshot()
    }

    fn close(&self) {
        let Some(session) = self.session.lock().take() else {
            return;
        };

        session.running.store(false, Ordering::Release);
        let _ = session.commands.try_send(WriterCommand::Shutdown);
        drop(session.commands);
        let _ = session.link.control.lock().shutdown(Shutdown::Both);

        for handle in session.threads {
            if handle.join().is_err() {
                warn!("transport thread panicked");
            }
        }
        self.set_state(TransportState::Idle);
        debug!("session closed");
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Init, PacketBody, PacketType, PlayerConnect};
    use odyssey_shared::PlayerId;
    use std::net::TcpListener;

    #[test]
    fn test_loopback_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let init = Packet::new(PlayerId::NIL, PacketBody::ClientInit(Init { max_players: 4 }));
            socket
                .write_all(&crate::protocol::encode(&init).unwrap())
                .unwrap();
            let frame = read_frame(&mut socket).unwrap();
            frame.decode().unwrap()
        });

        let transport = TcpTransport::new(false);
        transport.init("127.0.0.1", port).unwrap();
        assert_eq!(transport.state(), TransportState::Connected);
        assert_eq!(transport.local_udp_port(), None);

        let frame = transport.try_receive_packet().unwrap();
        assert_eq!(
            frame.decode().unwrap().body,
            PacketBody::ClientInit(Init { max_players: 4 })
        );

        let connect = Packet::new(
            PlayerId::from_u128(9),
            PacketBody::PlayerConnect(PlayerConnect::default()),
        );
        transport.queue_packet(connect).unwrap();

        let received = server.join().unwrap();
        assert_eq!(received.packet_type(), PacketType::PlayerConnect);
        assert_eq!(received.owner, PlayerId::from_u128(9));

        assert!(transport.try_receive_packet().is_err());
        transport.close();
        assert_eq!(transport.state(), TransportState::Idle);
    }

    #[test]
    fn test_refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = TcpTransport::new(false);
        let err = transport.init("127.0.0.1", port).unwrap_err();
        assert!(err.is_transport_fault());
        assert_eq!(transport.state(), TransportState::Disconnected);
        assert!(matches!(
            transport.queue_packet(Packet::new(PlayerId::NIL, PacketBody::HolePunch)),
            Err(NetError::NotConnected)
        ));
    }
}
