//! # Sync Client
//!
//! Owns the transport, the shared sync state and the read thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        SYNC CLIENT                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  read thread                        main thread             │
//! │  ┌──────────────┐                  ┌──────────────┐         │
//! │  │ connect      │                  │ update()     │         │
//! │  │ dispatch     │──▶ SyncState ◀───│  effects     │         │
//! │  │  (per packet │    (mutex)       │  shines      │         │
//! │  │   isolated)  │──▶ GameEffect ──▶│  outbound    │         │
//! │  └──────────────┘    (channel)     └──────────────┘         │
//! │         ▲                                 │                 │
//! │         └────────────  Transport  ◀───────┘                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The read thread exits on a transport fault. Reconnecting is the caller's
//! decision: [`Client::restart`] spawns a fresh read thread, which announces
//! itself with a `Reconnect` handshake and resends the cached outbound state.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use odyssey_shared::{FixedStr, PlayerId};
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::{NetError, NetResult};
use crate::host::{GameEffect, GameHost};
use crate::ledger::SaveData;
use crate::outbound::{Cadence, CadenceTick, OutboundCache};
use crate::protocol::{ConnectionType, Packet, PacketBody, PlayerConnect};
use crate::reconcile::{SyncState, MAX_PUPPETS};
use crate::transport::Transport;

/// Capacity announced in `PlayerConnect`: every puppet slot plus ourselves.
const ANNOUNCED_MAX_PLAYERS: u16 = MAX_PUPPETS as u16 + 1;

/// Connection lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// No session.
    #[default]
    Disconnected = 0,
    /// Opening the transport, retrying on failure.
    Connecting = 1,
    /// Handshake sent, waiting for the server's `ClientInit`.
    WaitingForInit = 2,
    /// Dispatching packets.
    Connected = 3,
}

impl ConnectionState {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Connecting,
            2 => Self::WaitingForInit,
            3 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting...",
            Self::WaitingForInit => "Waiting for server...",
            Self::Connected => "Connected",
        })
    }
}

/// Everything both threads touch.
struct Shared<T> {
    transport: T,
    state: Mutex<SyncState>,
    outbound: Mutex<OutboundCache>,
    effects: Sender<GameEffect>,
    connection: AtomicU8,
    has_connected: AtomicBool,
    closing: AtomicBool,
    config: ClientConfig,
    self_id: PlayerId,
}

impl<T: Transport> Shared<T> {
    fn connection(&self) -> ConnectionState {
        ConnectionState::from_raw(self.connection.load(Ordering::Acquire))
    }

    fn set_connection(&self, state: ConnectionState) {
        self.connection.store(state as u8, Ordering::Release);
    }

    fn disconnected(&self, err: NetError) -> NetError {
        self.set_connection(ConnectionState::Disconnected);
        if !self.closing.load(Ordering::Acquire) {
            error!(error = %err, "connection lost");
        }
        err
    }

    /// Opens the transport and completes the handshake.
    fn start_connection(&self) -> NetResult<()> {
        self.set_connection(ConnectionState::Connecting);
        let host = self.config.effective_ip();
        let port = self.config.effective_port();
        let max_attempts = self.config.max_connect_attempts;

        let mut attempts = 0u32;
        while let Err(err) = self.transport.init(host, port) {
            attempts += 1;
            if max_attempts != 0 && attempts >= max_attempts {
                self.set_connection(ConnectionState::Disconnected);
                error!(host, port, attempts, "giving up on server");
                return Err(NetError::ConnectAttemptsExhausted(attempts));
            }
            if self.closing.load(Ordering::Acquire) {
                self.set_connection(ConnectionState::Disconnected);
                return Err(err);
            }
            warn!(host, port, attempt = attempts, error = %err, "connection failed, retrying");
            thread::sleep(self.config.retry_delay());
        }

        let is_reconnect = self.has_connected.swap(true, Ordering::AcqRel);
        let connection_type = if is_reconnect {
            ConnectionType::Reconnect
        } else {
            ConnectionType::Init
        };
        let handshake = Packet::new(
            self.self_id,
            PacketBody::PlayerConnect(PlayerConnect {
                connection_type,
                max_players: ANNOUNCED_MAX_PLAYERS,
                client_name: FixedStr::new(&self.config.client_name),
            }),
        );
        self.transport
            .send(&handshake)
            .map_err(|e| self.disconnected(e))?;
        if is_reconnect {
            self.outbound.lock().resend_init_packets(&self.transport);
        }

        self.set_connection(ConnectionState::WaitingForInit);
        self.await_init()?;
        self.set_connection(ConnectionState::Connected);
        info!(host, port, ?connection_type, "connected");
        Ok(())
    }

    /// Discards everything until the server's `ClientInit`.
    fn await_init(&self) -> NetResult<()> {
        loop {
            let frame = match self.transport.try_receive_packet() {
                Ok(frame) => frame,
                Err(e) if e.is_transport_fault() => return Err(self.disconnected(e)),
                Err(e) => {
                    debug!(error = %e, "malformed frame before init");
                    continue;
                }
            };
            match frame.decode() {
                Ok(packet) if matches!(packet.body, PacketBody::ClientInit(_)) => {
                    self.state.lock().apply(&packet, &self.effects);
                    return Ok(());
                }
                Ok(packet) => {
                    debug!(packet = packet.packet_type().name(), "discarded before init");
                }
                Err(e) => debug!(error = %e, "undecodable frame before init"),
            }
        }
    }

    /// One packet in, one dispatch, until the transport fails.
    fn run_read_loop(&self) -> NetResult<()> {
        loop {
            let frame = match self.transport.try_receive_packet() {
                Ok(frame) => frame,
                Err(_) if self.closing.load(Ordering::Acquire) => {
                    self.set_connection(ConnectionState::Disconnected);
                    return Ok(());
                }
                Err(e) if e.is_transport_fault() => return Err(self.disconnected(e)),
                Err(e) => {
                    warn!(error = %e, "dropping malformed frame");
                    continue;
                }
            };
            match frame.decode() {
                Ok(packet) => self.dispatch_guarded(&packet),
                Err(e) => warn!(
                    packet_type = frame.header.packet_type,
                    error = %e,
                    "dropping undecodable packet"
                ),
            }
        }
    }

    fn dispatch_guarded(&self, packet: &Packet) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(packet)));
        if result.is_err() {
            error!(
                packet = packet.packet_type().name(),
                owner = %packet.owner,
                "handler panicked, packet dropped"
            );
        }
    }

    fn dispatch(&self, packet: &Packet) {
        match &packet.body {
            PacketBody::PlayerConnect(_) => {
                self.state.lock().apply(packet, &self.effects);
                self.outbound.lock().catch_up(&self.transport);
            }
            PacketBody::UdpInit(init) => {
                self.transport.set_peer_udp_port(init.port);
                let mut outbound = self.outbound.lock();
                outbound.send_hole_punch(&self.transport);
                match self.transport.local_udp_port() {
                    Some(port) => {
                        outbound.send_udp_init(&self.transport, port);
                    }
                    None => debug!("UDP disabled, peer port stored only"),
                }
            }
            PacketBody::HolePunch => {
                self.outbound.lock().send_hole_punch(&self.transport);
            }
            _ => self.state.lock().apply(packet, &self.effects),
        }
    }
}

/// The sync client.
///
/// Created on the main thread; [`Client::update`] must be called once per
/// game frame.
pub struct Client<T: Transport + 'static> {
    shared: Arc<Shared<T>>,
    effects: Receiver<GameEffect>,
    cadence: Cadence,
    read_thread: Option<JoinHandle<NetResult<()>>>,
}

impl<T: Transport + 'static> Client<T> {
    /// Creates a disconnected client.
    pub fn new(config: ClientConfig, self_id: PlayerId, transport: T) -> NetResult<Self> {
        config.validate()?;
        let (effects_tx, effects_rx) = unbounded();
        let cadence = Cadence::new(
            config.fast_send_interval,
            config.slow_send_interval,
            config.shine_resync_interval,
        );
        let shared = Shared {
            transport,
            state: Mutex::new(SyncState::new(self_id)),
            outbound: Mutex::new(OutboundCache::new(self_id)),
            effects: effects_tx,
            connection: AtomicU8::new(ConnectionState::Disconnected as u8),
            has_connected: AtomicBool::new(false),
            closing: AtomicBool::new(false),
            config,
            self_id,
        };
        Ok(Self {
            shared: Arc::new(shared),
            effects: effects_rx,
            cadence,
            read_thread: None,
        })
    }

    /// Local player id.
    #[inline]
    #[must_use]
    pub fn self_id(&self) -> PlayerId {
        self.shared.self_id
    }

    /// Current connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.shared.connection()
    }

    /// True once the server's `ClientInit` has arrived.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Locks the sync state.
    ///
    /// Holding the guard stalls the read thread.
    pub fn state(&self) -> MutexGuard<'_, SyncState> {
        self.shared.state.lock()
    }

    /// Runs `f` against the outbound cache.
    pub fn with_outbound<R>(&self, f: impl FnOnce(&mut OutboundCache, &T) -> R) -> R {
        let mut outbound = self.shared.outbound.lock();
        f(&mut outbound, &self.shared.transport)
    }

    // =========================================================================
    // Read thread
    // =========================================================================

    /// Connects and completes the handshake on the calling thread.
    pub fn start_connection(&self) -> NetResult<()> {
        self.shared.closing.store(false, Ordering::Release);
        self.shared.start_connection()
    }

    /// Dispatches packets on the calling thread until the transport fails.
    pub fn run_read_loop(&self) -> NetResult<()> {
        self.shared.run_read_loop()
    }

    /// Spawns the read thread: connect, then dispatch until disconnected.
    pub fn spawn_read_thread(&mut self) -> NetResult<()> {
        if !self.is_read_thread_finished() {
            debug!("read thread already running");
            return Ok(());
        }
        self.shared.closing.store(false, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("odyssey-read".to_owned())
            .spawn(move || {
                shared.start_connection()?;
                shared.run_read_loop()
            })?;
        self.read_thread = Some(handle);
        Ok(())
    }

    /// True when there is no live read thread.
    #[must_use]
    pub fn is_read_thread_finished(&self) -> bool {
        match &self.read_thread {
            Some(handle) => handle.is_finished(),
            None => true,
        }
    }

    /// Waits for the read thread and returns how it ended.
    pub fn join_read_thread(&mut self) -> NetResult<()> {
        let Some(handle) = self.read_thread.take() else {
            return Ok(());
        };
        match handle.join() {
            Ok(result) => result,
            Err(_) => {
                error!("read thread panicked");
                Err(NetError::ConnectionClosed)
            }
        }
    }

    /// Reaps a finished read thread and starts a new one.
    ///
    /// A session that gave up connecting is not restarted; its error is
    /// returned instead.
    pub fn restart(&mut self) -> NetResult<()> {
        if !self.is_read_thread_finished() {
            return Ok(());
        }
        match self.join_read_thread() {
            Err(e @ NetError::ConnectAttemptsExhausted(_)) => return Err(e),
            Err(e) => info!(error = %e, "previous session ended, reconnecting"),
            Ok(()) => {}
        }
        self.spawn_read_thread()
    }

    /// Closes the transport and stops the read thread.
    pub fn close(&mut self) {
        self.shared.closing.store(true, Ordering::Release);
        self.shared.transport.close();
        if let Err(e) = self.join_read_thread() {
            debug!(error = %e, "read thread ended with error");
        }
        self.shared.set_connection(ConnectionState::Disconnected);
    }

    // =========================================================================
    // Main thread
    // =========================================================================

    /// Runs one game frame: applies queued effects, drains shine grants and
    /// sends whatever the cadence allows.
    pub fn update(&mut self, host: &mut impl GameHost) -> CadenceTick {
        {
            let mut state = self.shared.state.lock();
            for effect in self.effects.try_iter() {
                state.apply_effect(effect, host);
            }
            if let Some(stage) = host.stage() {
                let scenario = i8::try_from(stage.scenario).unwrap_or(i8::MAX);
                state.set_local_stage(&stage.stage, scenario);
            }
            state.drain_pending_shines(host);
        }

        let tick = self.cadence.advance();
        if !self.is_connected() {
            return tick;
        }
        if tick.fast {
            self.send_fast(&*host);
        }
        if tick.slow {
            self.send_slow(host);
        }
        if tick.resync {
            host.refresh_shine_counter();
        }
        tick
    }

    fn send_fast(&self, host: &impl GameHost) {
        let transport = &self.shared.transport;
        let mut outbound = self.shared.outbound.lock();
        if let Some(player) = host.player() {
            outbound.send_player_info(transport, &player);
            outbound.send_capture(transport, player.capture_class.as_deref());
        }
        if let Some(cap) = host.hack_cap() {
            outbound.send_hack_cap(transport, &cap);
        }
    }

    /// Tag state is only sent while hide-and-seek is selected.
    fn send_slow(&self, host: &mut impl GameHost) {
        let transport = &self.shared.transport;
        let kill = !host.is_player_dead() && self.shared.state.lock().take_ap_death();
        if kill {
            info!("deathlink received, killing player");
            host.kill_player();
        }

        // A death we caused ourselves is already marked dying and not echoed.
        let is_dead = host.is_player_dead();
        let (announce, tag) = {
            let mut state = self.shared.state.lock();
            let announce = is_dead && !state.is_dying();
            if announce {
                state.set_dying(true);
            } else if !is_dead && state.is_dying() {
                state.set_dying(false);
            }
            (announce, state.tag)
        };

        let mut outbound = self.shared.outbound.lock();
        if announce {
            outbound.send_deathlink(transport);
        }
        if let Some(stage) = host.stage() {
            outbound.send_game_info(transport, &stage);
        }
        if let Some(costume) = host.costume() {
            outbound.send_costume(transport, &costume);
        }
        if host.is_tag_mode() {
            outbound.send_tag_info(transport, tag);
        }
    }

    // =========================================================================
    // Local events
    // =========================================================================

    /// Records a locally collected shine and reports it.
    pub fn collect_shine(&self, uid: i32) -> bool {
        self.shared.state.lock().ledger.set_shine(uid);
        self.with_outbound(|o, t| o.send_shine_collect(t, uid))
    }

    /// Records a shine actor loaded in the current stage.
    pub fn register_shine_actor(&self, uid: i32) -> bool {
        self.shared.state.lock().ledger.register_live_shine(uid)
    }

    /// Reports a location check.
    pub fn send_check(&self, location_id: i32, item_type: i32) -> bool {
        self.with_outbound(|o, t| o.send_check(t, location_id, item_type))
    }

    /// Reports a shop purchase.
    pub fn send_item_collect(&self, name: &str, item_type: i32) -> bool {
        self.with_outbound(|o, t| o.send_item_collect(t, name, item_type))
    }

    /// Reports a capture's first use.
    pub fn send_capture_shine(&self, capture_name: &str) -> bool {
        self.with_outbound(|o, t| o.send_capture_shine(t, capture_name))
    }

    /// Reports scenario progress and records it locally.
    pub fn send_progress(&self, world_id: i32, scenario: i32) -> bool {
        if let Ok(world) = usize::try_from(world_id) {
            self.shared
                .state
                .lock()
                .ledger
                .advance_scenario(world, scenario);
        }
        self.with_outbound(|o, t| o.send_progress(t, world_id, scenario))
    }

    // =========================================================================
    // Save files
    // =========================================================================

    /// Snapshot of the ledger in save form, tagged with this server.
    #[must_use]
    pub fn save_data(&self) -> SaveData {
        let config = &self.shared.config;
        SaveData::capture(&self.shared.state.lock().ledger)
            .with_server(config.effective_ip(), config.effective_port())
    }

    /// Loads a save into the ledger.
    pub fn restore(&self, save: &SaveData) {
        save.restore(&mut self.shared.state.lock().ledger);
    }

    /// Starts a fresh save file.
    ///
    /// Clears the ledger and the last-sent cache, so the next slow tick
    /// reports stage and outfit again even if they match the old save.
    pub fn new_game(&mut self) {
        self.shared.state.lock().ledger.new_game();
        self.shared.outbound.lock().reset();
        self.cadence.reset();
        info!("new game started");
    }
}

impl<T: Transport + 'static> Drop for Client<T> {
    fn drop(&mut self) {
        if self.read_thread.is_some() {
            self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use odyssey_shared::Quat;

    use super::*;
    use crate::host::{HeadlessHost, HostEvent, PlayerSample, StageSample};
    use crate::protocol::{Check, Init, PlayerInf, UdpInit};
    use crate::reconcile::item_type;
    use crate::transport::{ChannelTransport, ServerEnd};

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn self_id() -> PlayerId {
        PlayerId::from_u128(0xA)
    }

    fn remote_id() -> PlayerId {
        PlayerId::from_u128(0xB)
    }

    fn config() -> ClientConfig {
        ClientConfig {
            retry_delay_ms: 1,
            fast_send_interval: 1,
            slow_send_interval: 1,
            ..ClientConfig::default()
        }
    }

    fn client() -> (Client<ChannelTransport>, ServerEnd) {
        let (transport, server) = ChannelTransport::pair(Some(40_000));
        let client = Client::new(config(), self_id(), transport).expect("valid config");
        (client, server)
    }

    fn server_packet(owner: PlayerId, body: PacketBody) -> Packet {
        Packet::new(owner, body)
    }

    fn init(max_players: u16) -> Packet {
        server_packet(PlayerId::NIL, PacketBody::ClientInit(Init { max_players }))
    }

    fn connect_packet(name: &str) -> Packet {
        server_packet(
            remote_id(),
            PacketBody::PlayerConnect(PlayerConnect {
                connection_type: ConnectionType::Init,
                max_players: 4,
                client_name: FixedStr::new(name),
            }),
        )
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = std::time::Instant::now() + TIMEOUT;
        while !condition() {
            assert!(std::time::Instant::now() < deadline, "timed out");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_handshake_discards_until_init() {
        let (client, server) = client();
        server.send(&connect_packet("Early")).unwrap();
        server.send(&init(4)).unwrap();

        client.start_connection().unwrap();
        assert_eq!(client.connection_state(), ConnectionState::Connected);

        let hello = server.recv_timeout(TIMEOUT).unwrap();
        let PacketBody::PlayerConnect(connect) = hello.body else {
            panic!("expected PlayerConnect, got {hello:?}");
        };
        assert_eq!(connect.connection_type, ConnectionType::Init);
        assert_eq!(connect.max_players, ANNOUNCED_MAX_PLAYERS);
        assert_eq!(connect.client_name.as_str(), "Mario");

        let state = client.state();
        assert_eq!(state.puppets.capacity(), 3);
        assert_eq!(state.puppets.connect_count(), 0);
    }

    #[test]
    fn test_reconnect_resends_cached_state() {
        let (client, server) = client();
        server.send(&init(4)).unwrap();
        client.start_connection().unwrap();

        let stage = StageSample {
            stage: "SandWorldHomeStage".to_owned(),
            scenario: 2,
            is_2d: false,
        };
        client.with_outbound(|o, t| o.send_game_info(t, &stage));
        let _ = server.drain();

        server.send(&init(4)).unwrap();
        client.start_connection().unwrap();

        let sent = server.drain();
        let PacketBody::PlayerConnect(connect) = sent[0].body else {
            panic!("expected PlayerConnect first");
        };
        assert_eq!(connect.connection_type, ConnectionType::Reconnect);
        assert!(sent
            .iter()
            .any(|p| matches!(p.body, PacketBody::GameInfo(g) if g.stage.as_str() == "SandWorldHomeStage")));
    }

    #[test]
    fn test_connect_gives_up_after_max_attempts() {
        let (transport, server) = ChannelTransport::pair(None);
        let config = ClientConfig {
            max_connect_attempts: 3,
            ..config()
        };
        let client = Client::new(config, self_id(), transport).unwrap();
        server.refuse_connections(10);

        let err = client.start_connection().unwrap_err();
        assert!(matches!(err, NetError::ConnectAttemptsExhausted(3)));
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_read_thread_dispatches_and_exits_on_close() {
        let (mut client, server) = client();
        server.send(&init(4)).unwrap();
        client.spawn_read_thread().unwrap();
        wait_until(|| client.is_connected());

        server.send(&connect_packet("Luigi")).unwrap();
        let info = PlayerInf {
            rotation: Quat::IDENTITY,
            ..PlayerInf::default()
        };
        server
            .send(&server_packet(remote_id(), PacketBody::PlayerInfo(info)))
            .unwrap();
        wait_until(|| client.state().puppets.get(remote_id()).is_some());

        client.close();
        assert!(client.join_read_thread().is_ok());
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_unknown_packet_does_not_stop_loop() {
        let (mut client, server) = client();
        server.send(&init(4)).unwrap();
        client.spawn_read_thread().unwrap();
        wait_until(|| client.is_connected());

        let mut bogus = vec![0u8; 20 + 4];
        bogus[16..18].copy_from_slice(&99i16.to_le_bytes());
        bogus[18..20].copy_from_slice(&4u16.to_le_bytes());
        server.send_raw(bogus).unwrap();
        server.send(&connect_packet("Peach")).unwrap();

        wait_until(|| client.state().puppets.connect_count() == 1);
        assert!(client.is_connected());
    }

    #[test]
    fn test_dropped_server_ends_read_thread() {
        let (mut client, server) = client();
        server.send(&init(4)).unwrap();
        client.spawn_read_thread().unwrap();
        wait_until(|| client.is_connected());

        drop(server);
        wait_until(|| client.is_read_thread_finished());
        assert!(client.join_read_thread().is_err());
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_restart_sends_reconnect() {
        let (mut client, server) = client();
        server.send(&init(4)).unwrap();
        client.spawn_read_thread().unwrap();
        wait_until(|| client.is_connected());

        client.close();
        let _ = server.drain();
        server.send(&init(4)).unwrap();
        client.restart().unwrap();
        wait_until(|| client.is_connected());

        let hello = server.recv_timeout(TIMEOUT).unwrap();
        assert!(matches!(
            hello.body,
            PacketBody::PlayerConnect(PlayerConnect {
                connection_type: ConnectionType::Reconnect,
                ..
            })
        ));
    }

    #[test]
    fn test_udp_init_exchange() {
        let (client, server) = client();
        server.send(&init(4)).unwrap();
        client.start_connection().unwrap();
        let _ = server.drain();

        client.shared.dispatch(&server_packet(
            PlayerId::NIL,
            PacketBody::UdpInit(UdpInit { port: 55_000 }),
        ));
        assert_eq!(client.transport().peer_udp_port(), 55_000);

        let sent = server.drain();
        assert!(matches!(sent[0].body, PacketBody::HolePunch));
        assert!(matches!(sent[1].body, PacketBody::UdpInit(UdpInit { port: 40_000 })));
    }

    #[test]
    fn test_new_player_gets_catch_up() {
        let (client, server) = client();
        server.send(&init(4)).unwrap();
        client.start_connection().unwrap();

        let player = PlayerSample {
            rotation: Quat::IDENTITY,
            act_name: "Wait".to_owned(),
            ..PlayerSample::default()
        };
        client.with_outbound(|o, t| o.send_player_info(t, &player));
        let _ = server.drain();

        client.shared.dispatch(&connect_packet("Toad"));
        let sent = server.drain();
        assert!(sent.iter().any(|p| matches!(p.body, PacketBody::PlayerInfo(_))));
        assert_eq!(client.state().puppets.connect_count(), 1);
    }

    #[test]
    fn test_update_applies_effects_and_sends() {
        let (mut client, server) = client();
        server.send(&init(4)).unwrap();
        client.start_connection().unwrap();
        let _ = server.drain();

        let check = Check {
            location_id: 0,
            item_type: item_type::COINS,
            index: 1,
            amount: 100,
            ..Check::default()
        };
        client
            .shared
            .dispatch(&server_packet(PlayerId::NIL, PacketBody::Check(check)));

        let mut host = HeadlessHost::new();
        host.player = Some(PlayerSample {
            rotation: Quat::IDENTITY,
            act_name: "Run".to_owned(),
            ..PlayerSample::default()
        });
        host.stage = Some(StageSample {
            stage: "CapWorldHomeStage".to_owned(),
            scenario: 1,
            is_2d: false,
        });

        let tick = client.update(&mut host);
        assert!(tick.fast && tick.slow);
        assert_eq!(host.take_events(), vec![HostEvent::Coins(100)]);

        let sent = server.drain();
        assert!(sent.iter().any(|p| matches!(p.body, PacketBody::PlayerInfo(_))));
        assert!(sent.iter().any(|p| matches!(p.body, PacketBody::GameInfo(_))));

        client.update(&mut host);
        let resent = server.drain();
        assert!(!resent.iter().any(|p| matches!(p.body, PacketBody::PlayerInfo(_))));
    }

    #[test]
    fn test_tag_info_only_in_tag_mode() {
        let (mut client, server) = client();
        server.send(&init(4)).unwrap();
        client.start_connection().unwrap();
        let _ = server.drain();

        let tag_infos = |sent: &[Packet]| {
            sent.iter()
                .filter(|p| matches!(p.body, PacketBody::TagInfo(_)))
                .count()
        };

        let mut host = HeadlessHost::new();
        client.update(&mut host);
        assert_eq!(tag_infos(&server.drain()), 0);

        host.tag_mode = true;
        client.state().tag.is_it = true;
        client.update(&mut host);
        let sent = server.drain();
        assert_eq!(tag_infos(&sent), 1);
        assert!(sent
            .iter()
            .any(|p| matches!(p.body, PacketBody::TagInfo(t) if t.is_it)));
    }

    #[test]
    fn test_deathlink_round_trip() {
        let (mut client, server) = client();
        server.send(&init(4)).unwrap();
        client.start_connection().unwrap();
        let _ = server.drain();

        client
            .shared
            .dispatch(&server_packet(remote_id(), PacketBody::Deathlink));

        let mut host = HeadlessHost::new();
        client.update(&mut host);
        assert!(host.dead);
        assert_eq!(host.take_events(), vec![HostEvent::Killed]);

        client.update(&mut host);
        let sent = server.drain();
        assert_eq!(
            sent.iter()
                .filter(|p| matches!(p.body, PacketBody::Deathlink))
                .count(),
            0,
            "a death caused by deathlink is not echoed"
        );

        host.dead = false;
        client.update(&mut host);
        host.dead = true;
        client.update(&mut host);
        client.update(&mut host);
        let sent = server.drain();
        assert_eq!(
            sent.iter()
                .filter(|p| matches!(p.body, PacketBody::Deathlink))
                .count(),
            1
        );
    }

    #[test]
    fn test_save_round_trip() {
        let (client, _server) = client();
        client.state().ledger.set_shine(42);
        let save = client.save_data();

        assert_eq!(save.server_port, client.config().effective_port());

        let (other, _other_server) = self::client();
        other.restore(&save);
        assert!(other.state().ledger.has_shine(42));
    }
}
