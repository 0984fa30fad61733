//! # ODYSSEY Networking
//!
//! Client side of the relay protocol: mirrors remote players and randomizer
//! grants into local state, and reports local state back.
//!
//! ## Architecture
//!
//! - **Protocol**: fixed-layout binary packets, 20-byte header, one body type per tag
//! - **Transport**: TCP control channel plus an optional UDP position channel
//! - **Dispatch**: one background read thread, one packet at a time
//! - **Reconciliation**: handlers that turn packets into [`SyncState`] changes
//!   and [`GameEffect`]s
//! - **Ledger**: bit-packed progress that survives reconnects and saves
//! - **Outbound**: diff-and-send throttle driven by the game's frame tick
//!
//! ## Threading
//!
//! ```text
//! SERVER ──TCP/UDP──▶ read thread ──▶ SyncState (mutex) ◀── main thread ──▶ GameHost
//!                                 └─▶ GameEffect queue ───▶ main thread
//! ```
//!
//! The game is only ever touched from the main thread, inside
//! [`Client::update`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use odyssey_networking::{Client, ClientConfig, HeadlessHost, PlayerId, TcpTransport};
//!
//! let config = ClientConfig::load("odyssey.toml")?;
//! let transport = TcpTransport::new(config.udp_enabled);
//! let mut client = Client::new(config, PlayerId::from_u128(1), transport)?;
//! client.spawn_read_thread()?;
//!
//! let mut host = HeadlessHost::new();
//! loop {
//!     client.update(&mut host); // once per frame
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod ledger;
pub mod outbound;
pub mod protocol;
pub mod reconcile;
pub mod transport;

// Re-exports for convenience
pub use client::{Client, ConnectionState};
pub use config::ClientConfig;
pub use error::{NetError, NetResult};
pub use host::{
    CapSample, CostumeSample, GameEffect, GameHost, HeadlessHost, HostEvent, PlayerSample,
    StageChange, StageSample,
};
pub use ledger::{Collection, ProgressLedger, SaveData};
pub use outbound::{Cadence, CadenceTick, FramePacer, OutboundCache};
pub use protocol::{Frame, Packet, PacketBody, PacketHeader, PacketType};
pub use reconcile::{PuppetInfo, PuppetTable, RandomizerTables, SyncState, TagState, MAX_PUPPETS};
pub use transport::{ChannelTransport, ServerEnd, TcpTransport, Transport, TransportState};

pub use odyssey_shared::{FixedStr, ItemKind, PlayerId, Quat, Vec3};
