//! # Relay Protocol
//!
//! Fixed-layout binary packets shared with the relay server.
//!
//! ## Packet Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header (20 bytes)                                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Owner id (16) │ Type (i16) │ Payload length (u16)            │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Body (fixed per type, max 236 bytes)                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers and floats are little-endian. Strings are NUL-padded
//! fixed-width fields.

mod packets;
mod serialization;

pub use packets::{
    ApInfo, ChangeStage, ChatMessage, Check, CaptureInf, ConnectionType, CostumeInf,
    FillerCollect, GameInf, HackCapInf, Init, ItemCollect, Packet, PacketBody, PacketHeader,
    PacketType, PlayerConnect, PlayerInf, Progress, RegionalCollect, ServerCommand, ShineChecks,
    ShineColor, ShineColorEntry, ShineEntry, ShineReplace, ShopEntry, ShopReplace, SlotData,
    TagInf, UdpInit, UnlockWorld,
};
pub use serialization::{
    decode_body, encode, read_frame, Frame, PacketDeserializer, PacketSerializer,
    MAX_PAYLOAD_SIZE,
};
