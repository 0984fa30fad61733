//! # Packet Definitions
//!
//! Every packet type in the relay protocol.
//!
//! ## Fixed Layouts
//!
//! Each body has a fixed size (`SIZE`) and a fixed field order. The header's
//! payload length is always `SIZE` of the body; it is set when the header is
//! built and never recomputed.
//!
//! Batch packets (`ShineChecks`, `ShineReplace`, `ShopReplace`, `ShineColor`)
//! are bounded arrays in memory. On the wire they stay positional: entry `i`
//! always lands at the same offset.

use odyssey_shared::constants::{
    APMESSAGESIZE, APNAMESIZE, COSTUMEBUFSIZE, ITEMNAMESIZE, OBJECTIDSIZE, PACKBUFSIZE,
    STAGENAMESIZE,
};
use odyssey_shared::{FixedStr, PlayerId, Quat, Vec3, WorldId};

/// Packet header - present in every packet.
///
/// Total size: 20 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PacketHeader {
    /// Identity of the player the packet is about.
    pub owner: PlayerId,
    /// Raw type tag. Kept raw so unknown tags can be reported.
    pub packet_type: i16,
    /// Body length in bytes.
    pub payload_len: u16,
}

impl PacketHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 20;

    /// Creates a header for a known type.
    #[inline]
    #[must_use]
    pub const fn new(owner: PlayerId, packet_type: PacketType) -> Self {
        Self {
            owner,
            packet_type: packet_type as i16,
            payload_len: packet_type.body_size() as u16,
        }
    }

    /// Resolves the type tag.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> Option<PacketType> {
        PacketType::from_raw(self.packet_type)
    }
}

/// Types of packets in the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum PacketType {
    /// Placeholder; never valid on the wire.
    Unknown = 0,
    /// Server -> Client: handshake, carries max player count.
    ClientInit = 1,
    /// Bidirectional: position, rotation and animation.
    PlayerInfo = 2,
    /// Bidirectional: thrown cap transform.
    HackCapInfo = 3,
    /// Bidirectional: stage, scenario and 2D flag.
    GameInfo = 4,
    /// Bidirectional: tag game state.
    TagInfo = 5,
    /// Bidirectional: player joined.
    PlayerConnect = 6,
    /// Server -> Client: player left.
    PlayerDisconnect = 7,
    /// Bidirectional: outfit names.
    CostumeInfo = 8,
    /// Bidirectional: randomizer location check / item grant.
    Check = 9,
    /// Bidirectional: captured form name.
    CaptureInfo = 10,
    /// Server -> Client: move to a stage.
    ChangeStage = 11,
    /// Server -> Client: console command.
    Command = 12,
    /// Client -> Server: shop item bought.
    ItemCollect = 13,
    /// Client -> Server: filler item collected.
    FillerCollect = 14,
    /// Server -> Client: three chat lines.
    ChatMessage = 15,
    /// Server -> Client: world costs and feature flags.
    SlotData = 16,
    /// Server -> Client: unlock a world.
    UnlockWorld = 17,
    /// Client -> Server: regional coin collected.
    RegionalCollect = 18,
    /// Bidirectional: death link.
    Deathlink = 19,
    /// Server -> Client: world scenario progress.
    Progress = 20,
    /// Server -> Client: batch of already-collected shines.
    ShineChecks = 21,
    /// Server -> Client: randomizer game/slot/item names.
    ApInfo = 22,
    /// Server -> Client: shop text replacements.
    ShopReplace = 23,
    /// Server -> Client: shine text replacements.
    ShineReplace = 24,
    /// Bidirectional: UDP port exchange.
    UdpInit = 25,
    /// Bidirectional: UDP keepalive.
    HolePunch = 26,
    /// Server -> Client: per-shine colours.
    ShineColor = 27,
}

impl PacketType {
    /// Range sentinel. Every valid tag is below this.
    pub const END: i16 = 28;

    /// Every known type, in tag order.
    pub const ALL: [Self; 28] = [
        Self::Unknown,
        Self::ClientInit,
        Self::PlayerInfo,
        Self::HackCapInfo,
        Self::GameInfo,
        Self::TagInfo,
        Self::PlayerConnect,
        Self::PlayerDisconnect,
        Self::CostumeInfo,
        Self::Check,
        Self::CaptureInfo,
        Self::ChangeStage,
        Self::Command,
        Self::ItemCollect,
        Self::FillerCollect,
        Self::ChatMessage,
        Self::SlotData,
        Self::UnlockWorld,
        Self::RegionalCollect,
        Self::Deathlink,
        Self::Progress,
        Self::ShineChecks,
        Self::ApInfo,
        Self::ShopReplace,
        Self::ShineReplace,
        Self::UdpInit,
        Self::HolePunch,
        Self::ShineColor,
    ];

    /// Resolves a raw tag. `Unknown` and anything at or past `END` is `None`.
    #[must_use]
    pub const fn from_raw(raw: i16) -> Option<Self> {
        if raw <= 0 || raw >= Self::END {
            return None;
        }
        Some(Self::ALL[raw as usize])
    }

    /// Fixed body size in bytes.
    #[must_use]
    pub const fn body_size(self) -> usize {
        match self {
            Self::Unknown | Self::PlayerDisconnect | Self::Deathlink | Self::HolePunch => 0,
            Self::ClientInit => Init::SIZE,
            Self::PlayerInfo => PlayerInf::SIZE,
            Self::HackCapInfo => HackCapInf::SIZE,
            Self::GameInfo => GameInf::SIZE,
            Self::TagInfo => TagInf::SIZE,
            Self::PlayerConnect => PlayerConnect::SIZE,
            Self::CostumeInfo => CostumeInf::SIZE,
            Self::Check => Check::SIZE,
            Self::CaptureInfo => CaptureInf::SIZE,
            Self::ChangeStage => ChangeStage::SIZE,
            Self::Command => ServerCommand::SIZE,
            Self::ItemCollect => ItemCollect::SIZE,
            Self::FillerCollect => FillerCollect::SIZE,
            Self::ChatMessage => ChatMessage::SIZE,
            Self::SlotData => SlotData::SIZE,
            Self::UnlockWorld => UnlockWorld::SIZE,
            Self::RegionalCollect => RegionalCollect::SIZE,
            Self::Progress => Progress::SIZE,
            Self::ShineChecks => ShineChecks::SIZE,
            Self::ApInfo => ApInfo::SIZE,
            Self::ShopReplace => ShopReplace::SIZE,
            Self::ShineReplace => ShineReplace::SIZE,
            Self::UdpInit => UdpInit::SIZE,
            Self::ShineColor => ShineColor::SIZE,
        }
    }

    /// Human-readable name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::ClientInit => "Client Initialization",
            Self::PlayerInfo => "Player Info",
            Self::HackCapInfo => "Player Cap Info",
            Self::GameInfo => "Game Info",
            Self::TagInfo => "Tag Info",
            Self::PlayerConnect => "Player Connect",
            Self::PlayerDisconnect => "Player Disconnect",
            Self::CostumeInfo => "Costume Info",
            Self::Check => "Location Check",
            Self::CaptureInfo => "Capture Info",
            Self::ChangeStage => "Change Stage",
            Self::Command => "Server Command",
            Self::ItemCollect => "Item Collect",
            Self::FillerCollect => "Filler Collect",
            Self::ChatMessage => "Chat Message",
            Self::SlotData => "Slot Data",
            Self::UnlockWorld => "Unlock World",
            Self::RegionalCollect => "Regional Collect",
            Self::Deathlink => "Death Link",
            Self::Progress => "Progress",
            Self::ShineChecks => "Shine Checks",
            Self::ApInfo => "Randomizer Info",
            Self::ShopReplace => "Shop Replace",
            Self::ShineReplace => "Shine Replace",
            Self::UdpInit => "Udp Initialization",
            Self::HolePunch => "Udp Hole Punch",
            Self::ShineColor => "Shine Color",
        }
    }

    /// True for high-frequency types that may ride the UDP channel.
    #[must_use]
    pub const fn prefers_udp(self) -> bool {
        matches!(self, Self::PlayerInfo | Self::HackCapInfo)
    }
}

/// How a `PlayerConnect` was initiated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ConnectionType {
    /// First connection of this session.
    #[default]
    Init = 0,
    /// Reconnection after a dropped session.
    Reconnect = 1,
}

impl ConnectionType {
    /// Decodes the wire value. Unknown values read as `Init`.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        if raw == 1 {
            Self::Reconnect
        } else {
            Self::Init
        }
    }
}

/// Handshake from the server.
///
/// Size: 2 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Init {
    /// Server capacity, local player included.
    pub max_players: u16,
}

impl Init {
    /// Size in bytes.
    pub const SIZE: usize = 2;
}

/// Player transform and animation.
///
/// Size: 56 bytes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerInf {
    /// World position.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// Animation blend weights.
    pub blend_weights: [f32; 6],
    /// Main animation code.
    pub act: i16,
    /// Sub animation code.
    pub sub_act: i16,
}

impl PlayerInf {
    /// Size in bytes.
    pub const SIZE: usize = 56;
}

impl Default for PlayerInf {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            blend_weights: [0.0; 6],
            act: -1,
            sub_act: -1,
        }
    }
}

/// Thrown cap transform.
///
/// Size: 77 bytes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HackCapInf {
    /// Cap position.
    pub position: Vec3,
    /// Cap orientation.
    pub rotation: Quat,
    /// Cap is out of the player's head.
    pub is_visible: bool,
    /// Cap animation name.
    pub anim: FixedStr<PACKBUFSIZE>,
}

impl HackCapInf {
    /// Size in bytes.
    pub const SIZE: usize = 77;

    /// Sent once when the cap returns, so remote views do not freeze mid-air.
    #[must_use]
    pub fn reset() -> Self {
        Self::default()
    }
}

impl Default for HackCapInf {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            is_visible: false,
            anim: FixedStr::empty(),
        }
    }
}

/// Stage and scenario.
///
/// Size: 66 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GameInf {
    /// Player is in a 2D section.
    pub is_2d: bool,
    /// Current scenario.
    pub scenario: u8,
    /// Current stage name.
    pub stage: FixedStr<STAGENAMESIZE>,
}

impl GameInf {
    /// Size in bytes.
    pub const SIZE: usize = 66;

    /// True for the all-default value sent before any stage is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Tag game state.
///
/// Size: 5 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TagInf {
    /// Which of the fields below are meaningful.
    pub update_type: u8,
    /// Player is "it".
    pub is_it: bool,
    /// Timer seconds.
    pub seconds: u8,
    /// Timer minutes.
    pub minutes: u16,
}

impl TagInf {
    /// Size in bytes.
    pub const SIZE: usize = 5;

    /// `is_it` is meaningful.
    pub const UPDATE_STATE: u8 = 1 << 0;
    /// `seconds` and `minutes` are meaningful.
    pub const UPDATE_TIME: u8 = 1 << 1;
}

/// Player join announcement.
///
/// Size: 38 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerConnect {
    /// First connect or reconnect.
    pub connection_type: ConnectionType,
    /// Server capacity as seen by the sender.
    pub max_players: u16,
    /// Display name.
    pub client_name: FixedStr<COSTUMEBUFSIZE>,
}

impl PlayerConnect {
    /// Size in bytes.
    pub const SIZE: usize = 38;
}

/// Outfit names.
///
/// Size: 64 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CostumeInf {
    /// Body outfit.
    pub body: FixedStr<COSTUMEBUFSIZE>,
    /// Cap outfit.
    pub cap: FixedStr<COSTUMEBUFSIZE>,
}

impl CostumeInf {
    /// Size in bytes.
    pub const SIZE: usize = 64;

    /// Both names empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty() && self.cap.is_empty()
    }
}

/// Randomizer location check or item grant.
///
/// Size: 80 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Check {
    /// Location or shine id, or table index for items.
    pub location_id: i32,
    /// Item discriminant; see `CheckItem`.
    pub item_type: i32,
    /// Server sequence index for de-duplication.
    pub index: i32,
    /// Placement object id (outbound moon checks).
    pub object_id: FixedStr<OBJECTIDSIZE>,
    /// Stage name (outbound moon checks).
    pub stage: FixedStr<PACKBUFSIZE>,
    /// Currency amount.
    pub amount: i32,
}

impl Check {
    /// Size in bytes.
    pub const SIZE: usize = 80;
}

/// Captured form.
///
/// Size: 32 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureInf {
    /// Capture name, empty when not capturing.
    pub hack_name: FixedStr<COSTUMEBUFSIZE>,
}

impl CaptureInf {
    /// Size in bytes.
    pub const SIZE: usize = 32;
}

/// Stage change request.
///
/// Size: 66 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeStage {
    /// Target stage.
    pub stage: FixedStr<PACKBUFSIZE>,
    /// Entrance id.
    pub entrance: FixedStr<OBJECTIDSIZE>,
    /// Target scenario, or -1 to keep.
    pub scenario: i8,
    /// Sub scenario type.
    pub sub_scenario_type: u8,
}

impl ChangeStage {
    /// Size in bytes.
    pub const SIZE: usize = 66;
}

/// Console command.
///
/// Size: 48 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ServerCommand {
    /// Command text.
    pub command: FixedStr<PACKBUFSIZE>,
}

impl ServerCommand {
    /// Size in bytes.
    pub const SIZE: usize = 48;
}

/// Shop item bought locally.
///
/// Size: 132 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ItemCollect {
    /// Item name.
    pub name: FixedStr<ITEMNAMESIZE>,
    /// Item kind.
    pub item_type: i32,
}

impl ItemCollect {
    /// Size in bytes.
    pub const SIZE: usize = 132;
}

/// Filler item collected.
///
/// Size: 4 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillerCollect {
    /// Filler kind.
    pub item_type: i32,
}

impl FillerCollect {
    /// Size in bytes.
    pub const SIZE: usize = 4;
}

/// Three chat lines from the randomizer.
///
/// Size: 225 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChatMessage {
    /// Lines, top to bottom.
    pub lines: [FixedStr<APMESSAGESIZE>; 3],
}

impl ChatMessage {
    /// Size in bytes.
    pub const SIZE: usize = 3 * APMESSAGESIZE;
}

/// World costs and feature flags.
///
/// Size: 28 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotData {
    /// Unlock cost per world, in [`SlotData::WORLDS`] order.
    pub world_costs: [u16; 13],
    /// Regional coins are randomized.
    pub regionals: bool,
    /// Captures are randomized.
    pub captures: bool,
}

impl SlotData {
    /// Size in bytes.
    pub const SIZE: usize = 28;

    /// World ids of the cost fields: cascade, sand, wooded, lake, lost, metro,
    /// seaside, snow, luncheon, ruined, bowser, dark side, darker side.
    pub const WORLDS: [WorldId; 13] = [1, 2, 3, 4, 6, 7, 8, 9, 10, 11, 12, 15, 16];
}

/// World unlock.
///
/// Size: 4 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnlockWorld {
    /// World id.
    pub world_id: i32,
}

impl UnlockWorld {
    /// Size in bytes.
    pub const SIZE: usize = 4;
}

/// Regional coin collected.
///
/// Size: 64 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegionalCollect {
    /// Placement object id.
    pub object_id: FixedStr<OBJECTIDSIZE>,
    /// Stage name.
    pub stage: FixedStr<PACKBUFSIZE>,
}

impl RegionalCollect {
    /// Size in bytes.
    pub const SIZE: usize = 64;
}

/// World scenario progress.
///
/// Size: 8 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    /// World id.
    pub world_id: i32,
    /// Scenario reached.
    pub scenario: i32,
}

impl Progress {
    /// Size in bytes.
    pub const SIZE: usize = 8;
}

/// Batch of collected shine ids. Negative entries are empty.
///
/// Size: 200 bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShineChecks {
    /// Shine unique ids.
    pub uids: [i16; Self::COUNT],
}

impl ShineChecks {
    /// Entries per packet.
    pub const COUNT: usize = 100;
    /// Size in bytes.
    pub const SIZE: usize = Self::COUNT * 2;
}

impl Default for ShineChecks {
    fn default() -> Self {
        Self { uids: [-1; Self::COUNT] }
    }
}

/// Randomizer name catalog entry batch.
///
/// Size: 128 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApInfo {
    /// 0 game names, 1 slot names, 2 item names, 3 shine item names.
    pub info_type: i16,
    /// Target index of each name.
    pub indices: [i16; 3],
    /// Names.
    pub names: [FixedStr<APNAMESIZE>; 3],
}

impl ApInfo {
    /// Size in bytes.
    pub const SIZE: usize = 128;

    /// Game names.
    pub const TYPE_GAME: i16 = 0;
    /// Slot (player) names.
    pub const TYPE_SLOT: i16 = 1;
    /// Item names.
    pub const TYPE_ITEM: i16 = 2;
    /// Shine item names.
    pub const TYPE_SHINE_ITEM: i16 = 3;
}

/// One shop text replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShopEntry {
    /// Origin game index.
    pub game_index: u8,
    /// Origin slot index.
    pub slot_index: u8,
    /// Item name index.
    pub item_index: u8,
    /// Item classification.
    pub classification: u8,
}

impl ShopEntry {
    /// Size in bytes.
    pub const SIZE: usize = 4;

    /// Unfilled entry.
    pub const UNSET: Self = Self {
        game_index: 254,
        slot_index: 255,
        item_index: 255,
        classification: 255,
    };
}

impl Default for ShopEntry {
    fn default() -> Self {
        Self::UNSET
    }
}

/// Shop text replacement batch for one shop category.
///
/// Size: 177 bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShopReplace {
    /// 0 caps, 1 clothes, 2 stickers, 3 gifts, 4 moons.
    pub kind: u8,
    /// Entries; only the category's count are meaningful.
    pub entries: [ShopEntry; Self::COUNT],
}

impl ShopReplace {
    /// Entries per packet.
    pub const COUNT: usize = 44;
    /// Size in bytes.
    pub const SIZE: usize = 1 + Self::COUNT * ShopEntry::SIZE;
}

impl Default for ShopReplace {
    fn default() -> Self {
        Self {
            kind: 0,
            entries: [ShopEntry::UNSET; Self::COUNT],
        }
    }
}

/// One shine text replacement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShineEntry {
    /// Source item type.
    pub item_type: u8,
    /// Index into the shine item names; 255 is invalid.
    pub name_index: u8,
}

impl ShineEntry {
    /// Size in bytes.
    pub const SIZE: usize = 2;
    /// Name index meaning "no replacement".
    pub const INVALID_NAME: u8 = 255;
}

/// Shine text replacement batch.
///
/// Size: 200 bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShineReplace {
    /// Entries indexed by hint index.
    pub entries: [ShineEntry; Self::COUNT],
}

impl ShineReplace {
    /// Entries per packet.
    pub const COUNT: usize = 100;
    /// Size in bytes.
    pub const SIZE: usize = Self::COUNT * ShineEntry::SIZE;
}

impl Default for ShineReplace {
    fn default() -> Self {
        Self {
            entries: [ShineEntry::default(); Self::COUNT],
        }
    }
}

/// UDP port announcement.
///
/// Size: 2 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UdpInit {
    /// Sender's UDP port.
    pub port: u16,
}

impl UdpInit {
    /// Size in bytes.
    pub const SIZE: usize = 2;
}

/// One shine colour assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShineColorEntry {
    /// Shine unique id; negative is empty.
    pub uid: i16,
    /// Colour index.
    pub color: u8,
}

impl ShineColorEntry {
    /// Size in bytes.
    pub const SIZE: usize = 3;
}

impl Default for ShineColorEntry {
    fn default() -> Self {
        Self { uid: -1, color: 0 }
    }
}

/// Shine colour batch.
///
/// Size: 153 bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShineColor {
    /// Entries.
    pub entries: [ShineColorEntry; Self::COUNT],
}

impl ShineColor {
    /// Entries per packet.
    pub const COUNT: usize = 51;
    /// Size in bytes.
    pub const SIZE: usize = Self::COUNT * ShineColorEntry::SIZE;
}

impl Default for ShineColor {
    fn default() -> Self {
        Self {
            entries: [ShineColorEntry::default(); Self::COUNT],
        }
    }
}

/// Decoded body, one variant per packet type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PacketBody {
    /// Handshake.
    ClientInit(Init),
    /// Player transform.
    PlayerInfo(PlayerInf),
    /// Cap transform.
    HackCapInfo(HackCapInf),
    /// Stage info.
    GameInfo(GameInf),
    /// Tag state.
    TagInfo(TagInf),
    /// Player joined.
    PlayerConnect(PlayerConnect),
    /// Player left.
    PlayerDisconnect,
    /// Outfit.
    CostumeInfo(CostumeInf),
    /// Location check.
    Check(Check),
    /// Capture.
    CaptureInfo(CaptureInf),
    /// Stage change.
    ChangeStage(ChangeStage),
    /// Console command.
    Command(ServerCommand),
    /// Shop purchase.
    ItemCollect(ItemCollect),
    /// Filler item.
    FillerCollect(FillerCollect),
    /// Chat.
    ChatMessage(ChatMessage),
    /// Slot data.
    SlotData(SlotData),
    /// World unlock.
    UnlockWorld(UnlockWorld),
    /// Regional coin.
    RegionalCollect(RegionalCollect),
    /// Death link.
    Deathlink,
    /// Scenario progress.
    Progress(Progress),
    /// Collected shines.
    ShineChecks(ShineChecks),
    /// Name catalog.
    ApInfo(ApInfo),
    /// Shop text.
    ShopReplace(ShopReplace),
    /// Shine text.
    ShineReplace(ShineReplace),
    /// UDP port.
    UdpInit(UdpInit),
    /// UDP keepalive.
    HolePunch,
    /// Shine colours.
    ShineColor(ShineColor),
}

impl PacketBody {
    /// Returns the packet type.
    #[must_use]
    pub const fn packet_type(&self) -> PacketType {
        match self {
            Self::ClientInit(_) => PacketType::ClientInit,
            Self::PlayerInfo(_) => PacketType::PlayerInfo,
            Self::HackCapInfo(_) => PacketType::HackCapInfo,
            Self::GameInfo(_) => PacketType::GameInfo,
            Self::TagInfo(_) => PacketType::TagInfo,
            Self::PlayerConnect(_) => PacketType::PlayerConnect,
            Self::PlayerDisconnect => PacketType::PlayerDisconnect,
            Self::CostumeInfo(_) => PacketType::CostumeInfo,
            Self::Check(_) => PacketType::Check,
            Self::CaptureInfo(_) => PacketType::CaptureInfo,
            Self::ChangeStage(_) => PacketType::ChangeStage,
            Self::Command(_) => PacketType::Command,
            Self::ItemCollect(_) => PacketType::ItemCollect,
            Self::FillerCollect(_) => PacketType::FillerCollect,
            Self::ChatMessage(_) => PacketType::ChatMessage,
            Self::SlotData(_) => PacketType::SlotData,
            Self::UnlockWorld(_) => PacketType::UnlockWorld,
            Self::RegionalCollect(_) => PacketType::RegionalCollect,
            Self::Deathlink => PacketType::Deathlink,
            Self::Progress(_) => PacketType::Progress,
            Self::ShineChecks(_) => PacketType::ShineChecks,
            Self::ApInfo(_) => PacketType::ApInfo,
            Self::ShopReplace(_) => PacketType::ShopReplace,
            Self::ShineReplace(_) => PacketType::ShineReplace,
            Self::UdpInit(_) => PacketType::UdpInit,
            Self::HolePunch => PacketType::HolePunch,
            Self::ShineColor(_) => PacketType::ShineColor,
        }
    }
}

/// A complete packet: owner identity plus typed body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Packet {
    /// Player the packet is about.
    pub owner: PlayerId,
    /// Typed body.
    pub body: PacketBody,
}

impl Packet {
    /// Creates a packet.
    #[inline]
    #[must_use]
    pub const fn new(owner: PlayerId, body: PacketBody) -> Self {
        Self { owner, body }
    }

    /// Returns the packet type.
    #[inline]
    #[must_use]
    pub const fn packet_type(&self) -> PacketType {
        self.body.packet_type()
    }

    /// Builds the wire header.
    #[inline]
    #[must_use]
    pub const fn header(&self) -> PacketHeader {
        PacketHeader::new(self.owner, self.body.packet_type())
    }

    /// Encoded size, header included.
    #[inline]
    #[must_use]
    pub const fn wire_size(&self) -> usize {
        PacketHeader::SIZE + self.body.packet_type().body_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odyssey_shared::MAX_PACKET_SIZE;

    #[test]
    fn test_packet_sizes() {
        assert_eq!(PlayerInf::SIZE, 12 + 16 + 24 + 4);
        assert_eq!(HackCapInf::SIZE, 12 + 16 + 1 + PACKBUFSIZE);
        assert_eq!(GameInf::SIZE, 2 + STAGENAMESIZE);
        assert_eq!(PlayerConnect::SIZE, 4 + 2 + COSTUMEBUFSIZE);
        assert_eq!(Check::SIZE, 12 + OBJECTIDSIZE + PACKBUFSIZE + 4);
        assert_eq!(ChangeStage::SIZE, PACKBUFSIZE + OBJECTIDSIZE + 2);
        assert_eq!(ItemCollect::SIZE, ITEMNAMESIZE + 4);
        assert_eq!(SlotData::SIZE, 13 * 2 + 2);
        assert_eq!(ApInfo::SIZE, 8 + 3 * APNAMESIZE);
        assert_eq!(ShopReplace::SIZE, 177);
        assert_eq!(ShineColor::SIZE, 153);
    }

    #[test]
    fn test_every_packet_fits() {
        for ty in PacketType::ALL {
            assert!(
                PacketHeader::SIZE + ty.body_size() <= MAX_PACKET_SIZE,
                "{} too large",
                ty.name()
            );
        }
    }

    #[test]
    fn test_type_tag_range() {
        assert_eq!(PacketType::from_raw(0), None);
        assert_eq!(PacketType::from_raw(-3), None);
        assert_eq!(PacketType::from_raw(PacketType::END), None);
        assert_eq!(PacketType::from_raw(9), Some(PacketType::Check));
        assert_eq!(PacketType::from_raw(27), Some(PacketType::ShineColor));

        for (i, ty) in PacketType::ALL.iter().enumerate() {
            assert_eq!(*ty as usize, i);
        }
    }

    #[test]
    fn test_header_payload_len() {
        let header = PacketHeader::new(PlayerId::NIL, PacketType::GameInfo);
        assert_eq!(usize::from(header.payload_len), GameInf::SIZE);
        assert_eq!(header.kind(), Some(PacketType::GameInfo));
    }
}
