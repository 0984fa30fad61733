//! # Protocol Constants
//!
//! Sizes and defaults baked into the wire format. Changing any of the buffer
//! sizes is a protocol break.

// =============================================================================
// CONNECTION DEFAULTS
// =============================================================================

/// Server address used when none is configured.
pub const DEFAULT_SERVER_IP: &str = "127.0.0.1";

/// Server port used when the configured port is 0.
pub const DEFAULT_SERVER_PORT: u16 = 1027;

/// Largest encoded packet, header included.
pub const MAX_PACKET_SIZE: usize = 0x100;

// =============================================================================
// FIXED STRING WIDTHS
// =============================================================================

/// Animation / stage / command buffers.
pub const PACKBUFSIZE: usize = 0x30;

/// Costume and client name buffers.
pub const COSTUMEBUFSIZE: usize = 0x20;

/// Game, slot and item name buffers in `ApInfo`.
pub const APNAMESIZE: usize = 0x28;

/// Item name buffer in `ItemCollect`.
pub const ITEMNAMESIZE: usize = 0x80;

/// One chat line.
pub const APMESSAGESIZE: usize = 0x4B;

/// Placement object id buffer.
pub const OBJECTIDSIZE: usize = 0x10;

/// Stage name buffer in `GameInfo`.
pub const STAGENAMESIZE: usize = 0x40;

// =============================================================================
// WORLD LAYOUT
// =============================================================================

/// Number of worlds with a persisted scenario.
pub const WORLD_COUNT: usize = 17;

/// Scenario entries reset on a new game (one spare past the last world).
pub const SCENARIO_SLOTS: usize = 18;

// =============================================================================
// SPECIAL SHINE IDS
// =============================================================================

/// Capture flags are reported as shine `CAPTURE_SHINE_BASE + capture index`.
pub const CAPTURE_SHINE_BASE: i32 = 3700;

/// Reported when the credits start.
pub const SHINE_ID_CREDITS: i32 = 2500;

/// Reported when Bowser is beaten in the cloud world.
pub const SHINE_ID_CLOUD_BOWSER: i32 = 2501;

/// Outfit ledger index stride between body (kind 0) and cap (kind 1).
pub const OUTFIT_KIND_STRIDE: usize = 44;
