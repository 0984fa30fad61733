//! # ODYSSEY Shared
//!
//! Value types used on both sides of the sync layer.
//!
//! ## Contents
//!
//! - [`math`]: `Vec3` and `Quat`, laid out exactly as they travel on the wire
//! - [`id`]: the 128-bit opaque player identity carried in every packet header
//! - [`fixed_str`]: NUL-padded fixed-width string fields
//! - [`names`]: canonical name tables (costumes, stickers, souvenirs, captures, worlds)
//! - [`anim`]: player animation codes and their display names
//! - [`constants`]: buffer sizes, defaults and special shine IDs
//!
//! The ledger invariant lives here: every bit index comes out of a name table
//! lookup, and a failed lookup is `None`, never a sentinel that could be used
//! as an index.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod anim;
pub mod constants;
pub mod fixed_str;
pub mod id;
pub mod math;
pub mod names;

pub use anim::PlayerAnim;
pub use constants::{DEFAULT_SERVER_IP, DEFAULT_SERVER_PORT, MAX_PACKET_SIZE, WORLD_COUNT};
pub use fixed_str::FixedStr;
pub use id::PlayerId;
pub use math::{Quat, Vec3};
pub use names::{ItemKind, WorldId};
