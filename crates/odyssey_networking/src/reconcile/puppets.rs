//! # Remote Player Slots
//!
//! One [`PuppetInfo`] per remote player, allocated once and reused.
//!
//! ## Design
//!
//! - Fixed-size slot array (no allocation after startup)
//! - Slots are claimed by first-available lookup keyed by [`PlayerId`]
//! - Disconnect clears identity and flags; the slot object is never dropped

use odyssey_shared::constants::{COSTUMEBUFSIZE, PACKBUFSIZE, STAGENAMESIZE};
use odyssey_shared::{FixedStr, PlayerAnim, PlayerId, Quat, Vec3};
use tracing::{debug, info, warn};

use crate::protocol::{CaptureInf, CostumeInf, GameInf, HackCapInf, PlayerInf, TagInf};

/// Slots allocated at startup. The server-announced count is clamped to this.
pub const MAX_PUPPETS: usize = 32;

/// Replicated state of one remote player.
#[derive(Clone, Debug, PartialEq)]
pub struct PuppetInfo {
    /// Owner identity. `NIL` while the slot is free.
    pub id: PlayerId,
    /// Display name from `PlayerConnect`.
    pub name: FixedStr<COSTUMEBUFSIZE>,
    /// Slot is in use.
    pub is_connected: bool,

    /// World position.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// Animation blend weights, each in `[0, 1]`.
    pub blend_weights: [f32; 6],
    /// Main action name.
    pub act_name: &'static str,
    /// Sub action name. Empty when unknown.
    pub sub_act_name: &'static str,

    /// Cap position. Follows the body while the cap is not thrown.
    pub cap_position: Vec3,
    /// Cap orientation.
    pub cap_rotation: Quat,
    /// Cap animation name.
    pub cap_anim: FixedStr<PACKBUFSIZE>,
    /// Cap is in flight.
    pub is_cap_thrown: bool,

    /// Player is capturing something.
    pub is_captured: bool,
    /// Captured form name.
    pub capture_name: FixedStr<COSTUMEBUFSIZE>,

    /// Body costume.
    pub costume_body: FixedStr<COSTUMEBUFSIZE>,
    /// Cap costume.
    pub costume_cap: FixedStr<COSTUMEBUFSIZE>,

    /// Current stage.
    pub stage: FixedStr<STAGENAMESIZE>,
    /// Current scenario, `-1` when unknown.
    pub scenario: i8,
    /// Player is in a 2D section.
    pub is_2d: bool,
    /// Same stage and scenario as the local player.
    pub is_in_same_stage: bool,

    /// Tag game "it" flag.
    pub is_it: bool,
    /// Tag timer seconds.
    pub seconds: u8,
    /// Tag timer minutes.
    pub minutes: u16,
}

impl PuppetInfo {
    /// Creates a free slot.
    #[must_use]
    pub fn new_empty() -> Self {
        Self {
            id: PlayerId::NIL,
            name: FixedStr::empty(),
            is_connected: false,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            blend_weights: [0.0; 6],
            act_name: PlayerAnim::DEFAULT_ACT,
            sub_act_name: "",
            cap_position: Vec3::ZERO,
            cap_rotation: Quat::IDENTITY,
            cap_anim: FixedStr::empty(),
            is_cap_thrown: false,
            is_captured: false,
            capture_name: FixedStr::empty(),
            costume_body: FixedStr::empty(),
            costume_cap: FixedStr::empty(),
            stage: FixedStr::empty(),
            scenario: -1,
            is_2d: false,
            is_in_same_stage: false,
            is_it: false,
            seconds: 0,
            minutes: 0,
        }
    }

    /// Claims this slot for `id`.
    pub fn connect(&mut self, id: PlayerId, name: FixedStr<COSTUMEBUFSIZE>) {
        *self = Self::new_empty();
        self.id = id;
        self.name = name;
        self.is_connected = true;
    }

    /// Frees this slot.
    pub fn disconnect(&mut self) {
        self.id = PlayerId::NIL;
        self.is_connected = false;
        self.scenario = -1;
        self.stage = FixedStr::empty();
        self.is_in_same_stage = false;
        self.is_captured = false;
        self.is_it = false;
    }

    /// Returns true if this slot is in use.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_connected
    }

    /// Mirrors a `PlayerInfo` body.
    pub fn apply_player_info(&mut self, inf: &PlayerInf) {
        self.position = inf.position;

        if inf.rotation.is_acceptable() {
            self.rotation = inf.rotation;
        }

        self.act_name = PlayerAnim::from_code(inf.act)
            .name()
            .unwrap_or(PlayerAnim::DEFAULT_ACT);
        self.sub_act_name = PlayerAnim::from_code(inf.sub_act).name().unwrap_or("");

        for (slot, &weight) in self.blend_weights.iter_mut().zip(&inf.blend_weights) {
            if (0.0..=1.0).contains(&weight) {
                *slot = weight;
            }
        }

        if !self.is_cap_thrown {
            self.cap_position = inf.position;
        }
    }

    /// Mirrors a `HackCapInfo` body.
    pub fn apply_hack_cap(&mut self, inf: &HackCapInf) {
        self.cap_position = inf.position;
        if inf.rotation.is_acceptable() {
            self.cap_rotation = inf.rotation;
        }
        self.is_cap_thrown = inf.is_visible;
        self.cap_anim = inf.anim;
    }

    /// Mirrors a `CaptureInfo` body.
    pub fn apply_capture(&mut self, inf: &CaptureInf) {
        self.is_captured = !inf.hack_name.is_empty();
        if self.is_captured {
            self.capture_name = inf.hack_name;
        }
    }

    /// Mirrors a `CostumeInfo` body.
    pub fn apply_costume(&mut self, inf: &CostumeInf) {
        self.costume_body = inf.body;
        self.costume_cap = inf.cap;
    }

    /// Mirrors a `GameInfo` body and recomputes [`Self::is_in_same_stage`].
    pub fn apply_game_info(&mut self, inf: &GameInf, local_stage: &str, local_scenario: i8) {
        if self.is_connected {
            self.scenario = i8::try_from(inf.scenario).unwrap_or(i8::MAX);
        }
        // Short names are loading placeholders.
        if inf.stage.len() > 3 {
            self.stage = inf.stage;
        }
        self.is_2d = inf.is_2d;
        self.is_in_same_stage =
            self.stage.as_str() == local_stage && self.scenario == local_scenario;
    }

    /// Mirrors the tag state carried by a `TagInfo` body.
    pub fn apply_tag(&mut self, inf: &TagInf) {
        self.is_it = inf.is_it;
        self.seconds = inf.seconds;
        self.minutes = inf.minutes;
    }
}

impl Default for PuppetInfo {
    fn default() -> Self {
        Self::new_empty()
    }
}

/// All remote player slots.
#[derive(Clone, Debug)]
pub struct PuppetTable {
    slots: Vec<PuppetInfo>,
    active: usize,
    connect_count: usize,
}

impl PuppetTable {
    /// Creates a table with every slot allocated and none active.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![PuppetInfo::new_empty(); MAX_PUPPETS],
            active: 0,
            connect_count: 0,
        }
    }

    /// Sizes the table from the server's `maxPlayers` (local player included).
    ///
    /// Slots beyond the new count are freed.
    pub fn set_max_players(&mut self, max_players: u16) {
        let wanted = usize::from(max_players).saturating_sub(1);
        if wanted > MAX_PUPPETS {
            warn!(
                requested = wanted,
                capacity = MAX_PUPPETS,
                "server player count exceeds puppet capacity, clamping"
            );
        }
        self.active = wanted.min(MAX_PUPPETS);

        for slot in &mut self.slots[self.active..] {
            if slot.is_connected {
                slot.disconnect();
                self.connect_count = self.connect_count.saturating_sub(1);
            }
        }
        info!(slots = self.active, "puppet table sized");
    }

    /// Number of usable slots.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.active
    }

    /// Number of connected remote players.
    #[inline]
    #[must_use]
    pub const fn connect_count(&self) -> usize {
        self.connect_count
    }

    /// Resolves the slot for `id`.
    ///
    /// With `find_available`, falls back to the first free slot. Logs and
    /// returns `None` when nothing matches.
    pub fn find_puppet_info(&mut self, id: PlayerId, find_available: bool) -> Option<&mut PuppetInfo> {
        let index = self.find_index(id, find_available);
        match index {
            Some(i) => self.slots.get_mut(i),
            None => {
                if find_available {
                    warn!(player = %id, slots = self.active, "no free puppet slot");
                } else {
                    debug!(player = %id, "no puppet for player");
                }
                None
            }
        }
    }

    fn find_index(&self, id: PlayerId, find_available: bool) -> Option<usize> {
        let active = &self.slots[..self.active];
        if !id.is_nil() {
            if let Some(i) = active.iter().position(|p| p.id == id) {
                return Some(i);
            }
        }
        if find_available {
            return active.iter().position(|p| !p.is_connected);
        }
        None
    }

    /// Read-only lookup by identity.
    #[must_use]
    pub fn get(&self, id: PlayerId) -> Option<&PuppetInfo> {
        self.find_index(id, false).and_then(|i| self.slots.get(i))
    }

    /// Claims a slot for a newly connected player.
    ///
    /// Returns `false` when the player already holds a connected slot or the
    /// table is full.
    pub fn connect(&mut self, id: PlayerId, name: FixedStr<COSTUMEBUFSIZE>) -> bool {
        let Some(slot) = self.find_puppet_info(id, true) else {
            return false;
        };
        if slot.is_connected {
            info!(player = %id, name = slot.name.as_str(), "player already connected");
            return false;
        }
        slot.connect(id, name);
        self.connect_count += 1;
        info!(player = %id, name = name.as_str(), count = self.connect_count, "player connected");
        true
    }

    /// Releases the slot held by `id`.
    pub fn disconnect(&mut self, id: PlayerId) -> bool {
        let Some(slot) = self.find_puppet_info(id, false) else {
            return false;
        };
        if !slot.is_connected {
            return false;
        }
        slot.disconnect();
        self.connect_count = self.connect_count.saturating_sub(1);
        info!(player = %id, count = self.connect_count, "player disconnected");
        true
    }

    /// Frees every slot.
    pub fn disconnect_all(&mut self) {
        for slot in &mut self.slots {
            slot.disconnect();
        }
        self.connect_count = 0;
    }

    /// Recomputes the same-stage flag after the local player moves.
    pub fn refresh_same_stage(&mut self, local_stage: &str, local_scenario: i8) {
        for slot in self.iter_active_mut() {
            slot.is_in_same_stage =
                slot.stage.as_str() == local_stage && slot.scenario == local_scenario;
        }
    }

    /// Connected slots.
    pub fn iter_active(&self) -> impl Iterator<Item = &PuppetInfo> {
        self.slots[..self.active].iter().filter(|p| p.is_connected)
    }

    fn iter_active_mut(&mut self) -> impl Iterator<Item = &mut PuppetInfo> {
        self.slots[..self.active].iter_mut().filter(|p| p.is_connected)
    }
}

impl Default for PuppetTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u128) -> PlayerId {
        PlayerId::from_u128(n)
    }

    #[test]
    fn test_slot_lifecycle() {
        let mut table = PuppetTable::new();
        table.set_max_players(4);
        assert_eq!(table.capacity(), 3);

        assert!(table.connect(id(7), FixedStr::new("Luigi")));
        assert_eq!(table.connect_count(), 1);
        assert!(!table.connect(id(7), FixedStr::new("Luigi")));
        assert_eq!(table.connect_count(), 1);

        assert!(table.disconnect(id(7)));
        assert_eq!(table.connect_count(), 0);
        assert!(table.get(id(7)).is_none());
        assert!(!table.disconnect(id(7)));
    }

    #[test]
    fn test_slot_exhaustion() {
        let mut table = PuppetTable::new();
        table.set_max_players(3);
        assert!(table.connect(id(1), FixedStr::empty()));
        assert!(table.connect(id(2), FixedStr::empty()));

        assert!(table.find_puppet_info(id(3), true).is_none());
        assert!(!table.connect(id(3), FixedStr::empty()));
        assert_eq!(table.connect_count(), 2);
    }

    #[test]
    fn test_freed_slot_is_reused() {
        let mut table = PuppetTable::new();
        table.set_max_players(2);
        table.connect(id(1), FixedStr::empty());
        table.disconnect(id(1));
        assert!(table.connect(id(2), FixedStr::new("Peach")));
        assert_eq!(table.get(id(2)).map(|p| p.name.as_str()), Some("Peach"));
    }

    #[test]
    fn test_shrinking_frees_slots() {
        let mut table = PuppetTable::new();
        table.set_max_players(4);
        table.connect(id(1), FixedStr::empty());
        table.connect(id(2), FixedStr::empty());
        table.set_max_players(2);
        assert_eq!(table.connect_count(), 1);
        assert!(table.get(id(2)).is_none());
    }

    #[test]
    fn test_oversized_server_is_clamped() {
        let mut table = PuppetTable::new();
        table.set_max_players(u16::MAX);
        assert_eq!(table.capacity(), MAX_PUPPETS);
    }

    #[test]
    fn test_player_info_guards() {
        let mut puppet = PuppetInfo::new_empty();
        let mut inf = PlayerInf {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::ZERO,
            blend_weights: [0.5, 2.0, -1.0, 1.0, 0.0, 0.25],
            act: i16::MAX,
            sub_act: -1,
        };
        puppet.blend_weights = [0.1; 6];
        puppet.apply_player_info(&inf);

        assert_eq!(puppet.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(puppet.rotation, Quat::IDENTITY);
        assert_eq!(puppet.blend_weights, [0.5, 0.1, 0.1, 1.0, 0.0, 0.25]);
        assert_eq!(puppet.act_name, "Wait");
        assert_eq!(puppet.sub_act_name, "");
        assert_eq!(puppet.cap_position, inf.position);

        inf.rotation = Quat::new(0.0, 1.0, 0.0, 0.0);
        inf.act = PlayerAnim::from_name("HipDrop").code();
        puppet.apply_player_info(&inf);
        assert_eq!(puppet.rotation, inf.rotation);
        assert_eq!(puppet.act_name, "HipDrop");
    }

    #[test]
    fn test_thrown_cap_keeps_own_position() {
        let mut puppet = PuppetInfo::new_empty();
        puppet.apply_hack_cap(&HackCapInf {
            position: Vec3::new(9.0, 9.0, 9.0),
            rotation: Quat::IDENTITY,
            is_visible: true,
            anim: FixedStr::new("StayR"),
        });
        puppet.apply_player_info(&PlayerInf::default());
        assert_eq!(puppet.cap_position, Vec3::new(9.0, 9.0, 9.0));
        assert_eq!(puppet.cap_anim.as_str(), "StayR");
    }

    #[test]
    fn test_game_info_short_stage_ignored() {
        let mut puppet = PuppetInfo::new_empty();
        puppet.connect(id(1), FixedStr::empty());
        puppet.apply_game_info(
            &GameInf {
                is_2d: false,
                scenario: 2,
                stage: FixedStr::new("SandWorldHomeStage"),
            },
            "SandWorldHomeStage",
            2,
        );
        assert!(puppet.is_in_same_stage);

        puppet.apply_game_info(
            &GameInf {
                is_2d: true,
                scenario: 2,
                stage: FixedStr::new("abc"),
            },
            "SandWorldHomeStage",
            2,
        );
        assert_eq!(puppet.stage.as_str(), "SandWorldHomeStage");
        assert!(puppet.is_2d);
    }

    #[test]
    fn test_capture_name_cleared_flag() {
        let mut puppet = PuppetInfo::new_empty();
        puppet.apply_capture(&CaptureInf {
            hack_name: FixedStr::new("Frog"),
        });
        assert!(puppet.is_captured);
        puppet.apply_capture(&CaptureInf::default());
        assert!(!puppet.is_captured);
        assert_eq!(puppet.capture_name.as_str(), "Frog");
    }
}
