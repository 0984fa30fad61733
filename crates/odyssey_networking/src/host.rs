//! # Game Host Interface
//!
//! The sync layer never touches the game directly. The embedding side
//! implements [`GameHost`]; the client samples it for outbound state and
//! applies queued [`GameEffect`]s to it on the main thread.
//!
//! ```text
//! read thread                     main thread
//! ┌──────────────┐  GameEffect   ┌──────────────┐
//! │ SyncState    │ ────────────▶ │ Client::     │ ──▶ impl GameHost
//! │ (handlers)   │   (channel)   │   update()   │
//! └──────────────┘               └──────────────┘
//! ```

use std::collections::HashSet;

use odyssey_shared::constants::{OBJECTIDSIZE, PACKBUFSIZE};
use odyssey_shared::names::world_of_home_stage;
use odyssey_shared::{FixedStr, ItemKind, Quat, Vec3, WorldId};

// ============================================================================
// SAMPLES (game → sync layer)
// ============================================================================

/// Local player state read once per fast tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerSample {
    /// World position.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// Animation blend weights.
    pub blend_weights: [f32; 6],
    /// Current action name.
    pub act_name: String,
    /// Current sub action name.
    pub sub_act_name: String,
    /// Actor class of the current capture, if capturing.
    pub capture_class: Option<String>,
}

/// Thrown cap state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CapSample {
    /// Cap is in flight.
    pub is_flying: bool,
    /// Cap position.
    pub position: Vec3,
    /// Cap orientation.
    pub rotation: Quat,
    /// Cap action name.
    pub anim: String,
}

/// Stage the local player is in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageSample {
    /// Stage name.
    pub stage: String,
    /// Scenario number.
    pub scenario: u8,
    /// Player is in a 2D section.
    pub is_2d: bool,
}

/// Worn outfit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CostumeSample {
    /// Body outfit name.
    pub body: String,
    /// Cap outfit name.
    pub cap: String,
}

/// Stage transition request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageChange {
    /// Target stage.
    pub stage: FixedStr<PACKBUFSIZE>,
    /// Entrance id in the target stage.
    pub entrance: FixedStr<OBJECTIDSIZE>,
    /// Scenario, `-1` to keep the current one.
    pub scenario: i8,
    /// Sub-scenario kind.
    pub sub_scenario_type: u8,
}

// ============================================================================
// EFFECTS (sync layer → game)
// ============================================================================

/// A game mutation produced on the read thread and applied on the main thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEffect {
    /// Add coins.
    AddCoins(i32),
    /// Mark an item bought.
    BuyItem {
        /// Item category.
        kind: ItemKind,
        /// Canonical item name.
        name: &'static str,
    },
    /// Put on an outfit.
    Wear {
        /// Body or cap.
        kind: ItemKind,
        /// Canonical outfit name.
        name: &'static str,
    },
    /// Register a capture in the capture list.
    AddCapture(&'static str),
    /// Move the player.
    ChangeStage(StageChange),
    /// Unlock a world on the map.
    UnlockWorld(i32),
    /// Kill the local player (deathlink).
    Kill,
}

impl GameEffect {
    /// Applies this effect to the game.
    pub fn apply(self, host: &mut impl GameHost) {
        match self {
            Self::AddCoins(amount) => host.add_coins(amount),
            Self::BuyItem { kind, name } => host.buy_item(kind, name),
            Self::Wear { kind, name } => host.wear(kind, name),
            Self::AddCapture(name) => host.add_capture(name),
            Self::ChangeStage(change) => host.change_stage(&change),
            Self::UnlockWorld(world) => host.unlock_world(world),
            Self::Kill => host.kill_player(),
        }
    }
}

// ============================================================================
// HOST TRAIT
// ============================================================================

/// The game, as seen by the sync layer.
///
/// Only ever called from the main thread.
pub trait GameHost {
    /// Local player, `None` while no player actor exists.
    fn player(&self) -> Option<PlayerSample>;

    /// Thrown cap, `None` while no cap actor exists.
    fn hack_cap(&self) -> Option<CapSample>;

    /// Current stage, `None` outside of a stage scene.
    fn stage(&self) -> Option<StageSample>;

    /// Worn outfit.
    fn costume(&self) -> Option<CostumeSample>;

    /// True while the local player is dead.
    fn is_player_dead(&self) -> bool;

    /// Adds coins.
    fn add_coins(&mut self, amount: i32);

    /// Marks an item bought without charging for it.
    fn buy_item(&mut self, kind: ItemKind, name: &str);

    /// Wears an outfit.
    fn wear(&mut self, kind: ItemKind, name: &str);

    /// Adds a capture to the capture list.
    fn add_capture(&mut self, name: &str);

    /// Starts a stage transition.
    fn change_stage(&mut self, change: &StageChange);

    /// Unlocks a world.
    fn unlock_world(&mut self, world: i32);

    /// Kills the local player.
    fn kill_player(&mut self);

    /// True if the save already has shine `uid`.
    fn is_shine_obtained(&self, uid: i32) -> bool;

    /// Marks shine `uid` obtained in the save.
    fn set_shine_obtained(&mut self, uid: i32);

    /// Brings a collected shine actor in the loaded stage back to life.
    fn revive_shine(&mut self, uid: i32);

    /// World that owns `stage`.
    fn world_of_stage(&self, stage: &str) -> Option<WorldId> {
        world_of_home_stage(stage)
    }

    /// Recounts collected shines for the HUD.
    fn refresh_shine_counter(&mut self) {}

    /// True while hide-and-seek is the selected game mode.
    fn is_tag_mode(&self) -> bool {
        false
    }
}

// ============================================================================
// HEADLESS HOST
// ============================================================================

/// Something a [`HeadlessHost`] was asked to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// Coins added.
    Coins(i32),
    /// Item bought.
    Bought(ItemKind, String),
    /// Outfit worn.
    Wore(ItemKind, String),
    /// Capture registered.
    Captured(String),
    /// Stage change started.
    StageChanged(StageChange),
    /// World unlocked.
    WorldUnlocked(i32),
    /// Player killed.
    Killed,
    /// Shine marked obtained.
    ShineObtained(i32),
    /// Shine actor revived.
    ShineRevived(i32),
}

/// A game stand-in with settable samples and an event log.
///
/// Used by the headless client binary and by tests.
#[derive(Clone, Debug, Default)]
pub struct HeadlessHost {
    /// Returned by [`GameHost::player`].
    pub player: Option<PlayerSample>,
    /// Returned by [`GameHost::hack_cap`].
    pub cap: Option<CapSample>,
    /// Returned by [`GameHost::stage`].
    pub stage: Option<StageSample>,
    /// Returned by [`GameHost::costume`].
    pub costume: Option<CostumeSample>,
    /// Returned by [`GameHost::is_player_dead`].
    pub dead: bool,
    /// Returned by [`GameHost::is_tag_mode`].
    pub tag_mode: bool,
    /// Shines the save already holds.
    pub obtained_shines: HashSet<i32>,
    /// Shine actors currently loaded and collected.
    pub dead_shine_actors: HashSet<i32>,
    /// Everything applied so far, oldest first.
    pub events: Vec<HostEvent>,
}

impl HeadlessHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains the event log.
    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }
}

impl GameHost for HeadlessHost {
    fn player(&self) -> Option<PlayerSample> {
        self.player.clone()
    }

    fn hack_cap(&self) -> Option<CapSample> {
        self.cap.clone()
    }

    fn stage(&self) -> Option<StageSample> {
        self.stage.clone()
    }

    fn costume(&self) -> Option<CostumeSample> {
        self.costume.clone()
    }

    fn is_player_dead(&self) -> bool {
        self.dead
    }

    fn add_coins(&mut self, amount: i32) {
        self.events.push(HostEvent::Coins(amount));
    }

    fn buy_item(&mut self, kind: ItemKind, name: &str) {
        self.events.push(HostEvent::Bought(kind, name.to_owned()));
    }

    fn wear(&mut self, kind: ItemKind, name: &str) {
        self.events.push(HostEvent::Wore(kind, name.to_owned()));
    }

    fn add_capture(&mut self, name: &str) {
        self.events.push(HostEvent::Captured(name.to_owned()));
    }

    fn change_stage(&mut self, change: &StageChange) {
        self.events.push(HostEvent::StageChanged(*change));
    }

    fn unlock_world(&mut self, world: i32) {
        self.events.push(HostEvent::WorldUnlocked(world));
    }

    fn kill_player(&mut self) {
        self.dead = true;
        self.events.push(HostEvent::Killed);
    }

    fn is_shine_obtained(&self, uid: i32) -> bool {
        self.obtained_shines.contains(&uid)
    }

    fn set_shine_obtained(&mut self, uid: i32) {
        self.obtained_shines.insert(uid);
        self.events.push(HostEvent::ShineObtained(uid));
    }

    fn revive_shine(&mut self, uid: i32) {
        if self.dead_shine_actors.remove(&uid) {
            self.events.push(HostEvent::ShineRevived(uid));
        }
    }

    fn is_tag_mode(&self) -> bool {
        self.tag_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effects_reach_host() {
        let mut host = HeadlessHost::new();
        GameEffect::AddCoins(50).apply(&mut host);
        GameEffect::Wear {
            kind: ItemKind::Cap,
            name: "MarioTuxedo",
        }
        .apply(&mut host);
        GameEffect::Kill.apply(&mut host);

        assert!(host.dead);
        assert_eq!(
            host.take_events(),
            vec![
                HostEvent::Coins(50),
                HostEvent::Wore(ItemKind::Cap, "MarioTuxedo".to_owned()),
                HostEvent::Killed,
            ]
        );
        assert!(host.events.is_empty());
    }

    #[test]
    fn test_revive_only_loaded_actors() {
        let mut host = HeadlessHost::new();
        host.dead_shine_actors.insert(218);
        host.revive_shine(218);
        host.revive_shine(218);
        host.revive_shine(5);
        assert_eq!(host.events, vec![HostEvent::ShineRevived(218)]);
    }

    #[test]
    fn test_default_world_lookup() {
        let host = HeadlessHost::new();
        assert_eq!(host.world_of_stage("CityWorldHomeStage"), Some(7));
        assert_eq!(host.world_of_stage("Nowhere"), None);
    }
}
