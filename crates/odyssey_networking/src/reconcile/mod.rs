//! # State Reconciliation
//!
//! Turns inbound packets into client state.
//!
//! ## Threading
//!
//! [`SyncState::apply`] runs on the read thread with the state lock held.
//! Anything that has to touch the game is queued as a [`GameEffect`] and
//! applied on the main thread by [`SyncState::apply_effect`]. Shine grants
//! go through the ledger's pending queue and are drained by
//! [`SyncState::drain_pending_shines`], also on the main thread.
//!
//! ## Failure Policy
//!
//! Handlers never fail. A packet naming an unknown player, or carrying an
//! index outside a name table, is logged and its effect dropped.

mod puppets;
mod tables;

pub use puppets::{PuppetInfo, PuppetTable, MAX_PUPPETS};
pub use tables::{
    RandomizerTables, ShopCategory, CLASSIFICATION_ERROR, CLASSIFICATION_JUNK,
    CLASSIFICATION_USEFUL, NAME_CAPACITY, SHINE_COLOR_CAPACITY,
};

use crossbeam_channel::Sender;
use odyssey_shared::constants::STAGENAMESIZE;
use odyssey_shared::names::CAPTURE_NAMES;
use odyssey_shared::{FixedStr, ItemKind, PlayerId};
use tracing::{debug, info, warn};

use crate::host::{GameEffect, GameHost, StageChange};
use crate::ledger::ProgressLedger;
use crate::protocol::{
    ChangeStage, Check, Packet, PacketBody, Progress, ShineChecks, SlotData, TagInf,
};

/// Check item types below zero are pseudo-items.
pub mod item_type {
    /// Coins. Amount in `Check::amount`.
    pub const COINS: i32 = -2;
    /// Shine grant. Shine uid in `Check::location_id`.
    pub const SHINE: i32 = -1;
    /// Body outfit.
    pub const CLOTH: i32 = 0;
    /// Cap outfit.
    pub const CAP: i32 = 1;
    /// Souvenir.
    pub const SOUVENIR: i32 = 2;
    /// Sticker.
    pub const STICKER: i32 = 3;
    /// Capture.
    pub const CAPTURE: i32 = 5;
}

const HOME_STAGE_GUARD: &str = "CapWorldHomeStage";

/// Local hide-and-seek state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TagState {
    /// Local player is "it".
    pub is_it: bool,
    /// Timer seconds.
    pub seconds: u8,
    /// Timer minutes.
    pub minutes: u16,
}

/// Everything the read thread writes.
#[derive(Debug)]
pub struct SyncState {
    self_id: PlayerId,
    /// Remote players.
    pub puppets: PuppetTable,
    /// Save progress.
    pub ledger: ProgressLedger,
    /// Randomizer text tables.
    pub tables: RandomizerTables,
    /// Local tag state.
    pub tag: TagState,
    ap_death: bool,
    dying: bool,
    local_stage: FixedStr<STAGENAMESIZE>,
    local_scenario: i8,
}

impl SyncState {
    /// Creates the state for the local player `self_id`.
    #[must_use]
    pub fn new(self_id: PlayerId) -> Self {
        Self {
            self_id,
            puppets: PuppetTable::new(),
            ledger: ProgressLedger::new(),
            tables: RandomizerTables::new(),
            tag: TagState::default(),
            ap_death: false,
            dying: false,
            local_stage: FixedStr::empty(),
            local_scenario: -1,
        }
    }

    /// Local player id.
    #[inline]
    #[must_use]
    pub const fn self_id(&self) -> PlayerId {
        self.self_id
    }

    /// Dispatches one inbound packet.
    ///
    /// Connection-level packets (`ClientInit` aside) are the client's
    /// business and are ignored here.
    pub fn apply(&mut self, packet: &Packet, effects: &Sender<GameEffect>) {
        let owner = packet.owner;
        match &packet.body {
            PacketBody::ClientInit(init) => self.puppets.set_max_players(init.max_players),
            PacketBody::PlayerInfo(inf) => {
                if let Some(p) = self.puppets.find_puppet_info(owner, false) {
                    p.apply_player_info(inf);
                }
            }
            PacketBody::HackCapInfo(inf) => {
                if let Some(p) = self.puppets.find_puppet_info(owner, false) {
                    p.apply_hack_cap(inf);
                }
            }
            PacketBody::CaptureInfo(inf) => {
                if let Some(p) = self.puppets.find_puppet_info(owner, false) {
                    p.apply_capture(inf);
                }
            }
            PacketBody::CostumeInfo(inf) => {
                if let Some(p) = self.puppets.find_puppet_info(owner, false) {
                    p.apply_costume(inf);
                }
            }
            PacketBody::GameInfo(inf) => {
                let (stage, scenario) = (self.local_stage, self.local_scenario);
                if let Some(p) = self.puppets.find_puppet_info(owner, false) {
                    p.apply_game_info(inf, stage.as_str(), scenario);
                }
            }
            PacketBody::TagInfo(inf) => self.on_tag_info(owner, inf),
            PacketBody::PlayerConnect(con) => {
                self.puppets.connect(owner, con.client_name);
            }
            PacketBody::PlayerDisconnect => {
                self.puppets.disconnect(owner);
            }
            PacketBody::Check(check) => self.on_check(check, effects),
            PacketBody::ShineChecks(batch) => self.on_shine_checks(batch),
            PacketBody::ChangeStage(change) => Self::on_change_stage(change, effects),
            PacketBody::Progress(progress) => self.on_progress(progress),
            PacketBody::UnlockWorld(unlock) => {
                info!(world = unlock.world_id, "world unlocked");
                send(effects, GameEffect::UnlockWorld(unlock.world_id));
            }
            PacketBody::Deathlink => {
                info!("deathlink received");
                self.ap_death = true;
                self.dying = true;
            }
            PacketBody::SlotData(slot) => self.on_slot_data(slot),
            PacketBody::ApInfo(inf) => self.tables.apply_ap_info(inf),
            PacketBody::ShopReplace(batch) => self.tables.apply_shop_replace(batch),
            PacketBody::ShineReplace(batch) => self.tables.apply_shine_replace(batch),
            PacketBody::ShineColor(batch) => self.tables.apply_shine_color(batch),
            PacketBody::ChatMessage(msg) => self.tables.set_chat(msg),
            PacketBody::Command(cmd) => {
                info!(command = cmd.command.as_str(), "server command");
            }
            PacketBody::ItemCollect(_)
            | PacketBody::FillerCollect(_)
            | PacketBody::RegionalCollect(_)
            | PacketBody::UdpInit(_)
            | PacketBody::HolePunch => {
                debug!(packet = packet.packet_type().name(), "not handled by state");
            }
        }
    }

    fn on_tag_info(&mut self, owner: PlayerId, inf: &TagInf) {
        if owner == self.self_id {
            if inf.update_type & TagInf::UPDATE_STATE != 0 {
                self.tag.is_it = inf.is_it;
            }
            if inf.update_type & TagInf::UPDATE_TIME != 0 {
                self.tag.seconds = inf.seconds;
                self.tag.minutes = inf.minutes;
            }
            return;
        }
        if let Some(p) = self.puppets.find_puppet_info(owner, false) {
            p.apply_tag(inf);
        }
    }

    /// Applies a randomizer grant.
    ///
    /// Coins and outfit wearing only happen for a check index newer than the
    /// cursor, and only those two move it. Ownership grants are gated by the
    /// ledger bit, shine grants by the shine ledger.
    fn on_check(&mut self, check: &Check, effects: &Sender<GameEffect>) {
        if check.item_type == item_type::SHINE {
            if self.ledger.has_shine(check.location_id) {
                debug!(uid = check.location_id, "shine already collected");
            } else {
                self.ledger.enqueue_shine(check.location_id);
            }
            return;
        }

        let is_new = self.ledger.is_new_check_index(check.index);
        if check.item_type == item_type::COINS {
            if is_new {
                send(effects, GameEffect::AddCoins(check.amount));
                self.ledger.observe_check_index(check.index);
            }
            return;
        }

        let Ok(index) = usize::try_from(check.location_id) else {
            warn!(location = check.location_id, "negative check location");
            return;
        };

        match check.item_type {
            item_type::CLOTH | item_type::CAP | item_type::SOUVENIR | item_type::STICKER => {
                let Some(kind) = ItemKind::from_raw(check.item_type) else {
                    return;
                };
                let Some(&name) = kind.table().get(index) else {
                    warn!(?kind, index, "check names an unknown item");
                    return;
                };
                if self.ledger.add_item_at(kind, index) {
                    send(effects, GameEffect::BuyItem { kind, name });
                }
                if is_new && matches!(kind, ItemKind::Cloth | ItemKind::Cap) {
                    send(effects, GameEffect::Wear { kind, name });
                    self.ledger.observe_check_index(check.index);
                }
            }
            item_type::CAPTURE => {
                let Some(&name) = CAPTURE_NAMES.get(index) else {
                    warn!(index, "check names an unknown capture");
                    return;
                };
                if self.ledger.add_capture_at(index) {
                    send(effects, GameEffect::AddCapture(name));
                }
            }
            other => warn!(item_type = other, "unknown check item type"),
        }
    }

    /// Marks every listed shine as already reported. `-1` entries are unused.
    fn on_shine_checks(&mut self, batch: &ShineChecks) {
        let added = batch
            .uids
            .iter()
            .filter(|&&uid| uid >= 0)
            .filter(|&&uid| self.ledger.set_shine(i32::from(uid)))
            .count();
        debug!(added, "shine checks merged");
    }

    fn on_change_stage(change: &ChangeStage, effects: &Sender<GameEffect>) {
        info!(
            stage = change.stage.as_str(),
            entrance = change.entrance.as_str(),
            scenario = change.scenario,
            "server requested stage change"
        );
        send(
            effects,
            GameEffect::ChangeStage(StageChange {
                stage: change.stage,
                entrance: change.entrance,
                scenario: change.scenario,
                sub_scenario_type: change.sub_scenario_type,
            }),
        );
    }

    fn on_progress(&mut self, progress: &Progress) {
        match usize::try_from(progress.world_id) {
            Ok(world) if self.ledger.scenario(world).is_some() => {
                self.ledger.advance_scenario(world, progress.scenario);
            }
            _ => warn!(world = progress.world_id, "progress for unknown world"),
        }
    }

    fn on_slot_data(&mut self, slot: &SlotData) {
        for (&world, &cost) in SlotData::WORLDS.iter().zip(&slot.world_costs) {
            self.ledger.set_world_cost(world, i32::from(cost));
        }
        self.tables.apply_slot_flags(slot.regionals, slot.captures);
        info!(
            regionals = slot.regionals,
            captures = slot.captures,
            "slot data received"
        );
    }

    // =========================================================================
    // Main thread
    // =========================================================================

    /// Applies a queued effect, keeping the scenario cache in step with
    /// server-driven stage changes.
    pub fn apply_effect(&mut self, effect: GameEffect, host: &mut impl GameHost) {
        if let GameEffect::ChangeStage(change) = &effect {
            if change.scenario > 0 {
                match host.world_of_stage(change.stage.as_str()) {
                    Some(world) => {
                        self.ledger
                            .advance_scenario(world, i32::from(change.scenario));
                    }
                    None => debug!(stage = change.stage.as_str(), "stage has no world"),
                }
            }
        }
        effect.apply(host);
    }

    /// Reconciles queued shine grants against the save.
    ///
    /// Skipped entirely (grants stay queued) at the very start of the game.
    /// Returns the number of shines newly marked obtained.
    pub fn drain_pending_shines(&mut self, host: &mut impl GameHost) -> usize {
        if !self.ledger.has_pending_shines() {
            return 0;
        }
        if self.local_stage.as_str() == HOME_STAGE_GUARD && matches!(self.local_scenario, 0 | 1) {
            return 0;
        }

        let mut obtained = 0;
        for uid in self.ledger.take_pending_shines() {
            if !host.is_shine_obtained(uid) {
                host.set_shine_obtained(uid);
                obtained += 1;
                if self.ledger.is_live_shine(uid) {
                    host.revive_shine(uid);
                }
            }
            self.ledger.set_shine(uid);
        }
        debug!(obtained, "pending shines drained");
        obtained
    }

    /// Records where the local player is.
    ///
    /// A stage change forgets the previous stage's shine actors.
    pub fn set_local_stage(&mut self, stage: &str, scenario: i8) {
        if self.local_stage.as_str() != stage {
            self.ledger.clear_live_shines();
        }
        self.local_stage = FixedStr::new(stage);
        self.local_scenario = scenario;
        self.puppets.refresh_same_stage(stage, scenario);
    }

    /// Local stage name.
    #[must_use]
    pub fn local_stage(&self) -> &str {
        self.local_stage.as_str()
    }

    /// Takes the pending deathlink kill.
    pub fn take_ap_death(&mut self) -> bool {
        std::mem::take(&mut self.ap_death)
    }

    /// Player is dying from a received deathlink.
    #[must_use]
    pub const fn is_dying(&self) -> bool {
        self.dying
    }

    /// Sets the dying flag.
    pub fn set_dying(&mut self, dying: bool) {
        self.dying = dying;
    }
}

fn send(effects: &Sender<GameEffect>, effect: GameEffect) {
    if effects.send(effect).is_err() {
        warn!(?effect, "effect queue closed, dropping effect");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeadlessHost, HostEvent};
    use crate::protocol::{ConnectionType, GameInf, Init, PlayerConnect, PlayerInf};
    use crossbeam_channel::{unbounded, Receiver};
    use odyssey_shared::names::COSTUME_NAMES;
    use odyssey_shared::{Quat, Vec3};

    const ME: PlayerId = PlayerId([1; 16]);
    const OTHER: PlayerId = PlayerId([2; 16]);

    fn setup() -> (SyncState, Sender<GameEffect>, Receiver<GameEffect>) {
        let (tx, rx) = unbounded();
        let mut state = SyncState::new(ME);
        state.apply(
            &Packet::new(PlayerId::NIL, PacketBody::ClientInit(Init { max_players: 4 })),
            &tx,
        );
        (state, tx, rx)
    }

    fn check(item_type: i32, location_id: i32, index: i32) -> Packet {
        Packet::new(
            PlayerId::NIL,
            PacketBody::Check(Check {
                location_id,
                item_type,
                index,
                amount: 10,
                ..Check::default()
            }),
        )
    }

    fn connect(state: &mut SyncState, tx: &Sender<GameEffect>, id: PlayerId) {
        state.apply(
            &Packet::new(
                id,
                PacketBody::PlayerConnect(PlayerConnect {
                    connection_type: ConnectionType::Init,
                    max_players: 4,
                    client_name: FixedStr::new("Luigi"),
                }),
            ),
            tx,
        );
    }

    #[test]
    fn test_packets_for_unknown_players_are_dropped() {
        let (mut state, tx, _rx) = setup();
        state.apply(
            &Packet::new(OTHER, PacketBody::PlayerInfo(PlayerInf::default())),
            &tx,
        );
        assert_eq!(state.puppets.connect_count(), 0);
        assert!(state.puppets.get(OTHER).is_none());
    }

    #[test]
    fn test_player_info_reaches_puppet() {
        let (mut state, tx, _rx) = setup();
        connect(&mut state, &tx, OTHER);
        state.apply(
            &Packet::new(
                OTHER,
                PacketBody::PlayerInfo(PlayerInf {
                    position: Vec3::new(4.0, 5.0, 6.0),
                    rotation: Quat::ZERO,
                    ..PlayerInf::default()
                }),
            ),
            &tx,
        );
        let puppet = state.puppets.get(OTHER).unwrap();
        assert_eq!(puppet.position, Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(puppet.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_coins_respect_cursor() {
        let (mut state, tx, rx) = setup();
        state.apply(&check(item_type::COINS, 0, 3), &tx);
        state.apply(&check(item_type::COINS, 0, 3), &tx);
        state.apply(&check(item_type::COINS, 0, 2), &tx);

        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![GameEffect::AddCoins(10)]);
        assert_eq!(state.ledger.check_index(), 3);
    }

    #[test]
    fn test_outfit_check() {
        let (mut state, tx, rx) = setup();
        state.apply(&check(item_type::CAP, 1, 5), &tx);
        let name = COSTUME_NAMES[1];
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![
                GameEffect::BuyItem { kind: ItemKind::Cap, name },
                GameEffect::Wear { kind: ItemKind::Cap, name },
            ]
        );
        assert!(state.ledger.has_item_at(ItemKind::Cap, 1));
        assert!(!state.ledger.has_item_at(ItemKind::Cloth, 1));

        state.apply(&check(item_type::CAP, 1, 5), &tx);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_out_of_range_check_is_dropped() {
        let (mut state, tx, rx) = setup();
        state.apply(&check(item_type::STICKER, 400, 1), &tx);
        state.apply(&check(item_type::CAPTURE, -4, 2), &tx);
        state.apply(&check(42, 0, 3), &tx);
        state.apply(&check(item_type::CAP, 4000, 4), &tx);
        assert!(rx.try_recv().is_err());
        assert_eq!(state.ledger.check_index(), -1);
    }

    #[test]
    fn test_ownership_checks_leave_cursor() {
        let (mut state, tx, rx) = setup();
        state.apply(&check(item_type::STICKER, 0, 8), &tx);
        state.apply(&check(item_type::SOUVENIR, 0, 9), &tx);
        state.apply(&check(item_type::CAPTURE, 51, 10), &tx);
        assert_eq!(state.ledger.check_index(), -1);
        rx.try_iter().for_each(drop);

        state.apply(&check(item_type::COINS, 0, 7), &tx);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![GameEffect::AddCoins(10)]);
        assert_eq!(state.ledger.check_index(), 7);

        state.apply(&check(item_type::CLOTH, 2, 11), &tx);
        assert_eq!(state.ledger.check_index(), 11);
    }

    #[test]
    fn test_capture_check() {
        let (mut state, tx, rx) = setup();
        state.apply(&check(item_type::CAPTURE, 51, 1), &tx);
        assert_eq!(rx.try_recv().ok(), Some(GameEffect::AddCapture("Yoshi")));
        assert!(state.ledger.has_capture("Yoshi"));
    }

    #[test]
    fn test_shine_grant_drain() {
        let (mut state, tx, rx) = setup();
        state.apply(&check(item_type::SHINE, 218, 0), &tx);
        assert!(rx.try_recv().is_err());
        assert!(state.ledger.has_pending_shines());

        let mut host = HeadlessHost::new();
        host.dead_shine_actors.insert(218);
        state.ledger.register_live_shine(218);

        assert_eq!(state.drain_pending_shines(&mut host), 1);
        assert!(state.ledger.has_shine(218));
        assert_eq!(
            host.take_events(),
            vec![HostEvent::ShineObtained(218), HostEvent::ShineRevived(218)]
        );

        state.apply(&check(item_type::SHINE, 218, 0), &tx);
        assert!(!state.ledger.has_pending_shines());
    }

    #[test]
    fn test_drain_waits_at_game_start() {
        let (mut state, tx, _rx) = setup();
        state.set_local_stage("CapWorldHomeStage", 1);
        state.apply(&check(item_type::SHINE, 7, 0), &tx);

        let mut host = HeadlessHost::new();
        assert_eq!(state.drain_pending_shines(&mut host), 0);
        assert!(state.ledger.has_pending_shines());

        state.set_local_stage("CapWorldHomeStage", 2);
        assert_eq!(state.drain_pending_shines(&mut host), 1);
    }

    #[test]
    fn test_shine_checks_merge() {
        let (mut state, tx, _rx) = setup();
        let mut batch = ShineChecks::default();
        batch.uids[0] = 12;
        batch.uids[99] = 3705;
        state.apply(&Packet::new(PlayerId::NIL, PacketBody::ShineChecks(batch)), &tx);
        assert!(state.ledger.has_shine(12));
        assert!(state.ledger.has_shine(3705));
        assert_eq!(state.ledger.shine_count(), 2);
    }

    #[test]
    fn test_own_tag_info() {
        let (mut state, tx, _rx) = setup();
        state.apply(
            &Packet::new(
                ME,
                PacketBody::TagInfo(TagInf {
                    update_type: TagInf::UPDATE_TIME,
                    is_it: true,
                    seconds: 30,
                    minutes: 2,
                }),
            ),
            &tx,
        );
        assert!(!state.tag.is_it);
        assert_eq!((state.tag.minutes, state.tag.seconds), (2, 30));
    }

    #[test]
    fn test_slot_data_costs() {
        let (mut state, tx, _rx) = setup();
        let mut slot = SlotData::default();
        slot.world_costs[0] = 5;
        slot.world_costs[12] = 30;
        slot.captures = true;
        state.apply(&Packet::new(PlayerId::NIL, PacketBody::SlotData(slot)), &tx);
        assert_eq!(state.ledger.world_cost(1), 5);
        assert_eq!(state.ledger.world_cost(16), 30);
        assert!(state.tables.captures());
    }

    #[test]
    fn test_change_stage_advances_scenario_on_apply() {
        let (mut state, tx, rx) = setup();
        state.apply(
            &Packet::new(
                PlayerId::NIL,
                PacketBody::ChangeStage(ChangeStage {
                    stage: FixedStr::new("SandWorldHomeStage"),
                    entrance: FixedStr::new("start"),
                    scenario: 3,
                    sub_scenario_type: 0,
                }),
            ),
            &tx,
        );
        let effect = rx.try_recv().unwrap();
        let mut host = HeadlessHost::new();
        state.apply_effect(effect, &mut host);
        assert_eq!(state.ledger.scenario(2), Some(3));
        assert!(matches!(host.events[0], HostEvent::StageChanged(_)));
    }

    #[test]
    fn test_game_info_same_stage() {
        let (mut state, tx, _rx) = setup();
        connect(&mut state, &tx, OTHER);
        state.set_local_stage("LakeWorldHomeStage", 1);
        state.apply(
            &Packet::new(
                OTHER,
                PacketBody::GameInfo(GameInf {
                    is_2d: false,
                    scenario: 1,
                    stage: FixedStr::new("LakeWorldHomeStage"),
                }),
            ),
            &tx,
        );
        assert!(state.puppets.get(OTHER).unwrap().is_in_same_stage);

        state.set_local_stage("SeaWorldHomeStage", 1);
        assert!(!state.puppets.get(OTHER).unwrap().is_in_same_stage);
    }

    #[test]
    fn test_deathlink_flags() {
        let (mut state, tx, _rx) = setup();
        state.apply(&Packet::new(OTHER, PacketBody::Deathlink), &tx);
        assert!(state.is_dying());
        assert!(state.take_ap_death());
        assert!(!state.take_ap_death());
    }
}
