//! # Outbound Diff and Throttle
//!
//! Builds outbound packets from sampled game state and drops candidates that
//! match the last one sent.
//!
//! ## Design
//!
//! - One cached copy per deduplicated type (player, game, costume, tag,
//!   capture)
//! - Edge-triggered types (hack cap, capture) remember whether their last
//!   send was "active" and send one closing packet on the falling edge
//! - Event packets (checks, collects, deathlink) are never deduplicated
//! - The cache doubles as the source for reconnect and catch-up resends

mod tick;

pub use tick::{Cadence, CadenceTick, FramePacer};

use odyssey_shared::constants::CAPTURE_SHINE_BASE;
use odyssey_shared::names::{capture_index, try_convert_name};
use odyssey_shared::{FixedStr, PlayerAnim, PlayerId};
use tracing::{debug, trace, warn};

use crate::host::{CapSample, CostumeSample, PlayerSample, StageSample};
use crate::protocol::{
    CaptureInf, ChangeStage, Check, CostumeInf, FillerCollect, GameInf, HackCapInf, ItemCollect,
    Packet, PacketBody, PlayerInf, Progress, RegionalCollect, TagInf, UdpInit,
};
use crate::reconcile::{item_type, TagState};
use crate::transport::Transport;

/// Last-sent snapshot of every deduplicated packet type.
#[derive(Clone, Debug)]
pub struct OutboundCache {
    self_id: PlayerId,
    last_player: Option<PlayerInf>,
    last_game: Option<GameInf>,
    last_costume: Option<CostumeInf>,
    last_tag: Option<TagInf>,
    last_capture: Option<CaptureInf>,
    is_sent_hack_cap: bool,
    is_sent_capture: bool,
    sent: u64,
    suppressed: u64,
}

impl OutboundCache {
    /// Empty cache for the local player `self_id`.
    #[must_use]
    pub const fn new(self_id: PlayerId) -> Self {
        Self {
            self_id,
            last_player: None,
            last_game: None,
            last_costume: None,
            last_tag: None,
            last_capture: None,
            is_sent_hack_cap: false,
            is_sent_capture: false,
            sent: 0,
            suppressed: 0,
        }
    }

    /// Forgets everything sent so far.
    pub fn reset(&mut self) {
        *self = Self::new(self.self_id);
    }

    /// Packets queued through this cache.
    #[must_use]
    pub const fn sent_count(&self) -> u64 {
        self.sent
    }

    /// Candidates dropped as duplicates.
    #[must_use]
    pub const fn suppressed_count(&self) -> u64 {
        self.suppressed
    }

    fn packet(&self, body: PacketBody) -> Packet {
        Packet::new(self.self_id, body)
    }

    fn queue(&mut self, transport: &impl Transport, body: PacketBody) -> bool {
        let packet = self.packet(body);
        match transport.queue_packet(packet) {
            Ok(()) => {
                self.sent += 1;
                trace!(packet = packet.packet_type().name(), "queued");
                true
            }
            Err(e) => {
                debug!(packet = packet.packet_type().name(), error = %e, "send skipped");
                false
            }
        }
    }

    fn suppress(&mut self) -> bool {
        self.suppressed += 1;
        false
    }

    // =========================================================================
    // Deduplicated state
    // =========================================================================

    /// Sends the player transform unless it matches the last one sent.
    pub fn send_player_info(&mut self, transport: &impl Transport, sample: &PlayerSample) -> bool {
        let (act, sub_act) = if sample.capture_class.is_some() {
            (PlayerAnim::from_name(&sample.act_name), PlayerAnim::UNKNOWN)
        } else {
            (
                PlayerAnim::from_name(&sample.act_name),
                PlayerAnim::from_name(&sample.sub_act_name),
            )
        };
        let candidate = PlayerInf {
            position: sample.position,
            rotation: sample.rotation,
            blend_weights: sample.blend_weights,
            act: act.code(),
            sub_act: sub_act.code(),
        };

        if self.last_player == Some(candidate) {
            return self.suppress();
        }
        self.last_player = Some(candidate);
        self.queue(transport, PacketBody::PlayerInfo(candidate))
    }

    /// Streams the cap while it flies, then sends one reset packet.
    pub fn send_hack_cap(&mut self, transport: &impl Transport, sample: &CapSample) -> bool {
        if sample.is_flying {
            self.is_sent_hack_cap = true;
            let inf = HackCapInf {
                position: sample.position,
                rotation: sample.rotation,
                is_visible: true,
                anim: FixedStr::new(&sample.anim),
            };
            return self.queue(transport, PacketBody::HackCapInfo(inf));
        }
        if self.is_sent_hack_cap {
            self.is_sent_hack_cap = false;
            return self.queue(transport, PacketBody::HackCapInfo(HackCapInf::reset()));
        }
        false
    }

    /// Sends capture start and end edges.
    ///
    /// The actor class is mapped to the capture name other clients expect.
    pub fn send_capture(&mut self, transport: &impl Transport, capture_class: Option<&str>) -> bool {
        match (capture_class, self.is_sent_capture) {
            (Some(class), false) => {
                let inf = CaptureInf {
                    hack_name: FixedStr::new(try_convert_name(class)),
                };
                self.is_sent_capture = true;
                self.last_capture = Some(inf);
                self.queue(transport, PacketBody::CaptureInfo(inf))
            }
            (None, true) => {
                let inf = CaptureInf::default();
                self.is_sent_capture = false;
                self.last_capture = Some(inf);
                self.queue(transport, PacketBody::CaptureInfo(inf))
            }
            _ => false,
        }
    }

    /// Sends stage info unless unchanged or empty.
    pub fn send_game_info(&mut self, transport: &impl Transport, sample: &StageSample) -> bool {
        let candidate = GameInf {
            is_2d: sample.is_2d,
            scenario: sample.scenario,
            stage: FixedStr::new(&sample.stage),
        };
        if candidate.is_empty() || self.last_game == Some(candidate) {
            return self.suppress();
        }
        self.last_game = Some(candidate);
        self.queue(transport, PacketBody::GameInfo(candidate))
    }

    /// Sends the outfit unless both names are empty or it is unchanged.
    pub fn send_costume(&mut self, transport: &impl Transport, sample: &CostumeSample) -> bool {
        let candidate = CostumeInf {
            body: FixedStr::new(&sample.body),
            cap: FixedStr::new(&sample.cap),
        };
        if candidate.is_empty() || self.last_costume == Some(candidate) {
            return self.suppress();
        }
        self.last_costume = Some(candidate);
        self.queue(transport, PacketBody::CostumeInfo(candidate))
    }

    /// Sends the local tag state (state and time) unless unchanged.
    pub fn send_tag_info(&mut self, transport: &impl Transport, tag: TagState) -> bool {
        let candidate = TagInf {
            update_type: TagInf::UPDATE_STATE | TagInf::UPDATE_TIME,
            is_it: tag.is_it,
            seconds: tag.seconds,
            minutes: tag.minutes,
        };
        if self.last_tag == Some(candidate) {
            return self.suppress();
        }
        self.last_tag = Some(candidate);
        self.queue(transport, PacketBody::TagInfo(candidate))
    }

    // =========================================================================
    // Resends
    // =========================================================================

    /// Re-queues cached state after a reconnect.
    pub fn resend_init_packets(&mut self, transport: &impl Transport) {
        let cached = [
            self.last_costume.map(PacketBody::CostumeInfo),
            self.last_game.map(PacketBody::GameInfo),
            self.last_tag.map(PacketBody::TagInfo),
            self.last_capture.map(PacketBody::CaptureInfo),
        ];
        for body in cached.into_iter().flatten() {
            self.queue(transport, body);
        }
    }

    /// Sends cached state straight away so a newly joined player sees us.
    pub fn catch_up(&self, transport: &impl Transport) {
        let cached = [
            self.last_game.map(PacketBody::GameInfo),
            self.last_player.map(PacketBody::PlayerInfo),
            self.last_costume.map(PacketBody::CostumeInfo),
            self.last_tag.map(PacketBody::TagInfo),
            self.last_capture.map(PacketBody::CaptureInfo),
        ];
        for body in cached.into_iter().flatten() {
            if let Err(e) = transport.send(&self.packet(body)) {
                debug!(error = %e, "catch-up send failed");
                return;
            }
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Announces a local death.
    pub fn send_deathlink(&mut self, transport: &impl Transport) -> bool {
        self.queue(transport, PacketBody::Deathlink)
    }

    /// Reports a location check by id.
    pub fn send_check(&mut self, transport: &impl Transport, location_id: i32, item_type: i32) -> bool {
        let check = Check {
            location_id,
            item_type,
            ..Check::default()
        };
        self.queue(transport, PacketBody::Check(check))
    }

    /// Reports a location check by placement object and stage.
    pub fn send_check_object(
        &mut self,
        transport: &impl Transport,
        item_type: i32,
        object_id: &str,
        stage: &str,
    ) -> bool {
        let check = Check {
            item_type,
            object_id: FixedStr::new(object_id),
            stage: FixedStr::new(stage),
            ..Check::default()
        };
        self.queue(transport, PacketBody::Check(check))
    }

    /// Reports a collected shine.
    pub fn send_shine_collect(&mut self, transport: &impl Transport, uid: i32) -> bool {
        self.send_check(transport, uid, item_type::SHINE)
    }

    /// Reports a first capture as its capture shine.
    pub fn send_capture_shine(&mut self, transport: &impl Transport, capture_name: &str) -> bool {
        let Some(index) = capture_index(capture_name).and_then(|i| i32::try_from(i).ok()) else {
            warn!(capture = capture_name, "capture has no shine id");
            return false;
        };
        self.send_shine_collect(transport, CAPTURE_SHINE_BASE + index)
    }

    /// Reports a bought shop item.
    pub fn send_item_collect(&mut self, transport: &impl Transport, name: &str, item_type: i32) -> bool {
        let body = ItemCollect {
            name: FixedStr::new(name),
            item_type,
        };
        self.queue(transport, PacketBody::ItemCollect(body))
    }

    /// Reports a collected regional coin.
    pub fn send_regional_collect(
        &mut self,
        transport: &impl Transport,
        object_id: &str,
        stage: &str,
    ) -> bool {
        let body = RegionalCollect {
            object_id: FixedStr::new(object_id),
            stage: FixedStr::new(stage),
        };
        self.queue(transport, PacketBody::RegionalCollect(body))
    }

    /// Reports a filler pickup.
    pub fn send_filler_collect(&mut self, transport: &impl Transport, item_type: i32) -> bool {
        self.queue(transport, PacketBody::FillerCollect(FillerCollect { item_type }))
    }

    /// Reports the home stage of the world being entered.
    pub fn send_change_stage(&mut self, transport: &impl Transport, home_stage: &str) -> bool {
        let body = ChangeStage {
            stage: FixedStr::new(home_stage),
            entrance: FixedStr::empty(),
            scenario: -1,
            sub_scenario_type: 0,
        };
        self.queue(transport, PacketBody::ChangeStage(body))
    }

    /// Reports a scenario reached in `world_id`.
    pub fn send_progress(&mut self, transport: &impl Transport, world_id: i32, scenario: i32) -> bool {
        self.queue(transport, PacketBody::Progress(Progress { world_id, scenario }))
    }

    /// Announces the local UDP port.
    pub fn send_udp_init(&mut self, transport: &impl Transport, port: u16) -> bool {
        self.queue(transport, PacketBody::UdpInit(UdpInit { port }))
    }

    /// Keeps the UDP mapping open.
    pub fn send_hole_punch(&mut self, transport: &impl Transport) -> bool {
        self.queue(transport, PacketBody::HolePunch)
    }
}
