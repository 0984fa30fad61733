//! # Progress Ledger
//!
//! Everything the player has collected, as bitsets keyed by canonical table
//! position, plus per-world scenario and cost mirrors.
//!
//! ## Indexing Rule
//!
//! Ids come only from a successful name lookup in
//! [`odyssey_shared::names`]. Lookups that fail stop before any bit is
//! touched; every name-based method here returns `false` in that case.
//!
//! ## Shine Grants
//!
//! Remote shine grants do not touch the shine bitset directly. They are
//! queued with [`ProgressLedger::enqueue_shine`] and drained on the game
//! thread, where the live stage actors can be revived safely.

mod bitset;
mod save;

pub use bitset::{Bitset, Word};
pub use save::SaveData;

use odyssey_shared::constants::{OUTFIT_KIND_STRIDE, SCENARIO_SLOTS};
use odyssey_shared::names::{self, CAPTURE_NAMES};
use odyssey_shared::{ItemKind, WorldId, WORLD_COUNT};
use tracing::{debug, warn};

/// Shine ledger words. Covers ids 0..4096.
pub const SHINE_WORDS: usize = 128;
/// Outfit ledger words (body and cap).
pub const OUTFIT_WORDS: usize = 12;
/// Sticker ledger words.
pub const STICKER_WORDS: usize = 4;
/// Souvenir ledger words.
pub const SOUVENIR_WORDS: usize = 5;
/// Capture ledger words.
pub const CAPTURE_WORDS: usize = 8;

/// Pending shine grants beyond this are dropped.
pub const PENDING_SHINE_CAPACITY: usize = 100;
/// Live shine actors tracked per stage.
pub const MAX_LIVE_SHINES: usize = 100;

/// Scenario stored for every world at the start of a game.
pub const INITIAL_SCENARIO: i32 = 1;
/// Cost stored before slot data arrives.
pub const UNKNOWN_COST: i32 = -1;

const CITY_WORLD: WorldId = 7;
const CITY_REVISIT_SCENARIO: i32 = 3;

/// One of the ledger's bit collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Shines, keyed by unique id.
    Shine,
    /// Outfits, keyed by `costume_index + 44 * kind`.
    Outfit,
    /// Stickers.
    Sticker,
    /// Souvenirs.
    Souvenir,
    /// Captures.
    Capture,
}

/// Local save progress.
#[derive(Clone, Debug)]
pub struct ProgressLedger {
    shines: Bitset<u32, SHINE_WORDS>,
    outfits: Bitset<u8, OUTFIT_WORDS>,
    stickers: Bitset<u8, STICKER_WORDS>,
    souvenirs: Bitset<u8, SOUVENIR_WORDS>,
    captures: Bitset<u8, CAPTURE_WORDS>,
    scenarios: [i32; SCENARIO_SLOTS],
    world_costs: [i32; WORLD_COUNT],
    check_index: i32,
    pending_shines: Vec<i32>,
    live_shines: Vec<i32>,
}

impl Default for ProgressLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressLedger {
    /// A fresh ledger: nothing collected, every world at its first scenario.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shines: Bitset::new(),
            outfits: Bitset::new(),
            stickers: Bitset::new(),
            souvenirs: Bitset::new(),
            captures: Bitset::new(),
            scenarios: [INITIAL_SCENARIO; SCENARIO_SLOTS],
            world_costs: [UNKNOWN_COST; WORLD_COUNT],
            check_index: -1,
            pending_shines: Vec::with_capacity(PENDING_SHINE_CAPACITY),
            live_shines: Vec::with_capacity(MAX_LIVE_SHINES),
        }
    }

    /// Resets for a new save file.
    pub fn new_game(&mut self) {
        *self = Self::new();
        debug!("ledger reset for new game");
    }

    // =========================================================================
    // Bit access
    // =========================================================================

    /// True if `id` is set in `collection`.
    #[must_use]
    pub fn test(&self, collection: Collection, id: usize) -> bool {
        match collection {
            Collection::Shine => self.shines.test(id),
            Collection::Outfit => self.outfits.test(id),
            Collection::Sticker => self.stickers.test(id),
            Collection::Souvenir => self.souvenirs.test(id),
            Collection::Capture => self.captures.test(id),
        }
    }

    /// Sets `id` in `collection`. Returns `true` if it was newly set.
    pub fn set(&mut self, collection: Collection, id: usize) -> bool {
        match collection {
            Collection::Shine => self.shines.set(id),
            Collection::Outfit => self.outfits.set(id),
            Collection::Sticker => self.stickers.set(id),
            Collection::Souvenir => self.souvenirs.set(id),
            Collection::Capture => self.captures.set(id),
        }
    }

    /// Whole word `index` of `collection`, widened to `u32`.
    #[must_use]
    pub fn get_raw(&self, collection: Collection, index: usize) -> Option<u32> {
        match collection {
            Collection::Shine => self.shines.get_raw(index),
            Collection::Outfit => self.outfits.get_raw(index).map(Word::to_u32),
            Collection::Sticker => self.stickers.get_raw(index).map(Word::to_u32),
            Collection::Souvenir => self.souvenirs.get_raw(index).map(Word::to_u32),
            Collection::Capture => self.captures.get_raw(index).map(Word::to_u32),
        }
    }

    /// Overwrites word `index` of `collection`.
    ///
    /// Returns `false` if the index is out of range or the value is wider
    /// than the collection's word.
    pub fn set_raw(&mut self, collection: Collection, index: usize, value: u32) -> bool {
        fn narrow<W: Word, const N: usize>(set: &mut Bitset<W, N>, index: usize, value: u32) -> bool {
            W::from_u32(value).is_some_and(|w| set.set_raw(index, w))
        }

        match collection {
            Collection::Shine => self.shines.set_raw(index, value),
            Collection::Outfit => narrow(&mut self.outfits, index, value),
            Collection::Sticker => narrow(&mut self.stickers, index, value),
            Collection::Souvenir => narrow(&mut self.souvenirs, index, value),
            Collection::Capture => narrow(&mut self.captures, index, value),
        }
    }

    // =========================================================================
    // Shines
    // =========================================================================

    /// True if shine `uid` is collected.
    #[must_use]
    pub fn has_shine(&self, uid: i32) -> bool {
        usize::try_from(uid).is_ok_and(|id| self.shines.test(id))
    }

    /// Marks shine `uid` collected. Returns `true` if newly set.
    pub fn set_shine(&mut self, uid: i32) -> bool {
        match usize::try_from(uid) {
            Ok(id) => self.shines.set(id),
            Err(_) => false,
        }
    }

    /// Queues a remote shine grant for the next drain.
    ///
    /// Duplicates and negative ids are ignored. When full, the new grant is
    /// dropped.
    pub fn enqueue_shine(&mut self, uid: i32) -> bool {
        if uid < 0 || self.pending_shines.contains(&uid) {
            return false;
        }
        if self.pending_shines.len() >= PENDING_SHINE_CAPACITY {
            warn!(uid, "pending shine queue full, dropping grant");
            return false;
        }
        self.pending_shines.push(uid);
        true
    }

    /// True if grants are waiting.
    #[must_use]
    pub fn has_pending_shines(&self) -> bool {
        !self.pending_shines.is_empty()
    }

    /// Takes every queued grant, oldest first.
    pub fn take_pending_shines(&mut self) -> Vec<i32> {
        std::mem::take(&mut self.pending_shines)
    }

    /// Records a shine actor loaded in the current stage.
    pub fn register_live_shine(&mut self, uid: i32) -> bool {
        if self.live_shines.contains(&uid) {
            return true;
        }
        if self.live_shines.len() >= MAX_LIVE_SHINES {
            debug!(uid, "live shine table full");
            return false;
        }
        self.live_shines.push(uid);
        true
    }

    /// True if the shine's actor is loaded.
    #[must_use]
    pub fn is_live_shine(&self, uid: i32) -> bool {
        self.live_shines.contains(&uid)
    }

    /// Forgets loaded actors. Called on stage change.
    pub fn clear_live_shines(&mut self) {
        self.live_shines.clear();
    }

    /// Collected shine count.
    #[must_use]
    pub fn shine_count(&self) -> usize {
        self.shines.count()
    }

    // =========================================================================
    // Items
    // =========================================================================

    fn item_slot(kind: ItemKind, index: usize) -> Option<(Collection, usize)> {
        if index >= kind.table().len() {
            return None;
        }
        Some(match kind {
            ItemKind::Cloth | ItemKind::Cap => {
                (Collection::Outfit, index + OUTFIT_KIND_STRIDE * kind as usize)
            }
            ItemKind::Souvenir => (Collection::Souvenir, index),
            ItemKind::Sticker => (Collection::Sticker, index),
        })
    }

    /// True if the item at table position `index` is owned.
    #[must_use]
    pub fn has_item_at(&self, kind: ItemKind, index: usize) -> bool {
        Self::item_slot(kind, index).is_some_and(|(c, id)| self.test(c, id))
    }

    /// Marks the item at table position `index` owned.
    pub fn add_item_at(&mut self, kind: ItemKind, index: usize) -> bool {
        match Self::item_slot(kind, index) {
            Some((c, id)) => self.set(c, id),
            None => {
                warn!(?kind, index, "item index out of range");
                false
            }
        }
    }

    /// True if the named item is owned.
    #[must_use]
    pub fn has_item(&self, kind: ItemKind, name: &str) -> bool {
        kind.index_of(name)
            .is_some_and(|index| self.has_item_at(kind, index))
    }

    /// Marks the named item owned. Unknown names are ignored.
    pub fn add_item(&mut self, kind: ItemKind, name: &str) -> bool {
        match kind.index_of(name) {
            Some(index) => self.add_item_at(kind, index),
            None => {
                debug!(?kind, name, "unknown item name");
                false
            }
        }
    }

    /// True if the named capture is unlocked.
    #[must_use]
    pub fn has_capture(&self, name: &str) -> bool {
        names::capture_index(name).is_some_and(|id| self.captures.test(id))
    }

    /// Unlocks the capture at table position `index`.
    pub fn add_capture_at(&mut self, index: usize) -> bool {
        if index >= CAPTURE_NAMES.len() {
            warn!(index, "capture index out of range");
            return false;
        }
        self.captures.set(index)
    }

    /// Unlocks the named capture.
    pub fn add_capture(&mut self, name: &str) -> bool {
        match names::capture_index(name) {
            Some(index) => self.add_capture_at(index),
            None => {
                debug!(name, "unknown capture name");
                false
            }
        }
    }

    // =========================================================================
    // Scenarios and costs
    // =========================================================================

    /// Stored scenario for `world`.
    #[must_use]
    pub fn scenario(&self, world: WorldId) -> Option<i32> {
        self.scenarios.get(world).copied()
    }

    /// Raw write. Only restore paths should use this.
    pub fn set_scenario(&mut self, world: WorldId, scenario: i32) -> bool {
        match self.scenarios.get_mut(world) {
            Some(slot) => {
                *slot = scenario;
                true
            }
            None => false,
        }
    }

    /// Moves `world` forward to `scenario`. Never moves backwards.
    ///
    /// The metro kingdom's festival scenario is revisited after later
    /// scenarios and is never recorded.
    pub fn advance_scenario(&mut self, world: WorldId, scenario: i32) -> bool {
        if world == CITY_WORLD && scenario == CITY_REVISIT_SCENARIO {
            return false;
        }
        match self.scenarios.get_mut(world) {
            Some(slot) if scenario > *slot => {
                debug!(world, from = *slot, to = scenario, "scenario advanced");
                *slot = scenario;
                true
            }
            _ => false,
        }
    }

    /// All stored scenarios.
    #[must_use]
    pub const fn scenarios(&self) -> &[i32; SCENARIO_SLOTS] {
        &self.scenarios
    }

    /// Unlock cost of `world`, or [`UNKNOWN_COST`].
    #[must_use]
    pub fn world_cost(&self, world: WorldId) -> i32 {
        self.world_costs.get(world).copied().unwrap_or(UNKNOWN_COST)
    }

    /// Records the unlock cost of `world`.
    pub fn set_world_cost(&mut self, world: WorldId, cost: i32) -> bool {
        match self.world_costs.get_mut(world) {
            Some(slot) => {
                *slot = cost;
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Check cursor
    // =========================================================================

    /// Highest applied check index.
    #[must_use]
    pub const fn check_index(&self) -> i32 {
        self.check_index
    }

    /// `index` is past the cursor.
    #[must_use]
    pub const fn is_new_check_index(&self, index: i32) -> bool {
        index > self.check_index
    }

    /// Advances the cursor if `index` is newer. Returns `true` if it was.
    pub fn observe_check_index(&mut self, index: i32) -> bool {
        if index > self.check_index {
            self.check_index = index;
            true
        } else {
            false
        }
    }

    /// Raw write for restore paths.
    pub fn set_check_index(&mut self, index: i32) {
        self.check_index = index;
    }

    pub(crate) const fn bitsets(
        &self,
    ) -> (
        &Bitset<u32, SHINE_WORDS>,
        &Bitset<u8, OUTFIT_WORDS>,
        &Bitset<u8, STICKER_WORDS>,
        &Bitset<u8, SOUVENIR_WORDS>,
        &Bitset<u8, CAPTURE_WORDS>,
    ) {
        (
            &self.shines,
            &self.outfits,
            &self.stickers,
            &self.souvenirs,
            &self.captures,
        )
    }

    pub(crate) fn bitsets_mut(
        &mut self,
    ) -> (
        &mut Bitset<u32, SHINE_WORDS>,
        &mut Bitset<u8, OUTFIT_WORDS>,
        &mut Bitset<u8, STICKER_WORDS>,
        &mut Bitset<u8, SOUVENIR_WORDS>,
        &mut Bitset<u8, CAPTURE_WORDS>,
    ) {
        (
            &mut self.shines,
            &mut self.outfits,
            &mut self.stickers,
            &mut self.souvenirs,
            &mut self.captures,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_lookup_guards_bits() {
        let mut ledger = ProgressLedger::new();
        assert!(!ledger.add_item(ItemKind::Cloth, "NotAnOutfit"));
        assert_eq!(ledger.get_raw(Collection::Outfit, 0), Some(0));

        assert!(ledger.add_item(ItemKind::Cap, "MarioAloha"));
        assert!(ledger.has_item(ItemKind::Cap, "MarioAloha"));
        assert!(!ledger.has_item(ItemKind::Cloth, "MarioAloha"));
        assert!(ledger.test(Collection::Outfit, 3 + OUTFIT_KIND_STRIDE));
    }

    #[test]
    fn test_item_index_bounds() {
        let mut ledger = ProgressLedger::new();
        assert!(!ledger.add_item_at(ItemKind::Sticker, 17));
        assert!(ledger.add_item_at(ItemKind::Sticker, 16));
        assert!(ledger.has_item(ItemKind::Sticker, "StickerPeach"));
        assert!(!ledger.add_capture_at(52));
        assert!(ledger.add_capture("Yoshi"));
        assert!(ledger.has_capture("Yoshi"));
    }

    #[test]
    fn test_scenario_only_advances() {
        let mut ledger = ProgressLedger::new();
        assert!(ledger.advance_scenario(2, 4));
        assert!(!ledger.advance_scenario(2, 3));
        assert_eq!(ledger.scenario(2), Some(4));

        assert!(!ledger.advance_scenario(CITY_WORLD, CITY_REVISIT_SCENARIO));
        assert!(ledger.advance_scenario(CITY_WORLD, 4));
        assert!(!ledger.advance_scenario(99, 2));

        ledger.new_game();
        assert_eq!(ledger.scenario(2), Some(INITIAL_SCENARIO));
    }

    #[test]
    fn test_pending_shine_queue() {
        let mut ledger = ProgressLedger::new();
        assert!(ledger.enqueue_shine(218));
        assert!(!ledger.enqueue_shine(218));
        assert!(!ledger.enqueue_shine(-1));

        for uid in 0..PENDING_SHINE_CAPACITY as i32 + 10 {
            ledger.enqueue_shine(1000 + uid);
        }
        let pending = ledger.take_pending_shines();
        assert_eq!(pending.len(), PENDING_SHINE_CAPACITY);
        assert_eq!(pending[0], 218);
        assert!(!ledger.has_pending_shines());
    }

    #[test]
    fn test_check_cursor() {
        let mut ledger = ProgressLedger::new();
        assert!(ledger.observe_check_index(0));
        assert!(ledger.observe_check_index(5));
        assert!(!ledger.observe_check_index(5));
        assert!(!ledger.observe_check_index(2));
        assert_eq!(ledger.check_index(), 5);
    }

    #[test]
    fn test_raw_word_width() {
        let mut ledger = ProgressLedger::new();
        assert!(ledger.set_raw(Collection::Shine, 127, u32::MAX));
        assert!(ledger.has_shine(4095));
        assert!(!ledger.set_raw(Collection::Sticker, 0, 0x100));
        assert!(ledger.set_raw(Collection::Sticker, 0, 0x81));
        assert!(ledger.test(Collection::Sticker, 7));
    }
}
