//! Randomizer display tables.
//!
//! Filled by catch-up packets, read by the text layer when a shop item or
//! shine is shown.

use odyssey_shared::constants::{APMESSAGESIZE, APNAMESIZE};
use odyssey_shared::FixedStr;
use tracing::warn;

use crate::protocol::{ApInfo, ChatMessage, ShineColor, ShineEntry, ShineReplace, ShopEntry, ShopReplace};

/// Entries per name table.
pub const NAME_CAPACITY: usize = 128;
/// Shine colour slots, indexed by shine uid.
pub const SHINE_COLOR_CAPACITY: usize = 4096;

/// Classification value for junk items.
pub const CLASSIFICATION_JUNK: u8 = 0;
/// Classification value for useful items.
pub const CLASSIFICATION_USEFUL: u8 = 0b0010;
/// Classification value for items outside the pool.
pub const CLASSIFICATION_ERROR: u8 = 254;

type Name = FixedStr<APNAMESIZE>;

/// Shop category of a [`ShopReplace`] batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShopCategory {
    /// Cap outfits.
    Cap,
    /// Body outfits.
    Cloth,
    /// Stickers.
    Sticker,
    /// Souvenirs.
    Gift,
    /// Moon shop items.
    Moon,
}

impl ShopCategory {
    /// Every category, in wire order.
    pub const ALL: [Self; 5] = [Self::Cap, Self::Cloth, Self::Sticker, Self::Gift, Self::Moon];

    /// Decodes the batch kind byte.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Cap),
            1 => Some(Self::Cloth),
            2 => Some(Self::Sticker),
            3 => Some(Self::Gift),
            4 => Some(Self::Moon),
            _ => None,
        }
    }

    /// Meaningful entries in a batch of this category.
    #[must_use]
    pub const fn len(self) -> usize {
        match self {
            Self::Cap | Self::Cloth => 44,
            Self::Sticker => 17,
            Self::Gift => 26,
            Self::Moon => 13,
        }
    }
}

/// Names, replacements and colours received from the randomizer.
#[derive(Clone, Debug)]
pub struct RandomizerTables {
    game_names: Vec<Name>,
    slot_names: Vec<Name>,
    item_names: Vec<Name>,
    shine_item_names: Vec<Name>,
    game_count: usize,
    slot_count: usize,
    item_count: usize,
    shop: [Vec<ShopEntry>; 5],
    shine_replacements: [ShineEntry; ShineReplace::COUNT],
    shine_colors: Vec<u8>,
    chat: [FixedStr<APMESSAGESIZE>; 3],
    regionals: bool,
    captures: bool,
}

impl Default for RandomizerTables {
    fn default() -> Self {
        Self::new()
    }
}

fn write_name(table: &mut [Name], index: i16, name: &Name) -> bool {
    match usize::try_from(index).ok().and_then(|i| table.get_mut(i)) {
        Some(slot) => {
            *slot = *name;
            true
        }
        None => {
            warn!(index, "name index out of range");
            false
        }
    }
}

impl RandomizerTables {
    /// Empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            game_names: vec![Name::empty(); NAME_CAPACITY],
            slot_names: vec![Name::empty(); NAME_CAPACITY],
            item_names: vec![Name::empty(); NAME_CAPACITY],
            shine_item_names: vec![Name::empty(); NAME_CAPACITY],
            game_count: 0,
            slot_count: 0,
            item_count: 0,
            shop: ShopCategory::ALL.map(|c| vec![ShopEntry::UNSET; c.len()]),
            shine_replacements: [ShineEntry {
                item_type: 0,
                name_index: ShineEntry::INVALID_NAME,
            }; ShineReplace::COUNT],
            shine_colors: vec![0; SHINE_COLOR_CAPACITY],
            chat: Default::default(),
            regionals: false,
            captures: false,
        }
    }

    /// Stores a batch of names.
    ///
    /// Types 0..=2 fill the game, slot and item tables and bump their counts.
    /// Type 3 fills shine item names; the second and third entries only apply
    /// when the first index is below 99.
    pub fn apply_ap_info(&mut self, info: &ApInfo) {
        let [i1, i2, i3] = info.indices;
        let [n1, n2, n3] = &info.names;

        let (table, count) = match info.info_type {
            ApInfo::TYPE_GAME => (&mut self.game_names, &mut self.game_count),
            ApInfo::TYPE_SLOT => (&mut self.slot_names, &mut self.slot_count),
            ApInfo::TYPE_ITEM => (&mut self.item_names, &mut self.item_count),
            ApInfo::TYPE_SHINE_ITEM => {
                write_name(&mut self.shine_item_names, i1, n1);
                if i1 < 99 {
                    write_name(&mut self.shine_item_names, i2, n2);
                    write_name(&mut self.shine_item_names, i3, n3);
                }
                return;
            }
            other => {
                warn!(info_type = other, "unknown randomizer info type");
                return;
            }
        };

        for (index, name) in [(i1, n1), (i2, n2), (i3, n3)] {
            if write_name(table, index, name) {
                *count += 1;
            }
        }
    }

    /// Fills one shop category by position.
    pub fn apply_shop_replace(&mut self, batch: &ShopReplace) {
        let Some(category) = ShopCategory::from_raw(batch.kind) else {
            warn!(kind = batch.kind, "unknown shop category");
            return;
        };
        let table = &mut self.shop[category as usize];
        table.copy_from_slice(&batch.entries[..category.len()]);
    }

    /// Replaces every shine text entry by position.
    pub fn apply_shine_replace(&mut self, batch: &ShineReplace) {
        self.shine_replacements = batch.entries;
    }

    /// Stores shine colours. Entries with negative or out-of-range ids are
    /// skipped.
    pub fn apply_shine_color(&mut self, batch: &ShineColor) {
        for entry in &batch.entries {
            if let Some(slot) = usize::try_from(entry.uid)
                .ok()
                .and_then(|uid| self.shine_colors.get_mut(uid))
            {
                *slot = entry.color;
            }
        }
    }

    /// Replaces the chat lines.
    pub fn set_chat(&mut self, message: &ChatMessage) {
        self.chat = message.lines;
    }

    /// Stores slot flags and restarts name counting.
    pub fn apply_slot_flags(&mut self, regionals: bool, captures: bool) {
        self.regionals = regionals;
        self.captures = captures;
        self.game_count = 0;
        self.slot_count = 0;
        self.item_count = 0;
    }

    /// Shop entry at `index`.
    #[must_use]
    pub fn shop_entry(&self, category: ShopCategory, index: usize) -> Option<ShopEntry> {
        self.shop[category as usize].get(index).copied()
    }

    /// Shine text entry at hint `index`.
    #[must_use]
    pub fn shine_entry(&self, index: usize) -> Option<ShineEntry> {
        self.shine_replacements.get(index).copied()
    }

    /// Colour of shine `uid`.
    #[must_use]
    pub fn shine_color(&self, uid: i32) -> Option<u8> {
        usize::try_from(uid)
            .ok()
            .and_then(|uid| self.shine_colors.get(uid).copied())
    }

    /// Item name shown for the shine at hint `index`.
    ///
    /// `None` means "show the shine's own label".
    #[must_use]
    pub fn shine_replacement_text(&self, index: usize) -> Option<&str> {
        let entry = self.shine_entry(index)?;
        if entry.name_index == ShineEntry::INVALID_NAME {
            return None;
        }
        self.shine_item_names
            .get(usize::from(entry.name_index))
            .map(FixedStr::as_str)
    }

    /// Shop text for an item. `explain` selects the description line instead
    /// of the item name.
    #[must_use]
    pub fn shop_replacement_text(
        &self,
        category: ShopCategory,
        index: usize,
        explain: bool,
    ) -> Option<String> {
        let entry = self.shop_entry(category, index)?;
        let lookup = |table: &[Name], i: u8| {
            table
                .get(usize::from(i))
                .map_or(String::new(), |n| n.as_str().to_owned())
        };

        if !explain {
            return Some(lookup(&self.item_names, entry.item_index));
        }

        let verdict = match entry.classification {
            CLASSIFICATION_JUNK => "It looks like junk, but may as well ask...",
            CLASSIFICATION_USEFUL => "It looks useful.",
            CLASSIFICATION_ERROR => "Error or Not in the Item Pool.",
            _ => "It looks really important!",
        };
        Some(format!(
            "Comes from the world of {}.\nSeems to belong to {}.\n{verdict}",
            lookup(&self.game_names, entry.game_index),
            lookup(&self.slot_names, entry.slot_index),
        ))
    }

    /// Names received since the last slot data, per table.
    #[must_use]
    pub const fn name_counts(&self) -> (usize, usize, usize) {
        (self.game_count, self.slot_count, self.item_count)
    }

    /// Chat lines, top to bottom.
    #[must_use]
    pub const fn chat(&self) -> &[FixedStr<APMESSAGESIZE>; 3] {
        &self.chat
    }

    /// Regional coins are randomized.
    #[must_use]
    pub const fn regionals(&self) -> bool {
        self.regionals
    }

    /// Captures are randomized.
    #[must_use]
    pub const fn captures(&self) -> bool {
        self.captures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(info_type: i16, indices: [i16; 3], names: [&str; 3]) -> ApInfo {
        ApInfo {
            info_type,
            indices,
            names: names.map(FixedStr::new),
        }
    }

    #[test]
    fn test_ap_info_counts() {
        let mut tables = RandomizerTables::new();
        tables.apply_ap_info(&names(ApInfo::TYPE_GAME, [0, 1, 2], ["SMO", "OoT", "Hollow"]));
        tables.apply_ap_info(&names(ApInfo::TYPE_SLOT, [0, 1, 500], ["a", "b", "c"]));
        assert_eq!(tables.name_counts(), (3, 2, 0));

        tables.apply_slot_flags(true, false);
        assert_eq!(tables.name_counts(), (0, 0, 0));
        assert!(tables.regionals());
    }

    #[test]
    fn test_shine_item_names_gate() {
        let mut tables = RandomizerTables::new();
        tables.apply_ap_info(&names(ApInfo::TYPE_SHINE_ITEM, [99, 100, 101], ["x", "y", "z"]));
        tables.apply_ap_info(&names(ApInfo::TYPE_SHINE_ITEM, [3, 4, 5], ["Hookshot", "Bow", "Map"]));

        let mut batch = ShineReplace::default();
        batch.entries[0] = ShineEntry { item_type: 1, name_index: 4 };
        batch.entries[1] = ShineEntry { item_type: 1, name_index: 100 };
        batch.entries[2] = ShineEntry { item_type: 1, name_index: 99 };
        batch.entries[3] = ShineEntry { item_type: 1, name_index: ShineEntry::INVALID_NAME };
        tables.apply_shine_replace(&batch);

        assert_eq!(tables.shine_replacement_text(0), Some("Bow"));
        assert_eq!(tables.shine_replacement_text(1), Some(""));
        assert_eq!(tables.shine_replacement_text(2), Some("x"));
        assert_eq!(tables.shine_replacement_text(3), None);
    }

    #[test]
    fn test_shop_text() {
        let mut tables = RandomizerTables::new();
        tables.apply_ap_info(&names(ApInfo::TYPE_GAME, [0, 1, 2], ["SMO", "Zelda", ""]));
        tables.apply_ap_info(&names(ApInfo::TYPE_SLOT, [0, 1, 2], ["Mario", "Link", ""]));
        tables.apply_ap_info(&names(ApInfo::TYPE_ITEM, [0, 1, 2], ["Power Moon", "Bow", ""]));

        let mut batch = ShopReplace { kind: 2, ..ShopReplace::default() };
        batch.entries[16] = ShopEntry {
            game_index: 1,
            slot_index: 1,
            item_index: 1,
            classification: CLASSIFICATION_USEFUL,
        };
        tables.apply_shop_replace(&batch);

        assert_eq!(
            tables.shop_replacement_text(ShopCategory::Sticker, 16, false).as_deref(),
            Some("Bow")
        );
        let explain = tables
            .shop_replacement_text(ShopCategory::Sticker, 16, true)
            .unwrap();
        assert!(explain.contains("world of Zelda"));
        assert!(explain.contains("belong to Link"));
        assert!(explain.ends_with("It looks useful."));

        assert_eq!(tables.shop_replacement_text(ShopCategory::Sticker, 17, false), None);
        assert_eq!(
            tables.shop_entry(ShopCategory::Moon, 0),
            Some(ShopEntry::UNSET)
        );
    }

    #[test]
    fn test_shine_colors_skip_negative() {
        let mut tables = RandomizerTables::new();
        let mut batch = ShineColor::default();
        batch.entries[0].uid = 218;
        batch.entries[0].color = 3;
        tables.apply_shine_color(&batch);

        assert_eq!(tables.shine_color(218), Some(3));
        assert_eq!(tables.shine_color(0), Some(0));
        assert_eq!(tables.shine_color(-1), None);
    }
}
