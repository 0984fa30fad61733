//! # Canonical Name Tables
//!
//! The ledger stores items by their position in these tables. The order is
//! part of the save format and of the randomizer protocol: appending is fine,
//! reordering is not.

use serde::{Deserialize, Serialize};

/// Purchasable item category, numbered as on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ItemKind {
    /// Body outfit.
    Cloth = 0,
    /// Cap outfit.
    Cap = 1,
    /// Souvenir (gift).
    Souvenir = 2,
    /// Sticker.
    Sticker = 3,
}

impl ItemKind {
    /// Decodes a wire discriminant.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Cloth),
            1 => Some(Self::Cap),
            2 => Some(Self::Souvenir),
            3 => Some(Self::Sticker),
            _ => None,
        }
    }

    /// Name table backing this kind.
    #[must_use]
    pub const fn table(self) -> &'static [&'static str] {
        match self {
            Self::Cloth | Self::Cap => COSTUME_NAMES,
            Self::Souvenir => SOUVENIR_NAMES,
            Self::Sticker => STICKER_NAMES,
        }
    }

    /// Position of `name` in this kind's table.
    #[must_use]
    pub fn index_of(self, name: &str) -> Option<usize> {
        index_in(self.table(), name)
    }
}

/// Outfit names. Shared by body and cap.
pub const COSTUME_NAMES: &[&str] = &[
    "Mario",
    "Mario64",
    "Mario64Metal",
    "MarioAloha",
    "MarioArmor",
    "MarioBone",
    "MarioClown",
    "MarioColorClassic",
    "MarioColorGold",
    "MarioColorLuigi",
    "MarioColorWaluigi",
    "MarioColorWario",
    "MarioCook",
    "MarioDiddyKong",
    "MarioDoctor",
    "MarioExplorer",
    "MarioFootball",
    "MarioGolf",
    "MarioGunman",
    "MarioHakama",
    "MarioHappi",
    "MarioKing",
    "MarioKoopa",
    "MarioMaker",
    "MarioMechanic",
    "MarioNew3DS",
    "MarioPainter",
    "MarioPeach",
    "MarioPilot",
    "MarioPirate",
    "MarioPoncho",
    "MarioPrimitiveMan",
    "MarioSailor",
    "MarioScientist",
    "MarioShopman",
    "MarioSnowSuit",
    "MarioSpaceSuit",
    "MarioSuit",
    "MarioSwimwear",
    "MarioTailCoat",
    "MarioTuxedo",
    "MarioUnderwear",
    "MarioCaptain",
    "MarioInvisible",
];

/// Sticker names.
pub const STICKER_NAMES: &[&str] = &[
    "StickerCap",
    "StickerWaterfall",
    "StickerSand",
    "StickerLake",
    "StickerForest",
    "StickerClash",
    "StickerCity",
    "StickerSnow",
    "StickerSea",
    "StickerLava",
    "StickerSky",
    "StickerMoon",
    "StickerPeachDokan",
    "StickerPeachCoin",
    "StickerPeachBlock",
    "StickerPeachBlockQuestion",
    "StickerPeach",
];

/// Souvenir names.
pub const SOUVENIR_NAMES: &[&str] = &[
    "SouvenirHat1",
    "SouvenirHat2",
    "SouvenirFall1",
    "SouvenirFall2",
    "SouvenirSand1",
    "SouvenirSand2",
    "SouvenirLake1",
    "SouvenirLake2",
    "SouvenirForest1",
    "SouvenirForest2",
    "SouvenirCrash1",
    "SouvenirCrash2",
    "SouvenirCity1",
    "SouvenirCity2",
    "SouvenirSnow1",
    "SouvenirSnow2",
    "SouvenirSea1",
    "SouvenirSea2",
    "SouvenirLava1",
    "SouvenirLava2",
    "SouvenirSky1",
    "SouvenirSky2",
    "SouvenirMoon1",
    "SouvenirMoon2",
    "SouvenirPeach1",
    "SouvenirPeach2",
];

/// Capturable enemy types.
pub const CAPTURE_NAMES: &[&str] = &[
    "Frog",
    "ElectricWire",
    "KuriboWing",
    "Wanwan",
    "WanwanBig",
    "BreedaWanwan",
    "TRex",
    "Fukankun",
    "Killer",
    "Megane",
    "Cactus",
    "Kuribo",
    "BossKnuckleHand",
    "BazookaElectric",
    "Kakku",
    "JugemFishing",
    "Fastener",
    "Pukupuku",
    "GotogotonLake",
    "PackunPoison",
    "Senobi",
    "FireBros",
    "Tank",
    "Gamane",
    "Tree",
    "RockForest",
    "FukuwaraiFacePartsKuribo",
    "Imomu",
    "GuidePost",
    "Manhole",
    "Car",
    "Radicon",
    "Byugo",
    "Yukimaru",
    "PukupukuSnow",
    "Hosui",
    "Bubble",
    "HackFork",
    "HammerBros",
    "CarryMeat",
    "PackunFire",
    "Tsukkun",
    "Statue",
    "StatueKoopa",
    "KaronWing",
    "KillerMagnum",
    "Bull",
    "Koopa",
    "AnagramAlphabetCharacter",
    "GotogotonCity",
    "FukuwaraiFacePartsMario",
    "Yoshi",
];

/// Actor class name to captured-form name. Many-to-one.
const CLASS_HACK_NAMES: &[(&str, &str)] = &[
    ("SenobiGeneratePoint", "Senobi"),
    ("KuriboPossessed", "Kuribo"),
    ("KillerLauncher", "Killer"),
    ("KillerLauncherMagnum", "KillerMagnum"),
    ("FireBrosPossessed", "FireBros"),
    ("HammerBrosPossessed", "HammerBros"),
    ("ElectricWire", "ElectricWireMover"),
    ("TRexSleep", "TRex"),
    ("TRexPatrol", "TRex"),
    // FIXME: big chain chomps sync as the small variant
    ("WanwanBig", "Wanwan"),
    ("Koopa", "KoopaHack"),
];

/// World home stages, indexed by world id.
pub const WORLD_HOME_STAGES: [&str; crate::constants::WORLD_COUNT] = [
    "CapWorldHomeStage",
    "WaterfallWorldHomeStage",
    "SandWorldHomeStage",
    "ForestWorldHomeStage",
    "LakeWorldHomeStage",
    "CloudWorldHomeStage",
    "ClashWorldHomeStage",
    "CityWorldHomeStage",
    "SeaWorldHomeStage",
    "SnowWorldHomeStage",
    "LavaWorldHomeStage",
    "BossRaidWorldHomeStage",
    "SkyWorldHomeStage",
    "MoonWorldHomeStage",
    "PeachWorldHomeStage",
    "Special1WorldHomeStage",
    "Special2WorldHomeStage",
];

/// Index into the per-world scenario and cost arrays.
pub type WorldId = usize;

fn index_in(table: &[&str], name: &str) -> Option<usize> {
    table.iter().position(|&entry| entry == name)
}

/// Position of an outfit name.
#[must_use]
pub fn costume_index(name: &str) -> Option<usize> {
    index_in(COSTUME_NAMES, name)
}

/// Position of a sticker name.
#[must_use]
pub fn sticker_index(name: &str) -> Option<usize> {
    index_in(STICKER_NAMES, name)
}

/// Position of a souvenir name.
#[must_use]
pub fn souvenir_index(name: &str) -> Option<usize> {
    index_in(SOUVENIR_NAMES, name)
}

/// Position of a capture name.
#[must_use]
pub fn capture_index(name: &str) -> Option<usize> {
    index_in(CAPTURE_NAMES, name)
}

/// World whose home stage is `stage`.
#[must_use]
pub fn world_of_home_stage(stage: &str) -> Option<WorldId> {
    index_in(&WORLD_HOME_STAGES, stage)
}

/// Maps an actor class name to the name remote clients expect.
///
/// Unmapped names pass through unchanged.
#[must_use]
pub fn try_convert_name(class_name: &str) -> &str {
    CLASS_HACK_NAMES
        .iter()
        .find(|(class, _)| *class == class_name)
        .map_or(class_name, |(_, hack)| hack)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sizes() {
        assert_eq!(COSTUME_NAMES.len(), 44);
        assert_eq!(STICKER_NAMES.len(), 17);
        assert_eq!(SOUVENIR_NAMES.len(), 26);
        assert_eq!(CAPTURE_NAMES.len(), 52);
    }

    #[test]
    fn test_lookups() {
        assert_eq!(costume_index("Mario"), Some(0));
        assert_eq!(costume_index("MarioInvisible"), Some(43));
        assert_eq!(costume_index("Luigi"), None);
        assert_eq!(capture_index("Yoshi"), Some(51));
        assert_eq!(ItemKind::Sticker.index_of("StickerPeach"), Some(16));
        assert_eq!(ItemKind::Souvenir.index_of("StickerPeach"), None);
        assert_eq!(world_of_home_stage("SandWorldHomeStage"), Some(2));
        assert_eq!(world_of_home_stage("FrogSearchExStage"), None);
    }

    #[test]
    fn test_convert_name() {
        assert_eq!(try_convert_name("TRexPatrol"), "TRex");
        assert_eq!(try_convert_name("KuriboPossessed"), "Kuribo");
        assert_eq!(try_convert_name("Frog"), "Frog");
    }
}
