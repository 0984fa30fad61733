//! Persisted shape of the ledger.
//!
//! The save subsystem owns the file; this module owns what goes in it.

use std::path::Path;

use odyssey_shared::{DEFAULT_SERVER_IP, DEFAULT_SERVER_PORT};
use serde::{Deserialize, Serialize};

use super::ProgressLedger;
use crate::error::{NetError, NetResult};

/// Save-file fields written by the sync layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveData {
    /// Scenario per world.
    pub scenarios: Vec<i32>,
    /// Shine bitset words.
    pub shine_words: Vec<u32>,
    /// Outfit bitset words.
    pub outfit_words: Vec<u8>,
    /// Sticker bitset words.
    pub sticker_words: Vec<u8>,
    /// Souvenir bitset words.
    pub souvenir_words: Vec<u8>,
    /// Capture bitset words.
    pub capture_words: Vec<u8>,
    /// Highest applied check index.
    pub check_index: i32,
    /// Last server address.
    pub server_ip: String,
    /// Last server port.
    pub server_port: u16,
    /// No connection has completed on this save yet.
    pub first_connect: bool,
}

impl Default for SaveData {
    fn default() -> Self {
        Self::capture(&ProgressLedger::new())
    }
}

impl SaveData {
    /// Snapshots a ledger.
    #[must_use]
    pub fn capture(ledger: &ProgressLedger) -> Self {
        let (shines, outfits, stickers, souvenirs, captures) = ledger.bitsets();
        Self {
            scenarios: ledger.scenarios().to_vec(),
            shine_words: shines.words().to_vec(),
            outfit_words: outfits.words().to_vec(),
            sticker_words: stickers.words().to_vec(),
            souvenir_words: souvenirs.words().to_vec(),
            capture_words: captures.words().to_vec(),
            check_index: ledger.check_index(),
            server_ip: DEFAULT_SERVER_IP.to_owned(),
            server_port: DEFAULT_SERVER_PORT,
            first_connect: true,
        }
    }

    /// Sets the remembered server.
    #[must_use]
    pub fn with_server(mut self, ip: impl Into<String>, port: u16) -> Self {
        self.server_ip = ip.into();
        self.server_port = port;
        self
    }

    /// Writes the saved progress into `ledger`.
    ///
    /// Short arrays leave the remaining entries at their new-game values.
    pub fn restore(&self, ledger: &mut ProgressLedger) {
        ledger.new_game();

        for (world, &scenario) in self.scenarios.iter().enumerate() {
            if !ledger.set_scenario(world, scenario) {
                break;
            }
        }
        ledger.set_check_index(self.check_index);

        let (shines, outfits, stickers, souvenirs, captures) = ledger.bitsets_mut();
        shines.load_words(&self.shine_words);
        outfits.load_words(&self.outfit_words);
        stickers.load_words(&self.sticker_words);
        souvenirs.load_words(&self.souvenir_words);
        captures.load_words(&self.capture_words);
    }

    /// Parses a TOML save.
    pub fn from_toml_str(source: &str) -> NetResult<Self> {
        toml::from_str(source).map_err(|e| NetError::InvalidConfig(e.to_string()))
    }

    /// Serializes to TOML.
    pub fn to_toml_string(&self) -> NetResult<String> {
        toml::to_string(self).map_err(|e| NetError::InvalidConfig(e.to_string()))
    }

    /// Reads a TOML save file.
    pub fn load(path: impl AsRef<Path>) -> NetResult<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Writes a TOML save file.
    pub fn store(&self, path: impl AsRef<Path>) -> NetResult<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}
