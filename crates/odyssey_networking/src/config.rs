//! # Client Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file is a valid config.
//!
//! ```toml
//! server_ip = "192.168.1.20"
//! server_port = 1027
//! client_name = "Mario"
//! retry_delay_ms = 2500
//! ```

use std::path::Path;
use std::time::Duration;

use odyssey_shared::constants::COSTUMEBUFSIZE;
use odyssey_shared::{DEFAULT_SERVER_IP, DEFAULT_SERVER_PORT};
use serde::{Deserialize, Serialize};

use crate::error::{NetError, NetResult};

/// Client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Relay server address. Empty means [`DEFAULT_SERVER_IP`].
    pub server_ip: String,
    /// Relay server port. 0 means [`DEFAULT_SERVER_PORT`].
    pub server_port: u16,
    /// Name announced in `PlayerConnect`.
    pub client_name: String,
    /// Negotiate the UDP position channel after connecting.
    pub udp_enabled: bool,
    /// Delay between failed connection attempts.
    pub retry_delay_ms: u64,
    /// Give up after this many failed attempts. 0 retries forever.
    pub max_connect_attempts: u32,
    /// Ticks between player/cap/capture samples.
    pub fast_send_interval: u32,
    /// Ticks between game info sends and housekeeping.
    pub slow_send_interval: u32,
    /// Ticks between forced shine recounts.
    pub shine_resync_interval: u32,
    /// Game ticks per second (headless driver only).
    pub tick_rate: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_ip: DEFAULT_SERVER_IP.to_owned(),
            server_port: DEFAULT_SERVER_PORT,
            client_name: "Mario".to_owned(),
            udp_enabled: true,
            retry_delay_ms: 2500,
            max_connect_attempts: 0,
            fast_send_interval: 3,
            slow_send_interval: 60,
            shine_resync_interval: 1800,
            tick_rate: 60,
        }
    }
}

impl ClientConfig {
    /// Parses a TOML document and validates it.
    pub fn from_toml_str(source: &str) -> NetResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| NetError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> NetResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Serializes back to TOML.
    pub fn to_toml_string(&self) -> NetResult<String> {
        toml::to_string(self).map_err(|e| NetError::InvalidConfig(e.to_string()))
    }

    /// Rejects values the tick driver cannot run with.
    pub fn validate(&self) -> NetResult<()> {
        if self.fast_send_interval == 0 || self.slow_send_interval == 0 {
            return Err(NetError::InvalidConfig("send intervals must be non-zero".into()));
        }
        if self.shine_resync_interval == 0 {
            return Err(NetError::InvalidConfig("shine_resync_interval must be non-zero".into()));
        }
        if self.tick_rate == 0 {
            return Err(NetError::InvalidConfig("tick_rate must be non-zero".into()));
        }
        if self.client_name.len() > COSTUMEBUFSIZE {
            return Err(NetError::InvalidConfig(format!(
                "client_name longer than {COSTUMEBUFSIZE} bytes"
            )));
        }
        Ok(())
    }

    /// Server address with the empty-IP default applied.
    #[must_use]
    pub fn effective_ip(&self) -> &str {
        if self.server_ip.trim().is_empty() {
            DEFAULT_SERVER_IP
        } else {
            self.server_ip.trim()
        }
    }

    /// Server port with the zero-port default applied.
    #[must_use]
    pub const fn effective_port(&self) -> u16 {
        if self.server_port == 0 {
            DEFAULT_SERVER_PORT
        } else {
            self.server_port
        }
    }

    /// Delay between connection attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
