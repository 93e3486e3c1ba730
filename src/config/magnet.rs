//! Electromagnet wiring from TOML.

use serde::Deserialize;

/// Electromagnet output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ElectromagnetConfig {
    /// BCM GPIO switching the magnet (via transistor or relay).
    pub pin: u8,

    /// Magnet is ON when the GPIO is HIGH (NPN). False for PNP or active-low relays.
    #[serde(default = "default_active_high")]
    pub active_high: bool,
}

fn default_active_high() -> bool {
    true
}
