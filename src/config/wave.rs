//! Pulse daemon connection and chunking parameters from TOML.

use heapless::String;
use serde::Deserialize;

use super::units::Microseconds;

/// Pulses per hardware wave. Conservative; the daemon accepts far more.
pub const DEFAULT_MAX_PULSES_PER_WAVE: usize = 3_000;

/// Hard per-wave pulse limit of pigpiod.
pub const DAEMON_MAX_PULSES_PER_WAVE: usize = 12_000;

/// Highest GPIO addressable by a single 32-bit wave bank.
pub const MAX_WAVE_GPIO: u8 = 31;

/// Default pigpiod TCP port.
pub const DEFAULT_DAEMON_PORT: u16 = 8888;

/// Hardware-timed step generation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Try the pulse daemon at startup; fall back to software timing otherwise.
    pub enabled: bool,

    /// Daemon host name.
    pub host: String<64>,

    /// Daemon TCP port.
    pub port: u16,

    /// Upper bound on pulse descriptors per wave.
    pub max_pulses_per_wave: usize,

    /// Sleep between busy-flag polls while a wave transmits.
    #[serde(rename = "busy_poll_us")]
    pub busy_poll: Microseconds,

    /// Connect and read timeout in milliseconds.
    pub timeout_ms: u32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: String::try_from("localhost").unwrap_or_default(),
            port: DEFAULT_DAEMON_PORT,
            max_pulses_per_wave: DEFAULT_MAX_PULSES_PER_WAVE,
            busy_poll: Microseconds(500),
            timeout_ms: 2_000,
        }
    }
}
