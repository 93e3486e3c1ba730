//! Per-axis calibration from TOML.

use serde::Deserialize;

use super::units::Microseconds;
use crate::motion::Direction;

/// Default delay between steps for single-axis moves (500 steps/s).
pub const DEFAULT_STEP_DELAY_US: u32 = 2_000;

/// Default STEP pulse width.
pub const DEFAULT_STEP_PULSE_US: u32 = 1_000;

/// Complete axis configuration from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisConfig {
    /// BCM GPIO driving the STEP input.
    pub step_pin: u8,

    /// BCM GPIO driving the DIR input.
    pub dir_pin: u8,

    /// BCM GPIO reading the homing switch.
    pub home_pin: u8,

    /// Optional BCM GPIO driving the driver's ENABLE input.
    #[serde(default)]
    pub enable_pin: Option<u8>,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// Travel limit in steps. Derived from `[board]` when omitted.
    #[serde(default)]
    pub max_position: Option<i64>,

    /// Delay between steps for single-axis moves.
    #[serde(default = "default_step_delay", rename = "step_delay_us")]
    pub step_delay: Microseconds,

    /// STEP pulse width.
    #[serde(default = "default_step_pulse", rename = "step_pulse_us")]
    pub step_pulse: Microseconds,

    /// Endstop reads LOW when pressed (switch to ground with pull-up).
    #[serde(default = "default_true")]
    pub endstop_active_low: bool,

    /// Driver is enabled by a LOW level on the ENABLE pin.
    #[serde(default = "default_true")]
    pub enable_active_low: bool,

    /// Direction of travel towards the homing switch.
    #[serde(default)]
    pub home_direction: Direction,
}

fn default_step_delay() -> Microseconds {
    Microseconds(DEFAULT_STEP_DELAY_US)
}

fn default_step_pulse() -> Microseconds {
    Microseconds(DEFAULT_STEP_PULSE_US)
}

fn default_true() -> bool {
    true
}

impl AxisConfig {
    /// Create an axis configuration with default timing for the given pins.
    pub fn new(step_pin: u8, dir_pin: u8, home_pin: u8) -> Self {
        Self {
            step_pin,
            dir_pin,
            home_pin,
            enable_pin: None,
            invert_direction: false,
            max_position: None,
            step_delay: default_step_delay(),
            step_pulse: default_step_pulse(),
            endstop_active_low: true,
            enable_active_low: true,
            home_direction: Direction::default(),
        }
    }

    /// All GPIOs claimed by this axis.
    pub fn pins(&self) -> impl Iterator<Item = u8> {
        [Some(self.step_pin), Some(self.dir_pin), Some(self.home_pin), self.enable_pin]
            .into_iter()
            .flatten()
    }
}
