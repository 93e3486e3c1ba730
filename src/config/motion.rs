//! Coordinated motion and homing parameters from TOML.

use serde::Deserialize;

use super::units::Microseconds;

/// Delay multiplier applied to both axes when a move is diagonal.
///
/// Empirical hardware-tuning value; recalibrate on new mechanics.
pub const DEFAULT_DIAGONAL_FACTOR: f32 = 0.7;

/// Cruise delay (~1250 steps/s). Stays above 500us so TMC StealthChop holds.
pub const DEFAULT_MIN_STEP_DELAY_US: u32 = 800;

/// Start/stop delay (~250 steps/s).
pub const DEFAULT_MAX_STEP_DELAY_US: u32 = 4_000;

/// Ramp length in steps.
pub const DEFAULT_ACCEL_STEPS: u32 = 300;

/// Homing step delay, slower than normal travel.
pub const DEFAULT_HOME_STEP_DELAY_US: u32 = 5_000;

/// Velocity profile and diagonal tuning for coordinated moves.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Delay at cruise speed.
    #[serde(rename = "min_step_delay_us")]
    pub min_step_delay: Microseconds,

    /// Delay at the start and end of a ramp.
    #[serde(rename = "max_step_delay_us")]
    pub max_step_delay: Microseconds,

    /// Steps spent accelerating (and decelerating).
    pub accel_steps: u32,

    /// Use the trapezoidal ramp; when false every step uses `min_step_delay`.
    pub enable_acceleration: bool,

    /// Delay multiplier when both axes move.
    pub diagonal_factor: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            min_step_delay: Microseconds(DEFAULT_MIN_STEP_DELAY_US),
            max_step_delay: Microseconds(DEFAULT_MAX_STEP_DELAY_US),
            accel_steps: DEFAULT_ACCEL_STEPS,
            enable_acceleration: true,
            diagonal_factor: DEFAULT_DIAGONAL_FACTOR,
        }
    }
}

/// Homing parameters shared by both axes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HomingConfig {
    /// Delay between homing steps.
    #[serde(rename = "step_delay_us")]
    pub step_delay: Microseconds,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            step_delay: Microseconds(DEFAULT_HOME_STEP_DELAY_US),
        }
    }
}
