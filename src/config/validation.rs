//! Configuration validation.

use crate::axis::AxisId;
use crate::error::{ConfigError, Error, Result};

use super::wave::{DAEMON_MAX_PULSES_PER_WAVE, MAX_WAVE_GPIO};
use super::{AxisConfig, GantryConfig, MotionConfig};

/// Every event needs up to three pulses (gap, HIGH, LOW).
const MIN_PULSES_PER_WAVE: usize = 3;

/// Validate a gantry configuration.
///
/// Checks:
/// - Both axes resolve to a positive travel limit that fits a step counter
/// - Pulse widths are non-zero
/// - Step delays are non-zero and ordered (min <= max)
/// - Diagonal factor is in (0, 1]
/// - Wave chunk size is within the daemon's limits
/// - GPIO numbers fit a wave bank and none is assigned twice
pub fn validate_config(config: &GantryConfig) -> Result<()> {
    for axis in [AxisId::X, AxisId::Y] {
        validate_axis(axis, config.axis(axis), config.max_position(axis))?;
    }

    validate_motion(&config.motion)?;

    let chunk = config.wave.max_pulses_per_wave;
    if !(MIN_PULSES_PER_WAVE..=DAEMON_MAX_PULSES_PER_WAVE).contains(&chunk) {
        return Err(Error::Config(ConfigError::InvalidChunkSize(chunk)));
    }

    validate_pins(config)?;

    Ok(())
}

fn validate_axis(axis: AxisId, config: &AxisConfig, max_position: Option<i64>) -> Result<()> {
    let value = max_position.unwrap_or(0);
    if value <= 0 || value > i64::from(u32::MAX) {
        return Err(Error::Config(ConfigError::InvalidMaxPosition { axis, value }));
    }

    if config.step_pulse.value() == 0 {
        return Err(Error::Config(ConfigError::InvalidPulseWidth(config.step_pulse.value())));
    }

    Ok(())
}

fn validate_motion(config: &MotionConfig) -> Result<()> {
    let min_us = config.min_step_delay.value();
    let max_us = config.max_step_delay.value();
    if min_us == 0 || min_us > max_us {
        return Err(Error::Config(ConfigError::InvalidStepDelays { min_us, max_us }));
    }

    // NaN fails both comparisons
    if !(config.diagonal_factor > 0.0 && config.diagonal_factor <= 1.0) {
        return Err(Error::Config(ConfigError::InvalidDiagonalFactor(
            config.diagonal_factor,
        )));
    }

    Ok(())
}

fn validate_pins(config: &GantryConfig) -> Result<()> {
    let mut seen: u64 = 0;
    for pin in config.assigned_pins() {
        if pin > MAX_WAVE_GPIO {
            return Err(Error::Config(ConfigError::InvalidPin(pin)));
        }
        let bit = 1u64 << pin;
        if seen & bit != 0 {
            return Err(Error::Config(ConfigError::PinConflict(pin)));
        }
        seen |= bit;
    }
    Ok(())
}
