//! Builder pattern for Axis.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::{
    AxisConfig, GantryConfig, DEFAULT_STEP_DELAY_US, DEFAULT_STEP_PULSE_US, MAX_WAVE_GPIO,
};
use crate::error::{ConfigError, Error, Result};
use crate::hal::NoPin;

use super::driver::{Axis, AxisGpio};
use super::state::{AxisId, AxisState};

/// Builder for creating [`Axis`] instances.
///
/// The ENABLE pin defaults to [`NoPin`]; calling [`enable_pin`](Self::enable_pin)
/// swaps in a real output.
pub struct AxisBuilder<STEP, DIR, EN, HOME, DELAY> {
    id: AxisId,
    step_pin: Option<STEP>,
    dir_pin: Option<DIR>,
    enable_pin: EN,
    home_pin: Option<HOME>,
    delay: Option<DELAY>,
    max_position: Option<i64>,
    invert_direction: bool,
    step_delay_ns: u32,
    step_pulse_ns: u32,
    endstop_active_low: bool,
    enable_active_low: bool,
    gpio: Option<AxisGpio>,
}

impl<STEP, DIR, HOME, DELAY> AxisBuilder<STEP, DIR, NoPin, HOME, DELAY> {
    /// Create a new builder for one axis.
    pub fn new(id: AxisId) -> Self {
        Self {
            id,
            step_pin: None,
            dir_pin: None,
            enable_pin: NoPin,
            home_pin: None,
            delay: None,
            max_position: None,
            invert_direction: false,
            step_delay_ns: DEFAULT_STEP_DELAY_US * 1_000,
            step_pulse_ns: DEFAULT_STEP_PULSE_US * 1_000,
            endstop_active_low: true,
            enable_active_low: true,
            gpio: None,
        }
    }
}

impl<STEP, DIR, EN, HOME, DELAY> AxisBuilder<STEP, DIR, EN, HOME, DELAY> {
    /// Set the STEP pin.
    pub fn step_pin(mut self, pin: STEP) -> Self {
        self.step_pin = Some(pin);
        self
    }

    /// Set the DIR pin.
    pub fn dir_pin(mut self, pin: DIR) -> Self {
        self.dir_pin = Some(pin);
        self
    }

    /// Set the endstop input.
    pub fn home_pin(mut self, pin: HOME) -> Self {
        self.home_pin = Some(pin);
        self
    }

    /// Set the delay provider.
    pub fn delay(mut self, delay: DELAY) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Attach an ENABLE output.
    pub fn enable_pin<E2>(self, pin: E2) -> AxisBuilder<STEP, DIR, E2, HOME, DELAY> {
        AxisBuilder {
            id: self.id,
            step_pin: self.step_pin,
            dir_pin: self.dir_pin,
            enable_pin: pin,
            home_pin: self.home_pin,
            delay: self.delay,
            max_position: self.max_position,
            invert_direction: self.invert_direction,
            step_delay_ns: self.step_delay_ns,
            step_pulse_ns: self.step_pulse_ns,
            endstop_active_low: self.endstop_active_low,
            enable_active_low: self.enable_active_low,
            gpio: self.gpio,
        }
    }

    /// Set the travel limit in steps.
    pub fn max_position(mut self, steps: i64) -> Self {
        self.max_position = Some(steps);
        self
    }

    /// Invert the DIR level.
    pub fn invert_direction(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Delay after each pulse of a single-axis move.
    pub fn step_delay_ns(mut self, ns: u32) -> Self {
        self.step_delay_ns = ns;
        self
    }

    /// STEP pulse width.
    pub fn step_pulse_ns(mut self, ns: u32) -> Self {
        self.step_pulse_ns = ns;
        self
    }

    /// Endstop reads LOW when pressed (default).
    pub fn endstop_active_low(mut self, active_low: bool) -> Self {
        self.endstop_active_low = active_low;
        self
    }

    /// Driver is enabled by a LOW level (default).
    pub fn enable_active_low(mut self, active_low: bool) -> Self {
        self.enable_active_low = active_low;
        self
    }

    /// GPIO numbers for hardware-timed moves.
    pub fn gpio(mut self, step: u8, dir: u8) -> Self {
        self.gpio = Some(AxisGpio { step, dir });
        self
    }

    /// Apply one `[axes.*]` section with an explicit travel limit.
    pub fn from_axis_config(mut self, config: &AxisConfig, max_position: i64) -> Self {
        self.max_position = Some(max_position);
        self.invert_direction = config.invert_direction;
        self.step_delay_ns = config.step_delay.as_nanos();
        self.step_pulse_ns = config.step_pulse.as_nanos();
        self.endstop_active_low = config.endstop_active_low;
        self.enable_active_low = config.enable_active_low;
        self.gpio = Some(AxisGpio {
            step: config.step_pin,
            dir: config.dir_pin,
        });
        self
    }

    /// Configure from the gantry configuration for this builder's axis.
    ///
    /// The travel limit is the explicit `max_position`, or else derived from
    /// the `[board]` section.
    pub fn from_gantry_config(self, config: &GantryConfig) -> Result<Self> {
        let id = self.id;
        let max_position = config
            .max_position(id)
            .ok_or(Error::Config(ConfigError::InvalidMaxPosition { axis: id, value: 0 }))?;
        Ok(self.from_axis_config(config.axis(id), max_position))
    }
}

impl<STEP, DIR, EN, HOME, DELAY> AxisBuilder<STEP, DIR, EN, HOME, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    HOME: InputPin,
    DELAY: DelayNs,
{
    /// Build the axis.
    ///
    /// Drives STEP low and the ENABLE output to its enabled level.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` when a pin, the delay or the travel limit was
    /// not supplied, and `InvalidPin` when a GPIO number lies outside the
    /// wave bank.
    pub fn build(self) -> Result<Axis<STEP, DIR, EN, HOME, DELAY>> {
        let step_pin = self
            .step_pin
            .ok_or(Error::Config(ConfigError::MissingField("step_pin")))?;
        let dir_pin = self
            .dir_pin
            .ok_or(Error::Config(ConfigError::MissingField("dir_pin")))?;
        let home_pin = self
            .home_pin
            .ok_or(Error::Config(ConfigError::MissingField("home_pin")))?;
        let delay = self
            .delay
            .ok_or(Error::Config(ConfigError::MissingField("delay")))?;
        let max_position = self
            .max_position
            .ok_or(Error::Config(ConfigError::MissingField("max_position")))?;

        if max_position < 0 {
            return Err(Error::Config(ConfigError::InvalidMaxPosition {
                axis: self.id,
                value: max_position,
            }));
        }

        if let Some(gpio) = self.gpio {
            check_wave_gpio(gpio)?;
        }

        let state = AxisState::new(
            max_position,
            self.invert_direction,
            self.step_delay_ns,
            self.step_pulse_ns,
        );

        Axis::new(
            self.id,
            step_pin,
            dir_pin,
            self.enable_pin,
            home_pin,
            delay,
            state,
            self.gpio,
            self.endstop_active_low,
            self.enable_active_low,
        )
    }
}

/// Reject GPIO numbers a wave mask cannot address.
pub(crate) fn check_wave_gpio(gpio: AxisGpio) -> Result<()> {
    for pin in [gpio.step, gpio.dir] {
        if pin > MAX_WAVE_GPIO {
            return Err(Error::Config(ConfigError::InvalidPin(pin)));
        }
    }
    Ok(())
}
