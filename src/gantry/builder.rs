//! Builder pattern for Gantry.

use embedded_hal::digital::OutputPin;

use crate::axis::{check_wave_gpio, StepperAxis};
use crate::config::GantryConfig;
use crate::error::{ConfigError, Error, Result};
use crate::hal::NoPin;
use crate::magnet::Electromagnet;
use crate::motion::StepTiming;
use crate::wave::{SoftwareTimed, WaveExecutor};

use super::controller::{Gantry, HomingSettings};

/// Builder for creating [`Gantry`] instances.
///
/// Without [`magnet`](Self::magnet) the gantry has no electromagnet; without
/// [`wave_executor`](Self::wave_executor) it uses software timing.
pub struct GantryBuilder<X, Y, M = NoPin, W = SoftwareTimed> {
    x: Option<X>,
    y: Option<Y>,
    magnet: Option<Electromagnet<M>>,
    wave: Option<W>,
    timing: StepTiming,
    homing: HomingSettings,
}

impl<X, Y> Default for GantryBuilder<X, Y, NoPin, SoftwareTimed> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X, Y> GantryBuilder<X, Y, NoPin, SoftwareTimed> {
    /// Create a new builder with default motion timing.
    pub fn new() -> Self {
        Self {
            x: None,
            y: None,
            magnet: None,
            wave: None,
            timing: StepTiming::from_config(&Default::default()),
            homing: HomingSettings::default(),
        }
    }
}

impl<X, Y, M, W> GantryBuilder<X, Y, M, W> {
    /// Set the X axis.
    pub fn x_axis(mut self, axis: X) -> Self {
        self.x = Some(axis);
        self
    }

    /// Set the Y axis.
    pub fn y_axis(mut self, axis: Y) -> Self {
        self.y = Some(axis);
        self
    }

    /// Fit an electromagnet.
    pub fn magnet<M2: OutputPin>(self, magnet: Electromagnet<M2>) -> GantryBuilder<X, Y, M2, W> {
        GantryBuilder {
            x: self.x,
            y: self.y,
            magnet: Some(magnet),
            wave: self.wave,
            timing: self.timing,
            homing: self.homing,
        }
    }

    /// Use hardware-timed moves.
    pub fn wave_executor<W2: WaveExecutor>(self, wave: W2) -> GantryBuilder<X, Y, M, W2> {
        GantryBuilder {
            x: self.x,
            y: self.y,
            magnet: self.magnet,
            wave: Some(wave),
            timing: self.timing,
            homing: self.homing,
        }
    }

    /// Set coordinated step timing.
    pub fn timing(mut self, timing: StepTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Set homing directions and speed.
    pub fn homing(mut self, homing: HomingSettings) -> Self {
        self.homing = homing;
        self
    }

    /// Apply the `[motion]` and `[homing]` sections and axis home directions.
    pub fn from_config(mut self, config: &GantryConfig) -> Self {
        self.timing = StepTiming::from_config(&config.motion);
        self.homing = HomingSettings::from_config(config);
        self
    }
}

impl<X, Y, M, W> GantryBuilder<X, Y, M, W>
where
    X: StepperAxis,
    Y: StepperAxis,
    M: OutputPin,
    W: WaveExecutor,
{
    /// Build the gantry.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` when an axis is missing, or when a wave executor
    /// is set but an axis has no GPIO numbers. Returns `InvalidPin` when a
    /// wave executor is set and an axis GPIO lies outside the wave bank.
    pub fn build(self) -> Result<Gantry<X, Y, M, W>> {
        let x = self
            .x
            .ok_or(Error::Config(ConfigError::MissingField("x_axis")))?;
        let y = self
            .y
            .ok_or(Error::Config(ConfigError::MissingField("y_axis")))?;

        if self.wave.is_some() {
            for gpio in [x.gpio(), y.gpio()] {
                let gpio = gpio.ok_or(Error::Config(ConfigError::MissingField("axis gpio")))?;
                check_wave_gpio(gpio)?;
            }
        }

        log::debug!(
            "gantry ready: x max {}, y max {}, {} timing",
            x.state().max_position(),
            y.state().max_position(),
            if self.wave.is_some() { "hardware" } else { "software" }
        );

        Ok(Gantry::new(
            x,
            y,
            self.magnet,
            self.wave,
            self.timing,
            self.homing,
        ))
    }
}
