//! Electromagnet driver.

use embedded_hal::digital::OutputPin;
use serde::Serialize;

use crate::config::ElectromagnetConfig;
use crate::error::{PinError, Result};

/// Serializable electromagnet status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElectromagnetStatus {
    /// Whether the coil is energized.
    pub is_on: bool,
}

/// On/off electromagnet behind one GPIO output.
pub struct Electromagnet<PIN> {
    pin: PIN,
    is_on: bool,
    active_high: bool,
}

impl<PIN: OutputPin> Electromagnet<PIN> {
    /// Take ownership of the output and drive it to "off".
    pub fn new(pin: PIN, active_high: bool) -> Result<Self> {
        let mut magnet = Self {
            pin,
            is_on: true,
            active_high,
        };
        magnet.off()?;
        Ok(magnet)
    }

    /// Create from the `[electromagnet]` configuration section.
    pub fn from_config(pin: PIN, config: &ElectromagnetConfig) -> Result<Self> {
        Self::new(pin, config.active_high)
    }

    /// Energize the coil.
    pub fn on(&mut self) -> Result<()> {
        self.drive(true)?;
        log::debug!("electromagnet on");
        Ok(())
    }

    /// De-energize the coil.
    pub fn off(&mut self) -> Result<()> {
        self.drive(false)?;
        log::debug!("electromagnet off");
        Ok(())
    }

    /// Flip the coil state.
    pub fn toggle(&mut self) -> Result<()> {
        if self.is_on {
            self.off()
        } else {
            self.on()
        }
    }

    /// Whether the coil is energized.
    #[inline]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Status snapshot.
    pub fn status(&self) -> ElectromagnetStatus {
        ElectromagnetStatus { is_on: self.is_on }
    }

    /// Release the output pin.
    pub fn into_pin(self) -> PIN {
        self.pin
    }

    fn drive(&mut self, on: bool) -> Result<()> {
        let high = on == self.active_high;
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| PinError::Magnet)?;
        self.is_on = on;
        Ok(())
    }
}
