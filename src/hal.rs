//! Hardware capability seams.
//!
//! Digital outputs and inputs are the embedded-hal 1.0 `OutputPin` and
//! `InputPin` traits, and blocking sleeps are `DelayNs`. The pulse daemon seam
//! is [`crate::wave::PulseWaveTransport`]. This module adds [`NoPin`] for
//! optional outputs that are not wired.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

/// Output that accepts every write and drives nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
