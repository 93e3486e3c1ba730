//! Pulse daemon transport seam.

use crate::error::WaveError;

/// Bank-0 bit for `gpio`; zero for GPIOs outside the 32-bit bank.
#[inline]
pub const fn gpio_mask(gpio: u8) -> u32 {
    match 1u32.checked_shl(gpio as u32) {
        Some(mask) => mask,
        None => 0,
    }
}

/// One pigpio-style pulse: set the `gpio_on` bits, clear the `gpio_off`
/// bits, then hold for `delay_us`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pulse {
    /// GPIO mask driven HIGH at the start of the pulse.
    pub gpio_on: u32,
    /// GPIO mask driven LOW at the start of the pulse.
    pub gpio_off: u32,
    /// Time until the next pulse, in microseconds.
    pub delay_us: u32,
}

impl Pulse {
    /// Hold all levels for `delay_us`.
    #[inline]
    pub const fn idle(delay_us: u32) -> Self {
        Self {
            gpio_on: 0,
            gpio_off: 0,
            delay_us,
        }
    }

    /// Drive `gpio` HIGH for `delay_us`.
    #[inline]
    pub const fn high(gpio: u8, delay_us: u32) -> Self {
        Self {
            gpio_on: gpio_mask(gpio),
            gpio_off: 0,
            delay_us,
        }
    }

    /// Drive `gpio` LOW for `delay_us`.
    #[inline]
    pub const fn low(gpio: u8, delay_us: u32) -> Self {
        Self {
            gpio_on: 0,
            gpio_off: gpio_mask(gpio),
            delay_us,
        }
    }
}

/// Commands the pulse-train generator issues to a wave daemon.
///
/// Mirrors the pigpio wave API. Implementations map a dropped connection to
/// [`WaveError::ConnectionReset`]; the generator reconnects once on that error.
pub trait PulseWaveTransport {
    /// Configure a GPIO as an output.
    fn set_output(&mut self, gpio: u8) -> Result<(), WaveError>;

    /// Drive a GPIO level.
    fn write(&mut self, gpio: u8, high: bool) -> Result<(), WaveError>;

    /// Discard all waves and pending pulses.
    fn wave_clear(&mut self) -> Result<(), WaveError>;

    /// Append pulses to the pending wave. Returns the pending pulse count.
    fn wave_add_generic(&mut self, pulses: &[Pulse]) -> Result<u32, WaveError>;

    /// Turn the pending pulses into a wave. Returns its id.
    fn wave_create(&mut self) -> Result<u32, WaveError>;

    /// Transmit a wave once. Returns the number of DMA control blocks.
    fn wave_send_once(&mut self, wave_id: u32) -> Result<u32, WaveError>;

    /// Whether a wave is still transmitting.
    fn wave_tx_busy(&mut self) -> Result<bool, WaveError>;

    /// Delete a wave.
    fn wave_delete(&mut self, wave_id: u32) -> Result<(), WaveError>;

    /// Drop the current connection and open a new one.
    fn reconnect(&mut self) -> Result<(), WaveError>;
}

impl<T: PulseWaveTransport + ?Sized> PulseWaveTransport for &mut T {
    fn set_output(&mut self, gpio: u8) -> Result<(), WaveError> {
        (**self).set_output(gpio)
    }

    fn write(&mut self, gpio: u8, high: bool) -> Result<(), WaveError> {
        (**self).write(gpio, high)
    }

    fn wave_clear(&mut self) -> Result<(), WaveError> {
        (**self).wave_clear()
    }

    fn wave_add_generic(&mut self, pulses: &[Pulse]) -> Result<u32, WaveError> {
        (**self).wave_add_generic(pulses)
    }

    fn wave_create(&mut self) -> Result<u32, WaveError> {
        (**self).wave_create()
    }

    fn wave_send_once(&mut self, wave_id: u32) -> Result<u32, WaveError> {
        (**self).wave_send_once(wave_id)
    }

    fn wave_tx_busy(&mut self) -> Result<bool, WaveError> {
        (**self).wave_tx_busy()
    }

    fn wave_delete(&mut self, wave_id: u32) -> Result<(), WaveError> {
        (**self).wave_delete(wave_id)
    }

    fn reconnect(&mut self) -> Result<(), WaveError> {
        (**self).reconnect()
    }
}
