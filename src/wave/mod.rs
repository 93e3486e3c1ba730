//! Hardware-timed pulse trains.
//!
//! A coordinated move is handed to a [`WaveExecutor`] as its step sequence.
//! The [`PulseTrainGenerator`] (requires `alloc`) splits it into per-axis
//! timelines, merges them, encodes pigpio-style pulses in bounded chunks and
//! streams them through a [`PulseWaveTransport`]. [`PigpioTransport`]
//! (requires `std`) talks to a running pigpiod over TCP.

#[cfg(feature = "alloc")]
mod generator;
#[cfg(feature = "std")]
mod pigpio;
#[cfg(feature = "alloc")]
mod pulse;
#[cfg(feature = "alloc")]
mod timeline;
mod transport;

use crate::axis::AxisId;
use crate::error::WaveError;
use crate::motion::LineSteps;

#[cfg(feature = "alloc")]
pub use generator::PulseTrainGenerator;
#[cfg(feature = "std")]
pub use pigpio::{command, PigpioTransport};
#[cfg(feature = "alloc")]
pub use pulse::{build_waves, decode_pulses, PulseEvent, LOW_PULSE_US};
#[cfg(feature = "alloc")]
pub use timeline::{axis_order, merge_timelines, timelines_from_steps, AxisTimeline};
pub use transport::{gpio_mask, Pulse, PulseWaveTransport};

/// Daemon-side description of one moving axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveAxis {
    /// Axis identifier.
    pub id: AxisId,
    /// STEP GPIO number.
    pub step_gpio: u8,
    /// DIR GPIO number.
    pub dir_gpio: u8,
    /// Physical DIR level for this move.
    pub dir_level: bool,
    /// STEP HIGH time in nanoseconds.
    pub pulse_ns: u32,
}

/// Outcome of a hardware-timed move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaveReport {
    /// Step edges emitted.
    pub events: usize,
    /// Waves transmitted.
    pub chunks: usize,
    /// Reconnects performed.
    pub reconnects: u32,
}

/// Executes a coordinated step sequence with hardware timing.
pub trait WaveExecutor {
    /// Emit every step of `steps` on the listed axes, blocking until done.
    fn execute(&mut self, steps: LineSteps, axes: &[WaveAxis]) -> Result<WaveReport, WaveError>;
}

/// Placeholder executor type for gantries that only use software timing.
///
/// Uninhabited: a gantry typed with it never holds an executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftwareTimed {}

impl WaveExecutor for SoftwareTimed {
    fn execute(&mut self, _steps: LineSteps, _axes: &[WaveAxis]) -> Result<WaveReport, WaveError> {
        match *self {}
    }
}
