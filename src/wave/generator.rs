//! Chunked wave streaming with one reconnect.

use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::config::{WaveConfig, DAEMON_MAX_PULSES_PER_WAVE, DEFAULT_MAX_PULSES_PER_WAVE};
use crate::error::WaveError;
use crate::motion::LineSteps;

use super::pulse::build_waves;
use super::timeline::{merge_timelines, timelines_from_steps, AxisTimeline};
use super::transport::{Pulse, PulseWaveTransport};
use super::{WaveAxis, WaveExecutor, WaveReport};

const DEFAULT_BUSY_POLL_US: u32 = 500;

/// Streams merged step timelines to a wave daemon.
///
/// Owns its transport; after a [`WaveError::ConnectionReset`] the transport
/// is reconnected in place exactly once per move, pins are set up again and
/// streaming resumes at the chunk that failed. Any further error is returned.
pub struct PulseTrainGenerator<T, D> {
    transport: T,
    delay: D,
    max_pulses_per_wave: usize,
    busy_poll_us: u32,
}

impl<T, D> PulseTrainGenerator<T, D>
where
    T: PulseWaveTransport,
    D: DelayNs,
{
    /// Create a generator with default chunk size and poll interval.
    pub fn new(transport: T, delay: D) -> Self {
        Self {
            transport,
            delay,
            max_pulses_per_wave: DEFAULT_MAX_PULSES_PER_WAVE,
            busy_poll_us: DEFAULT_BUSY_POLL_US,
        }
    }

    /// Create from the `[wave]` configuration section.
    pub fn from_config(transport: T, delay: D, config: &WaveConfig) -> Self {
        Self::new(transport, delay)
            .with_max_pulses(config.max_pulses_per_wave)
            .with_busy_poll_us(config.busy_poll.value())
    }

    /// Set the descriptor limit per wave (clamped to 3-12000).
    pub fn with_max_pulses(mut self, max_pulses: usize) -> Self {
        self.max_pulses_per_wave = max_pulses.clamp(3, DAEMON_MAX_PULSES_PER_WAVE);
        self
    }

    /// Set the sleep between busy polls.
    pub fn with_busy_poll_us(mut self, us: u32) -> Self {
        self.busy_poll_us = us;
        self
    }

    /// Descriptor limit per wave.
    #[inline]
    pub fn max_pulses_per_wave(&self) -> usize {
        self.max_pulses_per_wave
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Release the transport and delay.
    pub fn into_parts(self) -> (T, D) {
        (self.transport, self.delay)
    }

    /// Play per-axis timelines, blocking until the last wave finishes.
    ///
    /// Every driven STEP pin is written LOW afterwards; on the error path
    /// that write is best-effort.
    pub fn run(&mut self, timelines: &[AxisTimeline]) -> Result<WaveReport, WaveError> {
        let events = merge_timelines(timelines);
        let chunks = build_waves(&events, self.max_pulses_per_wave);
        let mut report = WaveReport {
            events: events.len(),
            chunks: chunks.len(),
            reconnects: 0,
        };

        if chunks.is_empty() {
            return Ok(report);
        }

        log::debug!(
            "streaming {} step edges in {} waves",
            report.events,
            report.chunks
        );

        let mut next_chunk = 0;
        let outcome = loop {
            match self.attempt(timelines, &chunks, &mut next_chunk) {
                Ok(()) => break Ok(()),
                Err(WaveError::ConnectionReset) if report.reconnects == 0 => {
                    log::warn!(
                        "pulse daemon connection reset at wave {}/{}; reconnecting",
                        next_chunk + 1,
                        chunks.len()
                    );
                    report.reconnects += 1;
                    if let Err(e) = self.transport.reconnect() {
                        break Err(e);
                    }
                    log::info!("reconnected to pulse daemon");
                }
                Err(e) => break Err(e),
            }
        };

        match outcome {
            Ok(()) => {
                self.release(timelines)?;
                Ok(report)
            }
            Err(e) => {
                let _ = self.release(timelines);
                Err(e)
            }
        }
    }

    fn attempt(
        &mut self,
        timelines: &[AxisTimeline],
        chunks: &[Vec<Pulse>],
        next_chunk: &mut usize,
    ) -> Result<(), WaveError> {
        self.prepare(timelines)?;
        while let Some(chunk) = chunks.get(*next_chunk) {
            self.send_wave(chunk)?;
            log::trace!("wave {}/{} done", *next_chunk + 1, chunks.len());
            *next_chunk += 1;
        }
        Ok(())
    }

    fn prepare(&mut self, timelines: &[AxisTimeline]) -> Result<(), WaveError> {
        for timeline in timelines.iter().filter(|t| !t.is_empty()) {
            let axis = timeline.axis;
            self.transport.set_output(axis.step_gpio)?;
            self.transport.set_output(axis.dir_gpio)?;
            self.transport.write(axis.step_gpio, false)?;
            self.transport.write(axis.dir_gpio, axis.dir_level)?;
        }
        Ok(())
    }

    fn send_wave(&mut self, pulses: &[Pulse]) -> Result<(), WaveError> {
        self.transport.wave_clear()?;
        self.transport.wave_add_generic(pulses)?;
        let wave_id = self.transport.wave_create()?;
        self.transport.wave_send_once(wave_id)?;
        while self.transport.wave_tx_busy()? {
            self.delay.delay_us(self.busy_poll_us);
        }
        self.transport.wave_delete(wave_id)?;
        self.transport.wave_clear()
    }

    fn release(&mut self, timelines: &[AxisTimeline]) -> Result<(), WaveError> {
        for timeline in timelines.iter().filter(|t| !t.is_empty()) {
            self.transport.write(timeline.axis.step_gpio, false)?;
        }
        Ok(())
    }
}

impl<T, D> WaveExecutor for PulseTrainGenerator<T, D>
where
    T: PulseWaveTransport,
    D: DelayNs,
{
    fn execute(&mut self, steps: LineSteps, axes: &[WaveAxis]) -> Result<WaveReport, WaveError> {
        let timelines = timelines_from_steps(steps, axes);
        self.run(&timelines)
    }
}
