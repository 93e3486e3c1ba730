//! Simulated hardware backend.
//!
//! Implements the same capability traits as real hardware so a gantry can be
//! built and exercised without GPIO or a pulse daemon. Every handle is cheap
//! to clone and clones share state, so tests keep a clone to inspect after
//! handing the original to the driver.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

use crate::error::WaveError;
use crate::wave::{Pulse, PulseWaveTransport};

/// Failure injected into a simulated pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPinError;

impl digital::Error for SimPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Default)]
struct PinShared {
    level: AtomicBool,
    rising_edges: AtomicU32,
    writes: AtomicU32,
    fail_after: AtomicU32,
}

/// Read-only view of a [`SimPin`].
#[derive(Debug, Clone)]
pub struct PinProbe(Arc<PinShared>);

impl PinProbe {
    /// Current output level.
    pub fn is_high(&self) -> bool {
        self.0.level.load(Ordering::SeqCst)
    }

    /// LOW to HIGH transitions so far.
    pub fn rising_edges(&self) -> u32 {
        self.0.rising_edges.load(Ordering::SeqCst)
    }

    /// Successful writes so far.
    pub fn writes(&self) -> u32 {
        self.0.writes.load(Ordering::SeqCst)
    }
}

/// Recording output pin.
#[derive(Debug, Clone)]
pub struct SimPin(Arc<PinShared>);

impl SimPin {
    /// Output starting LOW.
    pub fn new() -> Self {
        let shared = PinShared {
            fail_after: AtomicU32::new(u32::MAX),
            ..PinShared::default()
        };
        Self(Arc::new(shared))
    }

    /// Output whose writes fail once `writes` writes have succeeded.
    pub fn failing_after(writes: u32) -> Self {
        let pin = Self::new();
        pin.0.fail_after.store(writes, Ordering::SeqCst);
        pin
    }

    /// Observer sharing this pin's state.
    pub fn probe(&self) -> PinProbe {
        PinProbe(Arc::clone(&self.0))
    }

    fn drive(&mut self, high: bool) -> Result<(), SimPinError> {
        let shared = &self.0;
        if shared.writes.load(Ordering::SeqCst) >= shared.fail_after.load(Ordering::SeqCst) {
            return Err(SimPinError);
        }
        shared.writes.fetch_add(1, Ordering::SeqCst);
        let was_high = shared.level.swap(high, Ordering::SeqCst);
        if high && !was_high {
            shared.rising_edges.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl Default for SimPin {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorType for SimPin {
    type Error = SimPinError;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

/// When a simulated endstop reports "pressed".
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Never pressed.
    Never,
    /// Always pressed.
    Always,
    /// Pressed once the watched STEP pin has produced this many rising edges.
    AfterPulses(PinProbe, u32),
}

/// Scripted endstop input.
#[derive(Debug, Clone)]
pub struct SimEndstop {
    trigger: Trigger,
    active_low: bool,
    reads: Arc<AtomicU32>,
}

impl SimEndstop {
    /// Endstop with the given trigger, reading LOW when pressed.
    pub fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            active_low: true,
            reads: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Choose the electrical polarity.
    pub fn active_low(mut self, active_low: bool) -> Self {
        self.active_low = active_low;
        self
    }

    /// Reads so far (shared between clones).
    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }

    fn pressed(&self) -> bool {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match &self.trigger {
            Trigger::Never => false,
            Trigger::Always => true,
            Trigger::AfterPulses(probe, pulses) => probe.rising_edges() >= *pulses,
        }
    }
}

impl ErrorType for SimEndstop {
    type Error = SimPinError;
}

impl InputPin for SimEndstop {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pressed() != self.active_low)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pressed() == self.active_low)
    }
}

/// Delay provider that only accumulates the requested time.
#[derive(Debug, Clone, Default)]
pub struct SimDelay(Arc<AtomicU64>);

impl SimDelay {
    /// New delay at zero elapsed time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total requested sleep in nanoseconds.
    pub fn elapsed_ns(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.fetch_add(u64::from(ns), Ordering::SeqCst);
    }
}

/// Everything a [`SimWaveTransport`] has been asked to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaveLog {
    /// Waves that were transmitted, in order.
    pub waves: Vec<Vec<Pulse>>,
    /// GPIOs configured as outputs, in order.
    pub outputs: Vec<u8>,
    /// Level writes, in order.
    pub writes: Vec<(u8, bool)>,
    /// Wave ids created.
    pub created: Vec<u32>,
    /// Wave ids deleted.
    pub deleted: Vec<u32>,
    /// Reconnects performed.
    pub reconnects: u32,
}

#[derive(Debug, Default)]
struct WaveShared {
    log: WaveLog,
    pending: Vec<Pulse>,
    built: Vec<(u32, Vec<Pulse>)>,
    next_id: u32,
    sends: u32,
    failures: Vec<(u32, WaveError)>,
    busy: bool,
}

/// Recording wave daemon with fault injection.
///
/// Reports "busy" exactly once after each transmitted wave.
#[derive(Debug, Clone, Default)]
pub struct SimWaveTransport(Arc<Mutex<WaveShared>>);

impl SimWaveTransport {
    /// New transport with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `nth` (1-based) `wave_send_once` call with a connection reset.
    pub fn fail_send(self, nth: u32) -> Self {
        self.fail_send_with(nth, WaveError::ConnectionReset)
    }

    /// Fail the `nth` (1-based) `wave_send_once` call with `error`.
    pub fn fail_send_with(self, nth: u32, error: WaveError) -> Self {
        self.shared().failures.push((nth, error));
        self
    }

    /// Snapshot of the log.
    pub fn log(&self) -> WaveLog {
        self.shared().log.clone()
    }

    fn shared(&self) -> MutexGuard<'_, WaveShared> {
        // A panic while holding the lock only happens inside a failing test.
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl PulseWaveTransport for SimWaveTransport {
    fn set_output(&mut self, gpio: u8) -> Result<(), WaveError> {
        self.shared().log.outputs.push(gpio);
        Ok(())
    }

    fn write(&mut self, gpio: u8, high: bool) -> Result<(), WaveError> {
        self.shared().log.writes.push((gpio, high));
        Ok(())
    }

    fn wave_clear(&mut self) -> Result<(), WaveError> {
        let mut shared = self.shared();
        shared.pending.clear();
        shared.built.clear();
        Ok(())
    }

    fn wave_add_generic(&mut self, pulses: &[Pulse]) -> Result<u32, WaveError> {
        let mut shared = self.shared();
        shared.pending.extend_from_slice(pulses);
        Ok(shared.pending.len() as u32)
    }

    fn wave_create(&mut self) -> Result<u32, WaveError> {
        let mut shared = self.shared();
        let id = shared.next_id;
        shared.next_id += 1;
        let pulses = core::mem::take(&mut shared.pending);
        shared.built.push((id, pulses));
        shared.log.created.push(id);
        Ok(id)
    }

    fn wave_send_once(&mut self, wave_id: u32) -> Result<u32, WaveError> {
        let mut shared = self.shared();
        shared.sends += 1;
        let send = shared.sends;
        if let Some(i) = shared.failures.iter().position(|(nth, _)| *nth == send) {
            let (_, error) = shared.failures.remove(i);
            return Err(error);
        }

        let pulses = shared
            .built
            .iter()
            .find(|(id, _)| *id == wave_id)
            .map(|(_, p)| p.clone())
            .ok_or(WaveError::Command {
                command: 51,
                code: -66,
            })?;
        let count = pulses.len() as u32;
        shared.log.waves.push(pulses);
        shared.busy = true;
        Ok(count)
    }

    fn wave_tx_busy(&mut self) -> Result<bool, WaveError> {
        let mut shared = self.shared();
        Ok(core::mem::replace(&mut shared.busy, false))
    }

    fn wave_delete(&mut self, wave_id: u32) -> Result<(), WaveError> {
        let mut shared = self.shared();
        shared.built.retain(|(id, _)| *id != wave_id);
        shared.log.deleted.push(wave_id);
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), WaveError> {
        let mut shared = self.shared();
        shared.pending.clear();
        shared.built.clear();
        shared.log.reconnects += 1;
        Ok(())
    }
}
