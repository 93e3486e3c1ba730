//! Event encoding and wave chunking.

use alloc::vec::Vec;

use crate::axis::AxisId;

use super::transport::Pulse;

/// A step pulse at an absolute time on the merged timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseEvent {
    /// Rising edge time since the start of the move, in nanoseconds.
    pub time_ns: u64,
    /// Axis that steps.
    pub axis: AxisId,
    /// STEP GPIO of that axis.
    pub gpio: u8,
    /// HIGH time in microseconds.
    pub pulse_us: u32,
}

/// Width of the LOW pulse that closes every step.
pub const LOW_PULSE_US: u32 = 1;

#[inline]
fn round_us(ns: u64) -> u64 {
    (ns + 500) / 1_000
}

/// Encode merged events as chunks of at most `max_pulses` descriptors.
///
/// Each event becomes an optional idle pulse covering the gap from the wave
/// cursor, a HIGH pulse and a [`LOW_PULSE_US`] LOW pulse. Events are never
/// split across chunks, and the cursor carries over between chunks so the
/// gaps stay continuous.
pub fn build_waves(events: &[PulseEvent], max_pulses: usize) -> Vec<Vec<Pulse>> {
    let max_pulses = max_pulses.max(3);
    let mut chunks = Vec::new();
    let mut current: Vec<Pulse> = Vec::new();
    let mut cursor_us: u64 = 0;

    for event in events {
        let time_us = round_us(event.time_ns);
        let gap = time_us.saturating_sub(cursor_us);
        let needed = if gap > 0 { 3 } else { 2 };

        if !current.is_empty() && current.len() + needed > max_pulses {
            chunks.push(core::mem::take(&mut current));
        }

        if gap > 0 {
            current.push(Pulse::idle(u32::try_from(gap).unwrap_or(u32::MAX)));
            cursor_us += gap;
        }
        current.push(Pulse::high(event.gpio, event.pulse_us));
        current.push(Pulse::low(event.gpio, LOW_PULSE_US));
        cursor_us += u64::from(event.pulse_us) + u64::from(LOW_PULSE_US);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Recover `(rising_edge_us, gpio)` pairs from encoded chunks.
pub fn decode_pulses(chunks: &[Vec<Pulse>]) -> Vec<(u64, u8)> {
    let mut edges = Vec::new();
    let mut time_us: u64 = 0;

    for pulse in chunks.iter().flatten() {
        let mut mask = pulse.gpio_on;
        while mask != 0 {
            let gpio = mask.trailing_zeros() as u8;
            edges.push((time_us, gpio));
            mask &= mask - 1;
        }
        time_us += u64::from(pulse.delay_us);
    }

    edges
}
