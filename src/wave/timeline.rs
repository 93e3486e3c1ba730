//! Per-axis step timelines.
//!
//! A timeline lists, for one axis, the time between consecutive rising edges.
//! Timelines are derived from a coordinated step sequence: event `k` fires at
//! `T_k = sum over j <= k of (delay_j + pulse_j)`, and each axis records the
//! gap since its own previous event. Accumulating and merging the timelines
//! therefore reproduces the sequence's interleaving.

use alloc::vec::Vec;

use crate::axis::AxisId;
use crate::motion::StepEvent;

use super::pulse::PulseEvent;
use super::WaveAxis;

/// Rising-edge gaps for one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisTimeline {
    /// Pins and pulse width of the axis.
    pub axis: WaveAxis,
    /// Gap before each step, in nanoseconds.
    pub delays_ns: Vec<u64>,
}

impl AxisTimeline {
    /// Empty timeline for an axis.
    pub fn new(axis: WaveAxis) -> Self {
        Self {
            axis,
            delays_ns: Vec::new(),
        }
    }

    /// Number of steps.
    #[inline]
    pub fn len(&self) -> usize {
        self.delays_ns.len()
    }

    /// Whether the axis takes no steps.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.delays_ns.is_empty()
    }

    /// Absolute events, accumulating the gaps from time zero.
    pub fn events(&self) -> impl Iterator<Item = PulseEvent> + '_ {
        let axis = self.axis;
        let pulse_us = pulse_width_us(axis.pulse_ns);
        self.delays_ns.iter().scan(0u64, move |clock, delay| {
            *clock += delay;
            Some(PulseEvent {
                time_ns: *clock,
                axis: axis.id,
                gpio: axis.step_gpio,
                pulse_us,
            })
        })
    }
}

/// HIGH width in whole microseconds, at least one.
pub(crate) fn pulse_width_us(pulse_ns: u32) -> u32 {
    ((pulse_ns + 500) / 1_000).max(1)
}

/// Split a coordinated step sequence into per-axis timelines.
///
/// Steps for an axis missing from `axes` are not represented.
pub fn timelines_from_steps<I>(steps: I, axes: &[WaveAxis]) -> Vec<AxisTimeline>
where
    I: IntoIterator<Item = StepEvent>,
{
    let mut timelines: Vec<AxisTimeline> = axes.iter().copied().map(AxisTimeline::new).collect();
    let mut last_edge: Vec<u64> = alloc::vec![0; timelines.len()];
    let mut clock: u64 = 0;

    for step in steps {
        let Some(slot) = timelines.iter().position(|t| t.axis.id == step.axis) else {
            continue;
        };
        clock += u64::from(step.delay_ns) + u64::from(timelines[slot].axis.pulse_ns);
        timelines[slot].delays_ns.push(clock - last_edge[slot]);
        last_edge[slot] = clock;
    }

    timelines
}

/// Merge timelines into one chronological event list.
///
/// Ties are broken X before Y.
pub fn merge_timelines(timelines: &[AxisTimeline]) -> Vec<PulseEvent> {
    let mut events: Vec<PulseEvent> = timelines.iter().flat_map(AxisTimeline::events).collect();
    events.sort_by_key(|e| (e.time_ns, e.axis));
    events
}

/// Order in which a merged list visits the axes.
pub fn axis_order(events: &[PulseEvent]) -> Vec<AxisId> {
    events.iter().map(|e| e.axis).collect()
}
