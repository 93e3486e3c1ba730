//! Coordinated two-axis step sequencing.
//!
//! [`LineSteps`] walks a straight line from the origin to `(dx, dy)` with
//! Bresenham's integer error term and yields one [`StepEvent`] per pulse, in
//! the order the pulses must be emitted. Both the software-timed and the
//! hardware-timed execution paths consume this one sequence.

use crate::axis::AxisId;
use crate::config::MotionConfig;

use super::profile::VelocityProfile;

/// One step pulse of a coordinated move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEvent {
    /// Axis that steps.
    pub axis: AxisId,
    /// Index of this step within the axis's own step count.
    pub index: u32,
    /// Delay after the pulse, in nanoseconds.
    pub delay_ns: u32,
}

/// Per-step delay policy for coordinated moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepTiming {
    /// Ramp parameters.
    pub profile: VelocityProfile,
    /// When false every step uses the cruise delay.
    pub accelerate: bool,
    /// Multiplier applied to both axes' delays when both axes move.
    pub diagonal_factor: f32,
}

impl StepTiming {
    /// Create a timing policy.
    ///
    /// A `diagonal_factor` outside `(0, 1]`, or NaN, is replaced by `1.0`.
    pub fn new(profile: VelocityProfile, accelerate: bool, diagonal_factor: f32) -> Self {
        let diagonal_factor = if diagonal_factor > 0.0 && diagonal_factor <= 1.0 {
            diagonal_factor
        } else {
            1.0
        };
        Self {
            profile,
            accelerate,
            diagonal_factor,
        }
    }

    /// Build from the `[motion]` configuration section.
    pub fn from_config(config: &MotionConfig) -> Self {
        Self::new(
            VelocityProfile::from_config(config),
            config.enable_acceleration,
            config.diagonal_factor,
        )
    }

    /// Delay for step `index` of an axis moving `total` steps.
    pub fn delay_ns(&self, index: u32, total: u32, diagonal: bool) -> u32 {
        let base = if self.accelerate {
            self.profile.delay_at(index, total)
        } else {
            self.profile.min_delay_ns
        };

        if diagonal {
            scale(base, self.diagonal_factor)
        } else {
            base
        }
    }
}

fn scale(delay_ns: u32, factor: f32) -> u32 {
    let scaled = libm::round(f64::from(delay_ns) * f64::from(factor));
    if scaled.is_nan() || scaled < 1.0 {
        1
    } else if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Iterator over the pulses of a coordinated straight-line move.
///
/// The axis with more steps dominates (Y on a tie) and pulses once per
/// iteration; the minor axis pulses right after the dominant one whenever
/// the error term goes negative. The minor axis steps exactly
/// `min(|dx|, |dy|)` times.
#[derive(Debug, Clone)]
pub struct LineSteps {
    timing: StepTiming,
    dominant: AxisId,
    dominant_total: u32,
    minor_total: u32,
    dominant_index: u32,
    minor_index: u32,
    error: i64,
    minor_pending: bool,
    diagonal: bool,
}

impl LineSteps {
    /// Plan a line of `dx` X-steps and `dy` Y-steps (magnitudes).
    pub fn new(dx: u32, dy: u32, timing: StepTiming) -> Self {
        let (dominant, dominant_total, minor_total) = if dx > dy {
            (AxisId::X, dx, dy)
        } else {
            (AxisId::Y, dy, dx)
        };

        Self {
            timing,
            dominant,
            dominant_total,
            minor_total,
            dominant_index: 0,
            minor_index: 0,
            error: i64::from(dominant_total / 2),
            minor_pending: false,
            diagonal: dx > 0 && dy > 0,
        }
    }

    /// Axis that pulses on every iteration.
    #[inline]
    pub fn dominant_axis(&self) -> AxisId {
        self.dominant
    }

    /// Whether both axes move.
    #[inline]
    pub fn is_diagonal(&self) -> bool {
        self.diagonal
    }

    /// Total steps for one axis over the whole line.
    pub fn total_for(&self, axis: AxisId) -> u32 {
        if axis == self.dominant {
            self.dominant_total
        } else {
            self.minor_total
        }
    }

    fn minor(&self) -> AxisId {
        match self.dominant {
            AxisId::X => AxisId::Y,
            AxisId::Y => AxisId::X,
        }
    }
}

impl Iterator for LineSteps {
    type Item = StepEvent;

    fn next(&mut self) -> Option<StepEvent> {
        if self.minor_pending {
            self.minor_pending = false;
            let index = self.minor_index;
            self.minor_index += 1;
            return Some(StepEvent {
                axis: self.minor(),
                index,
                delay_ns: self.timing.delay_ns(index, self.minor_total, self.diagonal),
            });
        }

        if self.dominant_index >= self.dominant_total {
            return None;
        }

        let index = self.dominant_index;
        self.dominant_index += 1;

        self.error -= i64::from(self.minor_total);
        if self.error < 0 {
            self.error += i64::from(self.dominant_total);
            self.minor_pending = true;
        }

        Some(StepEvent {
            axis: self.dominant,
            index,
            delay_ns: self.timing.delay_ns(index, self.dominant_total, self.diagonal),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.dominant_total - self.dominant_index) as usize
            + (self.minor_total - self.minor_index) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LineSteps {}
