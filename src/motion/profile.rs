//! Velocity profile calculation.
//!
//! Provides the trapezoidal speed ramp shared by every motion path. The ramp
//! is linear in *velocity* space (constant acceleration), so the per-step
//! delay is the reciprocal of a linearly interpolated speed.

use serde::{Deserialize, Serialize};

use crate::config::MotionConfig;

/// Direction of axis motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards `max_position` (step count increases).
    Positive,
    /// Towards the homing switch (step count decreases).
    #[default]
    Negative,
}

impl Direction {
    /// Get direction from a signed step delta. Zero maps to `Negative`.
    #[inline]
    pub fn from_delta(delta: i64) -> Self {
        if delta > 0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Direction::Positive => 1,
            Direction::Negative => -1,
        }
    }

    /// Physical DIR level: HIGH for `Positive` unless inverted.
    #[inline]
    pub fn pin_level(self, inverted: bool) -> bool {
        (self == Direction::Positive) != inverted
    }
}

/// Phase of the ramp a step falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    /// Accelerating from rest toward cruise velocity.
    Accelerating,
    /// Moving at constant cruise velocity.
    Cruising,
    /// Decelerating from cruise velocity to rest.
    Decelerating,
    /// Index is past the end of the move.
    Complete,
}

/// Delay (ns) before step `step_index` of a `total_steps` move.
///
/// The ramp window is `min(accel_steps, total_steps / 2)`. Inside the leading
/// window speed rises linearly from `1 / max_delay_ns` to `1 / min_delay_ns`;
/// the trailing window mirrors it, so indices `i` and `total_steps - 1 - i`
/// always return the same delay. The result is clamped into
/// `[min_delay_ns, max_delay_ns]` and is never zero.
pub fn calculate_step_delay(
    step_index: u32,
    total_steps: u32,
    min_delay_ns: u32,
    max_delay_ns: u32,
    accel_steps: u32,
) -> u32 {
    let min_delay = min_delay_ns.max(1);
    let max_delay = max_delay_ns.max(min_delay);

    if step_index >= total_steps {
        return max_delay;
    }

    let window = accel_steps.min(total_steps / 2);
    let ramp_index = if step_index < window {
        step_index
    } else if step_index >= total_steps - window {
        total_steps - 1 - step_index
    } else {
        return min_delay;
    };

    let min_speed = 1.0 / f64::from(max_delay);
    let max_speed = 1.0 / f64::from(min_delay);
    let ratio = f64::from(ramp_index) / f64::from(window);
    let speed = min_speed + (max_speed - min_speed) * ratio;

    let delay = libm::round(1.0 / speed);
    if delay <= f64::from(min_delay) {
        min_delay
    } else if delay >= f64::from(max_delay) {
        max_delay
    } else {
        delay as u32
    }
}

/// Ramp parameters for one motion configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VelocityProfile {
    /// Cruise (shortest) delay in nanoseconds.
    pub min_delay_ns: u32,
    /// Start/stop (longest) delay in nanoseconds.
    pub max_delay_ns: u32,
    /// Requested ramp length in steps.
    pub accel_steps: u32,
}

impl VelocityProfile {
    /// Create a profile. Delays are normalized so `1 <= min <= max`.
    pub fn new(min_delay_ns: u32, max_delay_ns: u32, accel_steps: u32) -> Self {
        let min_delay_ns = min_delay_ns.max(1);
        Self {
            min_delay_ns,
            max_delay_ns: max_delay_ns.max(min_delay_ns),
            accel_steps,
        }
    }

    /// Build from the `[motion]` configuration section.
    pub fn from_config(config: &MotionConfig) -> Self {
        Self::new(
            config.min_step_delay.as_nanos(),
            config.max_step_delay.as_nanos(),
            config.accel_steps,
        )
    }

    /// Effective ramp window for a move of `total_steps`.
    #[inline]
    pub fn ramp_window(&self, total_steps: u32) -> u32 {
        self.accel_steps.min(total_steps / 2)
    }

    /// Delay before step `step_index` of a `total_steps` move.
    #[inline]
    pub fn delay_at(&self, step_index: u32, total_steps: u32) -> u32 {
        calculate_step_delay(
            step_index,
            total_steps,
            self.min_delay_ns,
            self.max_delay_ns,
            self.accel_steps,
        )
    }

    /// Get the phase at a given step number.
    pub fn phase_at(&self, step_index: u32, total_steps: u32) -> MotionPhase {
        let window = self.ramp_window(total_steps);
        if step_index >= total_steps {
            MotionPhase::Complete
        } else if step_index < window {
            MotionPhase::Accelerating
        } else if step_index >= total_steps - window {
            MotionPhase::Decelerating
        } else {
            MotionPhase::Cruising
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: u32 = 800_000;
    const MAX: u32 = 4_000_000;

    #[test]
    fn test_ramp_starts_and_ends_at_max_delay() {
        assert_eq!(calculate_step_delay(0, 1000, MIN, MAX, 300), MAX);
        assert_eq!(calculate_step_delay(999, 1000, MIN, MAX, 300), MAX);
    }

    #[test]
    fn test_cruise_at_min_delay() {
        assert_eq!(calculate_step_delay(300, 1000, MIN, MAX, 300), MIN);
        assert_eq!(calculate_step_delay(500, 1000, MIN, MAX, 300), MIN);
        assert_eq!(calculate_step_delay(699, 1000, MIN, MAX, 300), MIN);
    }

    #[test]
    fn test_ramp_is_monotonic() {
        let mut previous = u32::MAX;
        for i in 0..300 {
            let delay = calculate_step_delay(i, 1000, MIN, MAX, 300);
            assert!(delay <= previous, "delay rose at step {}", i);
            previous = delay;
        }
    }

    #[test]
    fn test_velocity_is_linear_in_ramp() {
        // Halfway through the window speed is the mean of both ends.
        let delay = calculate_step_delay(150, 1000, MIN, MAX, 300);
        let expected = 1.0 / ((1.0 / MAX as f64 + 1.0 / MIN as f64) / 2.0);
        assert!((delay as f64 - expected).abs() <= 1.0);
    }

    #[test]
    fn test_short_move_shrinks_window() {
        let profile = VelocityProfile::new(MIN, MAX, 300);
        assert_eq!(profile.ramp_window(100), 50);
        assert_eq!(profile.phase_at(49, 100), MotionPhase::Accelerating);
        assert_eq!(profile.phase_at(50, 100), MotionPhase::Decelerating);
        assert_eq!(profile.phase_at(100, 100), MotionPhase::Complete);
    }

    #[test]
    fn test_single_step_move() {
        // Window is zero: no ramp, cruise speed.
        assert_eq!(calculate_step_delay(0, 1, MIN, MAX, 300), MIN);
    }

    #[test]
    fn test_zero_accel_steps_is_flat() {
        for i in 0..10 {
            assert_eq!(calculate_step_delay(i, 10, MIN, MAX, 0), MIN);
        }
    }

    #[test]
    fn test_inverted_bounds_are_normalized() {
        let profile = VelocityProfile::new(0, 0, 10);
        assert_eq!(profile.min_delay_ns, 1);
        assert_eq!(profile.max_delay_ns, 1);
        assert_eq!(profile.delay_at(0, 100), 1);
    }

    #[test]
    fn test_direction_from_delta() {
        assert_eq!(Direction::from_delta(5), Direction::Positive);
        assert_eq!(Direction::from_delta(-5), Direction::Negative);
        assert_eq!(Direction::Positive.sign(), 1);
        assert!(Direction::Positive.pin_level(false));
        assert!(Direction::Negative.pin_level(true));
    }

    #[test]
    fn test_direction_deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            dir: Direction,
        }
        let w: Wrapper = toml::from_str("dir = \"positive\"").unwrap();
        assert_eq!(w.dir, Direction::Positive);
    }
}
