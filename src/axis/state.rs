//! Axis identity, bookkeeping and status snapshots.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AxisError;

/// Gantry axis identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "lowercase")]
pub enum AxisId {
    /// Horizontal axis (board files).
    X,
    /// Vertical axis (board ranks).
    Y,
}

impl AxisId {
    /// Both axes, in homing order.
    pub const ALL: [AxisId; 2] = [AxisId::X, AxisId::Y];

    /// Name as a static string.
    pub fn as_str(self) -> &'static str {
        match self {
            AxisId::X => "X",
            AxisId::Y => "Y",
        }
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position and flags of one axis.
///
/// While `is_homed` holds, `0 <= current_position <= max_position`. The
/// position is reset to zero exactly when homing succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisState {
    current_position: i64,
    max_position: i64,
    is_homed: bool,
    invert_direction: bool,
    is_enabled: bool,
    step_delay_ns: u32,
    step_pulse_ns: u32,
}

impl AxisState {
    pub(crate) fn new(
        max_position: i64,
        invert_direction: bool,
        step_delay_ns: u32,
        step_pulse_ns: u32,
    ) -> Self {
        Self {
            current_position: 0,
            max_position: max_position.max(0),
            is_homed: false,
            invert_direction,
            is_enabled: true,
            step_delay_ns,
            step_pulse_ns: step_pulse_ns.max(1),
        }
    }

    /// Current absolute position in steps.
    #[inline]
    pub fn current_position(&self) -> i64 {
        self.current_position
    }

    /// Upper travel limit in steps.
    #[inline]
    pub fn max_position(&self) -> i64 {
        self.max_position
    }

    /// Whether the position is referenced to the endstop.
    #[inline]
    pub fn is_homed(&self) -> bool {
        self.is_homed
    }

    /// Whether the DIR level is inverted.
    #[inline]
    pub fn invert_direction(&self) -> bool {
        self.invert_direction
    }

    /// Whether the driver output stage is enabled.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    /// Delay after each pulse for single-axis moves, in nanoseconds.
    #[inline]
    pub fn step_delay_ns(&self) -> u32 {
        self.step_delay_ns
    }

    /// STEP pulse width in nanoseconds.
    #[inline]
    pub fn step_pulse_ns(&self) -> u32 {
        self.step_pulse_ns
    }

    /// Whether `target` lies in `[0, max_position]`.
    #[inline]
    pub fn in_bounds(&self, target: i64) -> bool {
        (0..=self.max_position).contains(&target)
    }

    /// Reject `target` if it leaves the travel range.
    pub fn check_target(&self, axis: AxisId, target: i64) -> Result<(), AxisError> {
        if self.in_bounds(target) {
            Ok(())
        } else {
            Err(AxisError::OutOfBounds {
                axis,
                target,
                max: self.max_position,
            })
        }
    }

    pub(crate) fn set_position(&mut self, position: i64) {
        self.current_position = position;
        if !self.in_bounds(position) {
            self.is_homed = false;
        }
    }

    pub(crate) fn advance(&mut self, sign: i64) {
        self.current_position += sign;
    }

    pub(crate) fn mark_homed(&mut self) {
        self.current_position = 0;
        self.is_homed = true;
    }

    pub(crate) fn invalidate_home(&mut self) {
        self.is_homed = false;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.is_enabled = enabled;
    }

    /// Snapshot for reporting.
    pub fn status(&self) -> AxisStatus {
        AxisStatus {
            position: self.current_position,
            max_position: self.max_position,
            is_homed: self.is_homed,
            direction_inverted: self.invert_direction,
            is_enabled: self.is_enabled,
        }
    }
}

/// Serializable per-axis status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisStatus {
    /// Current position in steps.
    pub position: i64,
    /// Travel limit in steps.
    pub max_position: i64,
    /// Whether the axis has been homed.
    pub is_homed: bool,
    /// Whether the DIR level is inverted.
    pub direction_inverted: bool,
    /// Whether the driver is enabled.
    pub is_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_unhomed_at_origin() {
        let state = AxisState::new(1000, false, 2_000_000, 1_000_000);
        assert_eq!(state.current_position(), 0);
        assert!(!state.is_homed());
        assert!(state.is_enabled());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let state = AxisState::new(1000, false, 1, 1);
        assert!(state.in_bounds(0));
        assert!(state.in_bounds(1000));
        assert!(!state.in_bounds(-1));
        assert_eq!(
            state.check_target(AxisId::X, 1001),
            Err(AxisError::OutOfBounds {
                axis: AxisId::X,
                target: 1001,
                max: 1000
            })
        );
    }

    #[test]
    fn test_mark_homed_resets_position() {
        let mut state = AxisState::new(1000, false, 1, 1);
        state.set_position(420);
        state.mark_homed();
        assert_eq!(state.current_position(), 0);
        assert!(state.is_homed());

        state.invalidate_home();
        assert!(!state.is_homed());
    }

    #[test]
    fn test_out_of_range_position_clears_homing() {
        let mut state = AxisState::new(1000, false, 1, 1);
        state.mark_homed();

        state.set_position(1000);
        assert!(state.is_homed());

        state.set_position(1001);
        assert_eq!(state.current_position(), 1001);
        assert!(!state.is_homed());
    }

    #[test]
    fn test_axis_id_display() {
        assert_eq!(AxisId::X.to_string(), "X");
        assert!(AxisId::X < AxisId::Y);
    }
}
