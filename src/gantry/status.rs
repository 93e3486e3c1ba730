//! Gantry status and move reports.

use serde::Serialize;

use crate::axis::AxisStatus;
use crate::magnet::ElectromagnetStatus;

/// How coordinated moves are timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingMode {
    /// Blocking sleeps between pulses.
    Software,
    /// Pulse daemon waves.
    Hardware,
}

/// Serializable snapshot of the whole gantry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GantryStatus {
    /// X axis.
    pub x_axis: AxisStatus,
    /// Y axis.
    pub y_axis: AxisStatus,
    /// Electromagnet, when one is fitted.
    pub electromagnet: Option<ElectromagnetStatus>,
    /// Active timing path.
    pub timing: TimingMode,
}

/// Result of a coordinated move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveSummary {
    /// Position before the move.
    pub from: (i64, i64),
    /// Position after the move.
    pub to: (i64, i64),
    /// X pulses emitted.
    pub x_steps: u32,
    /// Y pulses emitted.
    pub y_steps: u32,
    /// Timing path used.
    pub timing: TimingMode,
    /// Daemon reconnects during the move.
    pub reconnects: u32,
}

impl MoveSummary {
    pub(crate) fn idle(at: (i64, i64), timing: TimingMode) -> Self {
        Self {
            from: at,
            to: at,
            x_steps: 0,
            y_steps: 0,
            timing,
            reconnects: 0,
        }
    }
}

/// Pulses taken by each axis while homing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HomingReport {
    /// X pulses before the endstop triggered.
    pub x_steps: u32,
    /// Y pulses before the endstop triggered.
    pub y_steps: u32,
}
