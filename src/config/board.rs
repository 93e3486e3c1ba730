//! Travel limits derived from board geometry.
//!
//! Axis limits can be given directly in steps, or derived from the board
//! size plus a safety margin. The derivation is computed once at startup.

use serde::Deserialize;

use super::units::{Microsteps, Millimeters, Steps};
use crate::axis::AxisId;

/// Motor and transmission parameters used to derive steps per millimetre.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveTrain {
    /// Base steps per revolution (200 for 1.8° motors).
    pub steps_per_revolution: u16,

    /// Microstep setting of the driver.
    pub microsteps: Microsteps,

    /// Carriage travel per motor revolution (belt pitch × pulley teeth, or lead).
    pub mm_per_revolution: f32,
}

impl DriveTrain {
    /// Steps per millimetre of carriage travel.
    pub fn steps_per_mm(&self) -> f32 {
        self.steps_per_revolution as f32 * self.microsteps.value() as f32 / self.mm_per_revolution
    }
}

/// Chess board dimensions and margins.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardGeometry {
    /// Edge length of one square.
    #[serde(rename = "square_size_mm")]
    pub square_size: Millimeters,

    /// Number of rows (Y direction).
    #[serde(default = "default_squares")]
    pub rows: u8,

    /// Number of columns (X direction).
    #[serde(default = "default_squares")]
    pub cols: u8,

    /// Extra travel beyond the board edge.
    #[serde(default = "default_margin")]
    pub margin_steps: i64,

    /// Lower bound for a derived limit.
    #[serde(default = "default_min_travel")]
    pub min_travel_steps: i64,

    /// Steps per millimetre, if known directly.
    #[serde(default)]
    pub steps_per_mm: Option<f32>,

    /// Drive train, used when `steps_per_mm` is absent.
    #[serde(default)]
    pub drive: Option<DriveTrain>,
}

fn default_squares() -> u8 {
    8
}

fn default_margin() -> i64 {
    1_000
}

fn default_min_travel() -> i64 {
    5_000
}

impl BoardGeometry {
    /// Effective steps per millimetre (explicit value wins over the drive train).
    pub fn steps_per_mm(&self) -> Option<f32> {
        self.steps_per_mm
            .or_else(|| self.drive.as_ref().map(DriveTrain::steps_per_mm))
            .filter(|v| v.is_finite() && *v > 0.0)
    }

    /// Board width (columns) in steps.
    pub fn width_steps(&self) -> Option<Steps> {
        self.span_steps(self.cols)
    }

    /// Board height (rows) in steps.
    pub fn height_steps(&self) -> Option<Steps> {
        self.span_steps(self.rows)
    }

    /// Derived travel limit for an axis: board span plus margin, never below
    /// `min_travel_steps`.
    pub fn max_position(&self, axis: AxisId) -> Option<i64> {
        let span = match axis {
            AxisId::X => self.width_steps()?,
            AxisId::Y => self.height_steps()?,
        };
        Some(core::cmp::max(self.min_travel_steps, span.value() + self.margin_steps))
    }

    fn span_steps(&self, squares: u8) -> Option<Steps> {
        let steps_per_mm = self.steps_per_mm()?;
        if self.square_size.value() <= 0.0 {
            return None;
        }
        let span = Millimeters(squares as f32 * self.square_size.value());
        Some(Steps::from_mm(span, steps_per_mm))
    }
}
