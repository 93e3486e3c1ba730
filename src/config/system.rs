//! Gantry configuration - root configuration structure.

use serde::Deserialize;

use super::axis::AxisConfig;
use super::board::BoardGeometry;
use super::magnet::ElectromagnetConfig;
use super::motion::{HomingConfig, MotionConfig};
use super::wave::WaveConfig;
use crate::axis::AxisId;

/// The two axis tables.
#[derive(Debug, Clone, Deserialize)]
pub struct AxesConfig {
    /// Horizontal axis.
    pub x: AxisConfig,
    /// Vertical axis.
    pub y: AxisConfig,
}

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GantryConfig {
    /// Per-axis wiring and calibration.
    pub axes: AxesConfig,

    /// Velocity profile and diagonal tuning.
    #[serde(default)]
    pub motion: MotionConfig,

    /// Homing speed.
    #[serde(default)]
    pub homing: HomingConfig,

    /// Optional electromagnet.
    #[serde(default)]
    pub electromagnet: Option<ElectromagnetConfig>,

    /// Pulse daemon settings.
    #[serde(default)]
    pub wave: WaveConfig,

    /// Optional board geometry for derived travel limits.
    #[serde(default)]
    pub board: Option<BoardGeometry>,
}

impl GantryConfig {
    /// Get an axis configuration.
    pub fn axis(&self, axis: AxisId) -> &AxisConfig {
        match axis {
            AxisId::X => &self.axes.x,
            AxisId::Y => &self.axes.y,
        }
    }

    /// Resolved travel limit: explicit `max_position`, else board-derived.
    pub fn max_position(&self, axis: AxisId) -> Option<i64> {
        self.axis(axis)
            .max_position
            .or_else(|| self.board.as_ref().and_then(|b| b.max_position(axis)))
    }

    /// Every GPIO the configuration assigns, in declaration order.
    pub fn assigned_pins(&self) -> impl Iterator<Item = u8> + '_ {
        self.axes
            .x
            .pins()
            .chain(self.axes.y.pins())
            .chain(self.electromagnet.as_ref().map(|m| m.pin))
    }
}
