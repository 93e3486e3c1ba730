//! Configuration module for gantry-motion.
//!
//! Provides types for loading and validating gantry calibration from TOML
//! files (with `std` feature) or pre-parsed data.

mod axis;
mod board;
mod magnet;
mod motion;
mod system;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;
mod wave;

pub use axis::{AxisConfig, DEFAULT_STEP_DELAY_US, DEFAULT_STEP_PULSE_US};
pub use board::{BoardGeometry, DriveTrain};
pub use magnet::ElectromagnetConfig;
pub use motion::{
    HomingConfig, MotionConfig, DEFAULT_ACCEL_STEPS, DEFAULT_DIAGONAL_FACTOR,
    DEFAULT_HOME_STEP_DELAY_US, DEFAULT_MAX_STEP_DELAY_US, DEFAULT_MIN_STEP_DELAY_US,
};
pub use system::{AxesConfig, GantryConfig};
pub use validation::validate_config;
pub use wave::{
    WaveConfig, DAEMON_MAX_PULSES_PER_WAVE, DEFAULT_DAEMON_PORT, DEFAULT_MAX_PULSES_PER_WAVE,
    MAX_WAVE_GPIO,
};

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Microseconds, Microsteps, Millimeters, Steps};
