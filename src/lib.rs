//! # gantry-motion
//!
//! Coordinated two-axis stepper gantry control with embedded-hal 1.0 support.
//!
//! ## Features
//!
//! - **Configuration-driven**: Calibrate pins, ramps and travel limits in TOML
//! - **embedded-hal 1.0**: Uses `OutputPin` for STEP/DIR/ENABLE, `InputPin` for endstops, `DelayNs` for timing
//! - **no_std compatible**: Core library works without standard library
//! - **Straight diagonals**: Bresenham interleaving with per-axis velocity ramps
//! - **Hardware timing**: Offload pulse trains to pigpiod, with software fallback
//! - **Type-state safety**: A move must be validated before it can drive outputs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gantry_motion::{AxisBuilder, AxisId, GantryBuilder};
//!
//! // Load configuration from TOML
//! let config = gantry_motion::load_config("gantry.toml")?;
//!
//! // Create axes with embedded-hal pins
//! let x = AxisBuilder::new(AxisId::X)
//!     .from_gantry_config(&config)?
//!     .step_pin(x_step)
//!     .dir_pin(x_dir)
//!     .home_pin(x_home)
//!     .delay(delay.clone())
//!     .build()?;
//!
//! let mut gantry = GantryBuilder::new()
//!     .from_config(&config)
//!     .x_axis(x)
//!     .y_axis(y)
//!     .build()?;
//!
//! gantry.home()?;
//! gantry.move_to(4960, 1240)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables TOML loading, the pigpiod transport and the simulator
//! - `alloc`: Enables the pulse-train generator for no_std with allocator
//! - `defmt`: Enables defmt formatting for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod axis;
pub mod config;
pub mod error;
pub mod gantry;
pub mod hal;
pub mod magnet;
pub mod motion;
#[cfg(feature = "std")]
pub mod sim;
pub mod wave;

// Re-exports for ergonomic API
pub use axis::{Axis, AxisBuilder, AxisId, AxisStatus, StepperAxis};
pub use config::{validate_config, GantryConfig};
pub use error::{Error, Result};
pub use gantry::{Gantry, GantryBuilder, GantryStatus, MoveSummary};
pub use magnet::Electromagnet;
pub use motion::{calculate_step_delay, Direction, MotionPhase, VelocityProfile};
pub use wave::{PulseWaveTransport, SoftwareTimed, WaveExecutor};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

#[cfg(feature = "alloc")]
pub use wave::PulseTrainGenerator;

#[cfg(feature = "std")]
pub use wave::PigpioTransport;

// Unit types
pub use config::units::{Microseconds, Microsteps, Steps};
