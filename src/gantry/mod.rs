//! Dual-axis gantry coordination.
//!
//! Synchronizes both axes along straight lines, tracks positions, homes,
//! drives the electromagnet and handles emergency stops.

mod builder;
mod controller;
mod status;

pub use builder::GantryBuilder;
pub use controller::{Gantry, HomingSettings};
pub use status::{GantryStatus, HomingReport, MoveSummary, TimingMode};
