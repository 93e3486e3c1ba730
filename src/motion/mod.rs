//! Motion module for gantry-motion.
//!
//! Provides the velocity ramp, the Bresenham step sequence and the
//! type-state coordinated move that both execution paths share.

mod line;
mod plan;
mod profile;
pub mod state;

pub use line::{LineSteps, StepEvent, StepTiming};
pub use plan::{AxisLeg, CoordinatedMove};
pub use profile::{calculate_step_delay, Direction, MotionPhase, VelocityProfile};
pub use state::{Armed, Validated};
