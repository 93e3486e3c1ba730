//! Single stepper axis: pins, position bookkeeping, homing.

mod builder;
mod driver;
mod state;

pub use builder::AxisBuilder;
pub(crate) use builder::check_wave_gpio;
pub(crate) use driver::hooks::AxisHooks;
pub use driver::{Axis, AxisGpio, StepperAxis};
pub use state::{AxisId, AxisState, AxisStatus};
