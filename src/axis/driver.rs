//! Single stepper axis driver.
//!
//! Generic over embedded-hal 1.0 pin types. The axis owns its STEP, DIR and
//! optional ENABLE outputs, its endstop input and a delay provider.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::{AxisError, Error, PinError, Result};
use crate::motion::Direction;

use super::state::{AxisId, AxisState, AxisStatus};

/// Daemon GPIO numbers of an axis, needed for hardware-timed moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisGpio {
    /// BCM number of the STEP output.
    pub step: u8,
    /// BCM number of the DIR output.
    pub dir: u8,
}

pub(crate) mod hooks {
    /// Position bookkeeping reserved for the gantry coordinator.
    pub trait AxisHooks {
        /// Overwrite the position counter.
        ///
        /// A position outside `[0, max_position]` also clears the homed flag.
        fn set_position(&mut self, position: i64);

        /// Clear the homed flag.
        fn invalidate_home(&mut self);
    }
}

/// Operations the gantry needs from an axis.
///
/// Implemented by [`Axis`]; the coordinator is generic over it so each axis
/// keeps its own concrete pin types. The position counter is only changed by
/// the axis's own motion operations and the gantry; callers cannot overwrite
/// it:
///
/// ```rust,compile_fail
/// use gantry_motion::axis::{AxisBuilder, AxisId, StepperAxis};
/// use gantry_motion::sim::{SimDelay, SimEndstop, SimPin, Trigger};
///
/// let mut axis = AxisBuilder::new(AxisId::X)
///     .max_position(100)
///     .step_pin(SimPin::new())
///     .dir_pin(SimPin::new())
///     .home_pin(SimEndstop::new(Trigger::Always))
///     .delay(SimDelay::new())
///     .build()
///     .unwrap();
/// axis.set_position(5_000);
/// ```
pub trait StepperAxis: hooks::AxisHooks {
    /// Axis identifier.
    fn id(&self) -> AxisId;

    /// Position and flags.
    fn state(&self) -> &AxisState;

    /// GPIO numbers for the pulse daemon, if known.
    fn gpio(&self) -> Option<AxisGpio>;

    /// Drive DIR for a logical direction.
    fn set_direction(&mut self, direction: Direction) -> Result<()>;

    /// One STEP pulse followed by `delay_ns` of idle time.
    ///
    /// Does not touch the position counter.
    fn pulse(&mut self, delay_ns: u32) -> Result<()>;

    /// Force STEP low.
    fn force_step_low(&mut self) -> Result<()>;

    /// Seek the endstop. Returns the number of pulses taken.
    fn home(&mut self, direction: Direction, step_delay_ns: u32) -> Result<u32>;
}

/// Stepper axis driver.
///
/// Generic over:
/// - `STEP`: STEP pin type (must implement `OutputPin`)
/// - `DIR`: DIR pin type (must implement `OutputPin`)
/// - `EN`: ENABLE pin type (`OutputPin`; use [`crate::hal::NoPin`] when absent)
/// - `HOME`: endstop input (must implement `InputPin`)
/// - `DELAY`: Delay provider (must implement `DelayNs`)
pub struct Axis<STEP, DIR, EN, HOME, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    HOME: InputPin,
    DELAY: DelayNs,
{
    id: AxisId,
    step_pin: STEP,
    dir_pin: DIR,
    enable_pin: EN,
    home_pin: HOME,
    delay: DELAY,
    state: AxisState,
    gpio: Option<AxisGpio>,

    /// Current direction (cached to avoid unnecessary pin writes).
    current_direction: Option<Direction>,

    endstop_active_low: bool,
    enable_active_low: bool,
}

impl<STEP, DIR, EN, HOME, DELAY> Axis<STEP, DIR, EN, HOME, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    HOME: InputPin,
    DELAY: DelayNs,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: AxisId,
        step_pin: STEP,
        dir_pin: DIR,
        enable_pin: EN,
        home_pin: HOME,
        delay: DELAY,
        state: AxisState,
        gpio: Option<AxisGpio>,
        endstop_active_low: bool,
        enable_active_low: bool,
    ) -> Result<Self> {
        let mut axis = Self {
            id,
            step_pin,
            dir_pin,
            enable_pin,
            home_pin,
            delay,
            state,
            gpio,
            current_direction: None,
            endstop_active_low,
            enable_active_low,
        };
        axis.step_pin.set_low().map_err(|_| PinError::Step(id))?;
        axis.enable()?;
        Ok(axis)
    }

    /// Get the axis identifier.
    #[inline]
    pub fn id(&self) -> AxisId {
        self.id
    }

    /// Current position in steps.
    #[inline]
    pub fn position(&self) -> i64 {
        self.state.current_position()
    }

    /// Position and flags.
    #[inline]
    pub fn state(&self) -> &AxisState {
        &self.state
    }

    /// Status snapshot.
    pub fn status(&self) -> AxisStatus {
        self.state.status()
    }

    /// Read the endstop, honouring its polarity.
    pub fn endstop_pressed(&mut self) -> Result<bool> {
        let pressed = if self.endstop_active_low {
            self.home_pin.is_low()
        } else {
            self.home_pin.is_high()
        };
        pressed.map_err(|_| Error::Pin(PinError::Endstop(self.id)))
    }

    /// Enable the driver output stage.
    pub fn enable(&mut self) -> Result<()> {
        self.write_enable(true)?;
        self.state.set_enabled(true);
        Ok(())
    }

    /// Disable the driver output stage (motor can be turned by hand).
    pub fn disable(&mut self) -> Result<()> {
        self.write_enable(false)?;
        self.state.set_enabled(false);
        Ok(())
    }

    fn write_enable(&mut self, enabled: bool) -> Result<()> {
        let high = enabled != self.enable_active_low;
        let result = if high {
            self.enable_pin.set_high()
        } else {
            self.enable_pin.set_low()
        };
        result.map_err(|_| Error::Pin(PinError::Enable(self.id)))
    }

    /// Move `steps` in `direction` at the axis's own step delay.
    ///
    /// # Errors
    ///
    /// `Disabled` or `OutOfBounds` are returned before any pulse is emitted.
    pub fn move_steps(&mut self, steps: u32, direction: Direction) -> Result<()> {
        if !self.state.is_enabled() {
            return Err(AxisError::Disabled(self.id).into());
        }

        let target = self.state.current_position() + direction.sign() * i64::from(steps);
        self.state.check_target(self.id, target)?;

        if steps == 0 {
            return Ok(());
        }

        self.set_direction(direction)?;
        let delay_ns = self.state.step_delay_ns();
        for _ in 0..steps {
            self.pulse(delay_ns)?;
            self.state.advance(direction.sign());
        }

        log::debug!("{} axis moved {} steps to {}", self.id, steps, target);
        Ok(())
    }

    /// Move to an absolute position on this axis alone.
    pub fn move_to_position(&mut self, target: i64) -> Result<()> {
        self.state.check_target(self.id, target)?;

        let delta = target - self.state.current_position();
        let steps = u32::try_from(delta.unsigned_abs()).map_err(|_| AxisError::OutOfBounds {
            axis: self.id,
            target,
            max: self.state.max_position(),
        })?;
        self.move_steps(steps, Direction::from_delta(delta))
    }

    /// Drive STEP low immediately.
    pub fn emergency_stop(&mut self) -> Result<()> {
        log::warn!("{} axis emergency stop", self.id);
        self.force_step_low()
    }

    /// Release the hardware resources.
    pub fn into_parts(self) -> (STEP, DIR, EN, HOME, DELAY) {
        (
            self.step_pin,
            self.dir_pin,
            self.enable_pin,
            self.home_pin,
            self.delay,
        )
    }
}

impl<STEP, DIR, EN, HOME, DELAY> hooks::AxisHooks for Axis<STEP, DIR, EN, HOME, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    HOME: InputPin,
    DELAY: DelayNs,
{
    fn set_position(&mut self, position: i64) {
        self.state.set_position(position);
    }

    fn invalidate_home(&mut self) {
        self.state.invalidate_home();
    }
}

impl<STEP, DIR, EN, HOME, DELAY> StepperAxis for Axis<STEP, DIR, EN, HOME, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    HOME: InputPin,
    DELAY: DelayNs,
{
    fn id(&self) -> AxisId {
        self.id
    }

    fn state(&self) -> &AxisState {
        &self.state
    }

    fn gpio(&self) -> Option<AxisGpio> {
        self.gpio
    }

    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        if self.current_direction == Some(direction) {
            return Ok(());
        }

        let result = if direction.pin_level(self.state.invert_direction()) {
            self.dir_pin.set_high()
        } else {
            self.dir_pin.set_low()
        };
        result.map_err(|_| Error::Pin(PinError::Direction(self.id)))?;

        self.current_direction = Some(direction);
        Ok(())
    }

    fn pulse(&mut self, delay_ns: u32) -> Result<()> {
        self.step_pin
            .set_high()
            .map_err(|_| Error::Pin(PinError::Step(self.id)))?;
        self.delay.delay_ns(self.state.step_pulse_ns());
        self.step_pin
            .set_low()
            .map_err(|_| Error::Pin(PinError::Step(self.id)))?;
        self.delay.delay_ns(delay_ns);
        Ok(())
    }

    fn force_step_low(&mut self) -> Result<()> {
        self.step_pin
            .set_low()
            .map_err(|_| Error::Pin(PinError::Step(self.id)))
    }

    fn home(&mut self, direction: Direction, step_delay_ns: u32) -> Result<u32> {
        self.state.invalidate_home();

        if !self.state.is_enabled() {
            return Err(AxisError::Disabled(self.id).into());
        }

        self.set_direction(direction)?;

        let ceiling = u32::try_from(self.state.max_position()).unwrap_or(u32::MAX);
        for taken in 0..ceiling {
            if self.endstop_pressed()? {
                self.state.mark_homed();
                log::info!("{} axis homed after {} steps", self.id, taken);
                return Ok(taken);
            }
            self.pulse(step_delay_ns)?;
        }

        log::warn!(
            "{} axis homing failed: endstop not triggered after {} steps",
            self.id,
            ceiling
        );
        Err(AxisError::HomingTimeout {
            axis: self.id,
            steps: ceiling,
        }
        .into())
    }
}
