//! Dual-axis coordinator.
//!
//! Owns both axes, the optional electromagnet and the optional wave executor.
//! Every motion call is blocking and takes `&mut self`.

use embedded_hal::digital::OutputPin;

use crate::axis::{AxisHooks, AxisId, StepperAxis};
use crate::config::{GantryConfig, DEFAULT_HOME_STEP_DELAY_US};
use crate::error::{ConfigError, Error, MotionError, Result, WaveError};
use crate::magnet::Electromagnet;
use crate::motion::{CoordinatedMove, Direction, LineSteps, StepTiming, Validated};
use crate::wave::{WaveAxis, WaveExecutor};

use super::status::{GantryStatus, HomingReport, MoveSummary, TimingMode};

/// Homing directions and speed used by [`Gantry::home`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomingSettings {
    /// X seek direction.
    pub x_direction: Direction,
    /// Y seek direction.
    pub y_direction: Direction,
    /// Delay after each homing pulse, in nanoseconds.
    pub step_delay_ns: u32,
}

impl Default for HomingSettings {
    fn default() -> Self {
        Self {
            x_direction: Direction::Negative,
            y_direction: Direction::Negative,
            step_delay_ns: DEFAULT_HOME_STEP_DELAY_US * 1_000,
        }
    }
}

impl HomingSettings {
    /// Read homing directions and speed from configuration.
    pub fn from_config(config: &GantryConfig) -> Self {
        Self {
            x_direction: config.axes.x.home_direction,
            y_direction: config.axes.y.home_direction,
            step_delay_ns: config.homing.step_delay.as_nanos(),
        }
    }
}

/// Two-axis gantry with an optional electromagnet.
///
/// Generic over:
/// - `X`, `Y`: the axes (usually [`crate::axis::Axis`])
/// - `M`: electromagnet output pin
/// - `W`: hardware wave executor ([`crate::wave::SoftwareTimed`] when absent)
pub struct Gantry<X, Y, M, W>
where
    X: StepperAxis,
    Y: StepperAxis,
    M: OutputPin,
    W: WaveExecutor,
{
    x: X,
    y: Y,
    magnet: Option<Electromagnet<M>>,
    wave: Option<W>,
    timing: StepTiming,
    homing: HomingSettings,
}

struct SoftwareFailure {
    error: Error,
    x_done: u32,
    y_done: u32,
}

enum ExecutionFailure {
    Hardware(WaveError),
    Software(SoftwareFailure),
}

impl<X, Y, M, W> Gantry<X, Y, M, W>
where
    X: StepperAxis,
    Y: StepperAxis,
    M: OutputPin,
    W: WaveExecutor,
{
    pub(crate) fn new(
        x: X,
        y: Y,
        magnet: Option<Electromagnet<M>>,
        wave: Option<W>,
        timing: StepTiming,
        homing: HomingSettings,
    ) -> Self {
        Self {
            x,
            y,
            magnet,
            wave,
            timing,
            homing,
        }
    }

    /// X axis.
    #[inline]
    pub fn x(&self) -> &X {
        &self.x
    }

    /// Y axis.
    #[inline]
    pub fn y(&self) -> &Y {
        &self.y
    }

    /// Mutable X axis, for single-axis operations.
    #[inline]
    pub fn x_mut(&mut self) -> &mut X {
        &mut self.x
    }

    /// Mutable Y axis, for single-axis operations.
    #[inline]
    pub fn y_mut(&mut self) -> &mut Y {
        &mut self.y
    }

    /// Step timing used for coordinated moves.
    #[inline]
    pub fn timing(&self) -> &StepTiming {
        &self.timing
    }

    /// Active timing path.
    pub fn timing_mode(&self) -> TimingMode {
        if self.wave.is_some() {
            TimingMode::Hardware
        } else {
            TimingMode::Software
        }
    }

    /// Remove the wave executor; later moves use software timing.
    pub fn take_wave_executor(&mut self) -> Option<W> {
        let wave = self.wave.take();
        if wave.is_some() {
            log::warn!("hardware timing disabled; falling back to software timing");
        }
        wave
    }

    /// Current `(x, y)` in steps.
    pub fn position(&self) -> (i64, i64) {
        (
            self.x.state().current_position(),
            self.y.state().current_position(),
        )
    }

    /// Snapshot of both axes, the magnet and the timing path.
    pub fn status(&self) -> GantryStatus {
        GantryStatus {
            x_axis: self.x.state().status(),
            y_axis: self.y.state().status(),
            electromagnet: self.magnet.as_ref().map(Electromagnet::status),
            timing: self.timing_mode(),
        }
    }

    /// Home X, then Y.
    ///
    /// Y is not attempted when X fails.
    pub fn home_all(
        &mut self,
        x_direction: Direction,
        y_direction: Direction,
        step_delay_ns: u32,
    ) -> Result<HomingReport> {
        log::info!("homing X axis");
        let x_steps = self.x.home(x_direction, step_delay_ns)?;
        log::info!("homing Y axis");
        let y_steps = self.y.home(y_direction, step_delay_ns)?;
        Ok(HomingReport { x_steps, y_steps })
    }

    /// Home both axes with the configured directions and speed.
    pub fn home(&mut self) -> Result<HomingReport> {
        let settings = self.homing;
        self.home_all(
            settings.x_direction,
            settings.y_direction,
            settings.step_delay_ns,
        )
    }

    /// Move to an absolute position. Both axes must be homed.
    pub fn move_to(&mut self, x: i64, y: i64) -> Result<MoveSummary> {
        for axis in AxisId::ALL {
            let homed = match axis {
                AxisId::X => self.x.state().is_homed(),
                AxisId::Y => self.y.state().is_homed(),
            };
            if !homed {
                return Err(MotionError::NotHomed(axis).into());
            }
        }

        let (cx, cy) = self.position();
        self.move_relative(x.saturating_sub(cx), y.saturating_sub(cy))
    }

    /// Move by `(dx, dy)` steps along a straight line.
    ///
    /// Both targets are checked before any output is driven; an invalid
    /// target on either axis rejects the whole move.
    pub fn move_relative(&mut self, dx: i64, dy: i64) -> Result<MoveSummary> {
        let plan = CoordinatedMove::validate(self.x.state(), self.y.state(), dx, dy)?;
        let from = self.position();
        let timing = self.timing_mode();

        if plan.is_empty() {
            return Ok(MoveSummary::idle(from, timing));
        }

        let wave_axes = if self.wave.is_some() {
            Some(self.wave_axes(&plan)?)
        } else {
            None
        };

        log::debug!(
            "move ({}, {}) -> ({}, {}) via {:?}",
            from.0,
            from.1,
            plan.target().0,
            plan.target().1,
            timing
        );

        let armed = plan.arm(&mut self.x, &mut self.y)?;
        let steps = armed.line(self.timing);

        let outcome = match (self.wave.as_mut(), wave_axes) {
            (Some(wave), Some((axes, count))) => wave
                .execute(steps, &axes[..count])
                .map(|report| report.reconnects)
                .map_err(ExecutionFailure::Hardware),
            _ => run_software(&mut self.x, &mut self.y, steps)
                .map(|()| 0)
                .map_err(ExecutionFailure::Software),
        };

        let reconnects = match outcome {
            Ok(reconnects) => reconnects,
            Err(ExecutionFailure::Hardware(e)) => {
                log::warn!("hardware move failed, re-home required: {}", e);
                self.invalidate_homing();
                return Err(e.into());
            }
            Err(ExecutionFailure::Software(failure)) => {
                AxisHooks::set_position(&mut self.x, armed.x().reached(failure.x_done));
                AxisHooks::set_position(&mut self.y, armed.y().reached(failure.y_done));
                log::warn!("software move failed, re-home required: {}", failure.error);
                self.invalidate_homing();
                return Err(failure.error);
            }
        };

        let summary = MoveSummary {
            from,
            to: armed.target(),
            x_steps: armed.x().steps,
            y_steps: armed.y().steps,
            timing,
            reconnects,
        };
        armed.reconcile(&mut self.x, &mut self.y);
        Ok(summary)
    }

    /// Visit each waypoint with [`move_to`](Self::move_to).
    ///
    /// Stops at the first failing waypoint. Returns the number reached.
    pub fn follow_path(&mut self, waypoints: &[(i64, i64)]) -> Result<usize> {
        for (i, &(x, y)) in waypoints.iter().enumerate() {
            if let Err(e) = self.move_to(x, y) {
                log::warn!("path aborted at waypoint {} ({}, {}): {}", i, x, y, e);
                return Err(e);
            }
        }
        Ok(waypoints.len())
    }

    /// Energize the electromagnet. No-op without one.
    pub fn magnet_on(&mut self) -> Result<()> {
        match self.magnet.as_mut() {
            Some(magnet) => magnet.on(),
            None => {
                log::warn!("no electromagnet fitted; ignoring magnet_on");
                Ok(())
            }
        }
    }

    /// De-energize the electromagnet. No-op without one.
    pub fn magnet_off(&mut self) -> Result<()> {
        match self.magnet.as_mut() {
            Some(magnet) => magnet.off(),
            None => {
                log::warn!("no electromagnet fitted; ignoring magnet_off");
                Ok(())
            }
        }
    }

    /// Flip the electromagnet. No-op without one.
    pub fn magnet_toggle(&mut self) -> Result<()> {
        match self.magnet.as_mut() {
            Some(magnet) => magnet.toggle(),
            None => {
                log::warn!("no electromagnet fitted; ignoring magnet_toggle");
                Ok(())
            }
        }
    }

    /// STEP outputs low, magnet off, homing invalidated.
    ///
    /// Every action is attempted; the first error is returned.
    pub fn emergency_stop(&mut self) -> Result<()> {
        log::warn!("emergency stop");
        let x = self.x.force_step_low();
        let y = self.y.force_step_low();
        let magnet = match self.magnet.as_mut() {
            Some(magnet) => magnet.off(),
            None => Ok(()),
        };
        self.invalidate_homing();
        x.and(y).and(magnet)
    }

    /// Release the axes, magnet and executor.
    pub fn into_parts(self) -> (X, Y, Option<Electromagnet<M>>, Option<W>) {
        (self.x, self.y, self.magnet, self.wave)
    }

    fn invalidate_homing(&mut self) {
        AxisHooks::invalidate_home(&mut self.x);
        AxisHooks::invalidate_home(&mut self.y);
    }

    fn wave_axes(&self, plan: &CoordinatedMove<Validated>) -> Result<([WaveAxis; 2], usize)> {
        let mut axes = [WaveAxis {
            id: AxisId::X,
            step_gpio: 0,
            dir_gpio: 0,
            dir_level: false,
            pulse_ns: 0,
        }; 2];
        let mut count = 0;

        for id in AxisId::ALL {
            let leg = plan.leg(id);
            if !leg.moves() {
                continue;
            }
            let (gpio, state) = match id {
                AxisId::X => (self.x.gpio(), self.x.state()),
                AxisId::Y => (self.y.gpio(), self.y.state()),
            };
            let gpio = gpio.ok_or(Error::Config(ConfigError::MissingField("axis gpio")))?;
            axes[count] = WaveAxis {
                id,
                step_gpio: gpio.step,
                dir_gpio: gpio.dir,
                dir_level: leg.direction.pin_level(state.invert_direction()),
                pulse_ns: state.step_pulse_ns(),
            };
            count += 1;
        }

        Ok((axes, count))
    }
}

fn run_software<X, Y>(x: &mut X, y: &mut Y, steps: LineSteps) -> core::result::Result<(), SoftwareFailure>
where
    X: StepperAxis,
    Y: StepperAxis,
{
    let mut x_done = 0;
    let mut y_done = 0;

    for step in steps {
        let result = match step.axis {
            AxisId::X => x.pulse(step.delay_ns),
            AxisId::Y => y.pulse(step.delay_ns),
        };
        if let Err(error) = result {
            return Err(SoftwareFailure {
                error,
                x_done,
                y_done,
            });
        }
        match step.axis {
            AxisId::X => x_done += 1,
            AxisId::Y => y_done += 1,
        }
    }

    Ok(())
}
