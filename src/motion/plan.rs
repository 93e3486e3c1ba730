//! Coordinated move planning.
//!
//! A [`CoordinatedMove`] goes `Validated -> Armed`, then executes and is
//! reconciled. Rejection only happens in [`CoordinatedMove::validate`], before
//! any output is driven.

use core::marker::PhantomData;

use crate::axis::{AxisHooks, AxisId, AxisState, StepperAxis};
use crate::error::{AxisError, Result};

use super::line::{LineSteps, StepTiming};
use super::profile::Direction;
use super::state::{Armed, MoveState, StateName, Validated};

/// One axis's share of a coordinated move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisLeg {
    /// Position before the move.
    pub start: i64,
    /// Validated target position.
    pub target: i64,
    /// Step count (magnitude of `target - start`).
    pub steps: u32,
    /// Travel direction.
    pub direction: Direction,
}

impl AxisLeg {
    fn plan(axis: AxisId, state: &AxisState, delta: i64) -> Result<Self> {
        let start = state.current_position();
        let out_of_bounds = |target| AxisError::OutOfBounds {
            axis,
            target,
            max: state.max_position(),
        };

        let target = start
            .checked_add(delta)
            .ok_or_else(|| out_of_bounds(if delta > 0 { i64::MAX } else { i64::MIN }))?;
        state.check_target(axis, target)?;

        let steps = u32::try_from(delta.unsigned_abs()).map_err(|_| out_of_bounds(target))?;
        if steps > 0 && !state.is_enabled() {
            return Err(AxisError::Disabled(axis).into());
        }

        Ok(Self {
            start,
            target,
            steps,
            direction: Direction::from_delta(delta),
        })
    }

    /// Whether this axis moves at all.
    #[inline]
    pub fn moves(&self) -> bool {
        self.steps > 0
    }

    /// Position after `done` of `steps` pulses.
    #[inline]
    pub fn reached(&self, done: u32) -> i64 {
        self.start + self.direction.sign() * i64::from(done.min(self.steps))
    }
}

/// A coordinated two-axis move in state `S`.
#[derive(Debug, Clone, Copy)]
pub struct CoordinatedMove<S: MoveState> {
    x: AxisLeg,
    y: AxisLeg,
    _state: PhantomData<S>,
}

impl<S: MoveState + StateName> CoordinatedMove<S> {
    /// X leg.
    #[inline]
    pub fn x(&self) -> &AxisLeg {
        &self.x
    }

    /// Y leg.
    #[inline]
    pub fn y(&self) -> &AxisLeg {
        &self.y
    }

    /// Leg for an axis.
    pub fn leg(&self, axis: AxisId) -> &AxisLeg {
        match axis {
            AxisId::X => &self.x,
            AxisId::Y => &self.y,
        }
    }

    /// Validated target `(x, y)`.
    #[inline]
    pub fn target(&self) -> (i64, i64) {
        (self.x.target, self.y.target)
    }

    /// Whether neither axis moves.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.x.moves() && !self.y.moves()
    }

    /// Total pulses over both axes.
    #[inline]
    pub fn total_steps(&self) -> u64 {
        u64::from(self.x.steps) + u64::from(self.y.steps)
    }

    /// Get the current state name.
    #[inline]
    pub fn state_name(&self) -> &'static str {
        S::name()
    }
}

impl CoordinatedMove<Validated> {
    /// Check a relative move against both axes at once.
    ///
    /// Either both targets are inside `[0, max_position]` and every moving
    /// axis is enabled, or the move is rejected as a whole.
    pub fn validate(x: &AxisState, y: &AxisState, dx: i64, dy: i64) -> Result<Self> {
        let x = AxisLeg::plan(AxisId::X, x, dx)?;
        let y = AxisLeg::plan(AxisId::Y, y, dy)?;
        Ok(Self {
            x,
            y,
            _state: PhantomData,
        })
    }

    /// Set DIR on every moving axis.
    pub fn arm<X, Y>(self, x_axis: &mut X, y_axis: &mut Y) -> Result<CoordinatedMove<Armed>>
    where
        X: StepperAxis,
        Y: StepperAxis,
    {
        if self.x.moves() {
            x_axis.set_direction(self.x.direction)?;
        }
        if self.y.moves() {
            y_axis.set_direction(self.y.direction)?;
        }
        Ok(CoordinatedMove {
            x: self.x,
            y: self.y,
            _state: PhantomData,
        })
    }
}

impl CoordinatedMove<Armed> {
    /// The pulse sequence for this move.
    pub fn line(&self, timing: StepTiming) -> LineSteps {
        LineSteps::new(self.x.steps, self.y.steps, timing)
    }

    /// Force both positions to the validated target.
    pub fn reconcile<X, Y>(self, x_axis: &mut X, y_axis: &mut Y)
    where
        X: StepperAxis,
        Y: StepperAxis,
    {
        AxisHooks::set_position(x_axis, self.x.target);
        AxisHooks::set_position(y_axis, self.y.target);
    }
}
