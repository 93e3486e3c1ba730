//! Coordinated move type-state markers.
//!
//! Uses Rust's type system to enforce that a move is validated before its
//! directions are set, and armed before it can produce pulses.

/// Bounds and enable checks passed; no pin has been touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validated;

/// Direction outputs are set; the move is ready to execute.
#[derive(Debug, Clone, Copy)]
pub struct Armed;

/// Trait for move states.
pub trait MoveState: private::Sealed {}

impl MoveState for Validated {}
impl MoveState for Armed {}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Validated {}
    impl Sealed for super::Armed {}
}

/// State name for display/debugging.
pub trait StateName {
    /// Get the state name as a static string.
    fn name() -> &'static str;
}

impl StateName for Validated {
    fn name() -> &'static str {
        "Validated"
    }
}

impl StateName for Armed {
    fn name() -> &'static str {
        "Armed"
    }
}
