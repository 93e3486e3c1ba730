//! Error types for gantry-motion.
//!
//! Provides unified error handling across configuration, axis control,
//! coordinated motion and hardware wave generation.

use core::fmt;

use crate::axis::AxisId;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all gantry-motion operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Single-axis operation error
    Axis(AxisError),
    /// Coordinated motion error
    Motion(MotionError),
    /// Pulse daemon transport error
    Wave(WaveError),
    /// GPIO operation failed
    Pin(PinError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Invalid microstep value (must be power of 2: 1, 2, 4, 8, 16, 32, 64, 128, 256)
    InvalidMicrosteps(u16),
    /// A required builder field was not provided
    MissingField(&'static str),
    /// Axis travel limit is missing, zero or too large
    InvalidMaxPosition {
        /// Axis the limit belongs to
        axis: AxisId,
        /// Offending value (0 when unresolved)
        value: i64,
    },
    /// Step delay range is empty or zero
    InvalidStepDelays {
        /// Minimum (cruise) delay in microseconds
        min_us: u32,
        /// Maximum (start/stop) delay in microseconds
        max_us: u32,
    },
    /// Step pulse width must be > 0
    InvalidPulseWidth(u32),
    /// Diagonal factor must be in (0, 1]
    InvalidDiagonalFactor(f32),
    /// Wave chunk size outside the daemon's supported range
    InvalidChunkSize(usize),
    /// GPIO number outside the wave-capable bank (0-31)
    InvalidPin(u8),
    /// The same GPIO is assigned twice
    PinConflict(u8),
    /// Board geometry cannot produce a travel limit
    InvalidBoardGeometry,
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Single-axis errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisError {
    /// Requested position would leave `[0, max_position]`
    OutOfBounds {
        /// Axis that would leave its travel range
        axis: AxisId,
        /// Requested absolute position
        target: i64,
        /// Axis travel limit
        max: i64,
    },
    /// Axis driver output is disabled
    Disabled(AxisId),
    /// Endstop never triggered within the travel limit
    HomingTimeout {
        /// Axis being homed
        axis: AxisId,
        /// Pulses emitted before giving up
        steps: u32,
    },
}

/// Coordinated motion errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Absolute move requested before the axis was homed
    NotHomed(AxisId),
}

/// Pulse daemon transport errors.
#[derive(Debug, Clone, PartialEq)]
pub enum WaveError {
    /// Daemon connection was reset mid-stream
    ConnectionReset,
    /// No connection to the daemon
    NotConnected,
    /// Other I/O failure
    Io(heapless::String<64>),
    /// Daemon returned a negative status for a command
    Command {
        /// Command number
        command: u32,
        /// Daemon error code
        code: i32,
    },
}

/// GPIO failures, tagged with the pin's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinError {
    /// STEP output
    Step(AxisId),
    /// DIR output
    Direction(AxisId),
    /// ENABLE output
    Enable(AxisId),
    /// Endstop input
    Endstop(AxisId),
    /// Electromagnet output
    Magnet,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Axis(e) => write!(f, "Axis error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
            Error::Wave(e) => write!(f, "Pulse daemon error: {}", e),
            Error::Pin(e) => write!(f, "GPIO error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidMicrosteps(v) => {
                write!(f, "Invalid microsteps: {}. Valid values: 1, 2, 4, 8, 16, 32, 64, 128, 256", v)
            }
            ConfigError::MissingField(name) => write!(f, "{} is required", name),
            ConfigError::InvalidMaxPosition { axis, value } => {
                write!(f, "Invalid max position for {} axis: {}", axis, value)
            }
            ConfigError::InvalidStepDelays { min_us, max_us } => write!(
                f,
                "Invalid step delays: min ({}us) must be > 0 and <= max ({}us)",
                min_us, max_us
            ),
            ConfigError::InvalidPulseWidth(v) => write!(f, "Invalid step pulse width: {}us. Must be > 0", v),
            ConfigError::InvalidDiagonalFactor(v) => {
                write!(f, "Invalid diagonal factor: {}. Must be in (0, 1]", v)
            }
            ConfigError::InvalidChunkSize(v) => {
                write!(f, "Invalid max pulses per wave: {}. Must be 3-12000", v)
            }
            ConfigError::InvalidPin(pin) => write!(f, "Invalid GPIO {}. Must be 0-31", pin),
            ConfigError::PinConflict(pin) => write!(f, "GPIO {} is assigned more than once", pin),
            ConfigError::InvalidBoardGeometry => write!(f, "Board geometry yields no usable travel limit"),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for AxisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisError::OutOfBounds { axis, target, max } => {
                write!(f, "{} target {} out of bounds (0-{})", axis, target, max)
            }
            AxisError::Disabled(axis) => {
                write!(f, "{} motor is disabled. Enable motor before moving", axis)
            }
            AxisError::HomingTimeout { axis, steps } => write!(
                f,
                "{} homing failed: limit switch not triggered after {} steps. Check endstop wiring and position",
                axis, steps
            ),
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::NotHomed(axis) => {
                write!(f, "{} axis must be homed before moving to a position", axis)
            }
        }
    }
}

impl fmt::Display for WaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveError::ConnectionReset => write!(f, "connection reset by daemon"),
            WaveError::NotConnected => write!(f, "not connected to pulse daemon"),
            WaveError::Io(msg) => write!(f, "I/O error: {}", msg),
            WaveError::Command { command, code } => {
                write!(f, "command {} failed with code {}", command, code)
            }
        }
    }
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinError::Step(axis) => write!(f, "{} STEP pin write failed", axis),
            PinError::Direction(axis) => write!(f, "{} DIR pin write failed", axis),
            PinError::Enable(axis) => write!(f, "{} ENABLE pin write failed", axis),
            PinError::Endstop(axis) => write!(f, "{} endstop read failed", axis),
            PinError::Magnet => write!(f, "electromagnet pin write failed"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<AxisError> for Error {
    fn from(e: AxisError) -> Self {
        Error::Axis(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

impl From<WaveError> for Error {
    fn from(e: WaveError) -> Self {
        Error::Wave(e)
    }
}

impl From<PinError> for Error {
    fn from(e: PinError) -> Self {
        Error::Pin(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for AxisError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}

#[cfg(feature = "std")]
impl std::error::Error for WaveError {}

#[cfg(feature = "std")]
impl std::error::Error for PinError {}

#[cfg(feature = "std")]
impl From<std::io::Error> for WaveError {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match e.kind() {
            ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof => WaveError::ConnectionReset,
            ErrorKind::NotConnected => WaveError::NotConnected,
            _ => {
                let mut msg = heapless::String::<64>::new();
                for c in e.to_string().chars() {
                    if msg.push(c).is_err() {
                        break;
                    }
                }
                WaveError::Io(msg)
            }
        }
    }
}
