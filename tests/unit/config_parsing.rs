//! Unit tests for TOML configuration parsing.

use gantry_motion::axis::AxisId;
use gantry_motion::config::{load_config, parse_config, GantryConfig};
use gantry_motion::error::{ConfigError, Error};
use gantry_motion::Direction;

const MINIMAL: &str = r#"
[axes.x]
step_pin = 17
dir_pin = 18
home_pin = 23
max_position = 12000

[axes.y]
step_pin = 27
dir_pin = 22
home_pin = 24
max_position = 9000
"#;

/// Test parsing the two axis tables with defaults filled in.
#[test]
fn test_parse_axis_config() {
    let config: GantryConfig = toml::from_str(MINIMAL).expect("Failed to parse TOML");
    let x = config.axis(AxisId::X);

    assert_eq!(x.step_pin, 17);
    assert_eq!(x.dir_pin, 18);
    assert_eq!(x.home_pin, 23);
    assert_eq!(x.enable_pin, None);
    assert!(!x.invert_direction);
    assert!(x.endstop_active_low);
    assert!(x.enable_active_low);
    assert_eq!(x.step_delay.value(), 2_000);
    assert_eq!(x.step_pulse.value(), 1_000);
    assert_eq!(x.home_direction, Direction::Negative);

    assert_eq!(config.max_position(AxisId::X), Some(12_000));
    assert_eq!(config.max_position(AxisId::Y), Some(9_000));
}

/// Test that omitted sections take their documented defaults.
#[test]
fn test_section_defaults() {
    let config: GantryConfig = toml::from_str(MINIMAL).expect("Failed to parse TOML");

    assert_eq!(config.motion.min_step_delay.value(), 800);
    assert_eq!(config.motion.max_step_delay.value(), 4_000);
    assert_eq!(config.motion.accel_steps, 300);
    assert!(config.motion.enable_acceleration);
    assert!((config.motion.diagonal_factor - 0.7).abs() < f32::EPSILON);

    assert_eq!(config.homing.step_delay.value(), 5_000);

    assert!(config.wave.enabled);
    assert_eq!(config.wave.host.as_str(), "localhost");
    assert_eq!(config.wave.port, 8888);
    assert_eq!(config.wave.max_pulses_per_wave, 3_000);

    assert!(config.electromagnet.is_none());
    assert!(config.board.is_none());
}

/// Test parsing every optional section.
#[test]
fn test_parse_full_config() {
    let toml_str = r#"
[axes.x]
step_pin = 17
dir_pin = 18
home_pin = 23
enable_pin = 5
invert_direction = true
max_position = 40000
step_delay_us = 1500
step_pulse_us = 10
endstop_active_low = false
home_direction = "positive"

[axes.y]
step_pin = 27
dir_pin = 22
home_pin = 24
max_position = 40000

[motion]
min_step_delay_us = 600
max_step_delay_us = 3000
accel_steps = 150
enable_acceleration = false
diagonal_factor = 0.5

[homing]
step_delay_us = 7000

[electromagnet]
pin = 25
active_high = false

[wave]
enabled = false
host = "raspberrypi.local"
port = 8889
max_pulses_per_wave = 600
busy_poll_us = 250
timeout_ms = 500
"#;

    let config = parse_config(toml_str).expect("Config should be valid");
    let x = config.axis(AxisId::X);

    assert_eq!(x.enable_pin, Some(5));
    assert!(x.invert_direction);
    assert_eq!(x.step_delay.value(), 1_500);
    assert_eq!(x.step_pulse.value(), 10);
    assert!(!x.endstop_active_low);
    assert_eq!(x.home_direction, Direction::Positive);

    assert_eq!(config.motion.accel_steps, 150);
    assert!(!config.motion.enable_acceleration);
    assert_eq!(config.homing.step_delay.value(), 7_000);

    let magnet = config.electromagnet.as_ref().expect("magnet section");
    assert_eq!(magnet.pin, 25);
    assert!(!magnet.active_high);

    assert!(!config.wave.enabled);
    assert_eq!(config.wave.host.as_str(), "raspberrypi.local");
    assert_eq!(config.wave.port, 8889);
    assert_eq!(config.wave.busy_poll.value(), 250);
    assert_eq!(config.wave.timeout_ms, 500);
}

/// Test that a board section supplies limits the axis tables leave out.
#[test]
fn test_board_derived_limits() {
    let toml_str = r#"
[axes.x]
step_pin = 17
dir_pin = 18
home_pin = 23

[axes.y]
step_pin = 27
dir_pin = 22
home_pin = 24
max_position = 20000

[board]
square_size_mm = 31.0

[board.drive]
steps_per_revolution = 200
microsteps = 16
mm_per_revolution = 20.0
"#;

    let config = parse_config(toml_str).expect("Config should be valid");

    // 8 squares * 31 mm * 160 steps/mm + 1000 margin
    assert_eq!(config.max_position(AxisId::X), Some(40_680));
    // Explicit limits win.
    assert_eq!(config.max_position(AxisId::Y), Some(20_000));
}

/// Test that an invalid microstep value is rejected while parsing.
#[test]
fn test_invalid_microsteps_rejected() {
    let toml_str = r#"
[axes.x]
step_pin = 17
dir_pin = 18
home_pin = 23

[axes.y]
step_pin = 27
dir_pin = 22
home_pin = 24

[board]
square_size_mm = 31.0

[board.drive]
steps_per_revolution = 200
microsteps = 12
mm_per_revolution = 20.0
"#;

    match parse_config(toml_str) {
        Err(Error::Config(ConfigError::ParseError(msg))) => {
            assert!(msg.as_str().contains("microsteps"), "message was {}", msg);
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

/// Test that a missing axis table is a parse error.
#[test]
fn test_missing_axis_table() {
    let toml_str = r#"
[axes.x]
step_pin = 17
dir_pin = 18
home_pin = 23
max_position = 1000
"#;

    assert!(matches!(
        parse_config(toml_str),
        Err(Error::Config(ConfigError::ParseError(_)))
    ));
}

/// Test loading from a file on disk.
#[test]
fn test_load_config_from_file() {
    let path = std::env::temp_dir().join(format!("gantry-motion-{}.toml", std::process::id()));
    std::fs::write(&path, MINIMAL).expect("write temp config");

    let config = load_config(&path).expect("Config should load");
    std::fs::remove_file(&path).ok();

    assert_eq!(config.axis(AxisId::Y).step_pin, 27);
}

/// Test that a missing file reports an I/O error.
#[test]
fn test_load_config_missing_file() {
    let result = load_config("/nonexistent/gantry.toml");
    assert!(matches!(result, Err(Error::Config(ConfigError::IoError(_)))));
}
