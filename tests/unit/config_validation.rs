//! Unit tests for configuration validation.

use gantry_motion::axis::AxisId;
use gantry_motion::config::{parse_config, validate_config, GantryConfig};
use gantry_motion::error::{ConfigError, Error};

fn config_with(extra: &str) -> GantryConfig {
    let toml_str = format!(
        r#"
[axes.x]
step_pin = 17
dir_pin = 18
home_pin = 23
max_position = 1000

[axes.y]
step_pin = 27
dir_pin = 22
home_pin = 24
max_position = 1000

{}
"#,
        extra
    );
    toml::from_str(&toml_str).expect("Failed to parse TOML")
}

/// Test validation of a valid configuration.
#[test]
fn test_valid_config_passes_validation() {
    let config = config_with("[electromagnet]\npin = 25");
    assert!(validate_config(&config).is_ok());
}

/// Test that an axis without any travel limit is rejected.
#[test]
fn test_missing_travel_limit() {
    let toml_str = r#"
[axes.x]
step_pin = 17
dir_pin = 18
home_pin = 23

[axes.y]
step_pin = 27
dir_pin = 22
home_pin = 24
max_position = 1000
"#;

    assert_eq!(
        parse_config(toml_str).unwrap_err(),
        Error::Config(ConfigError::InvalidMaxPosition {
            axis: AxisId::X,
            value: 0
        })
    );
}

/// Test that a travel limit beyond the step counter range is rejected.
#[test]
fn test_oversized_travel_limit() {
    let mut config = config_with("");
    config.axes.y.max_position = Some(i64::from(u32::MAX) + 1);

    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidMaxPosition { axis: AxisId::Y, .. }))
    ));
}

/// Test that a zero pulse width is rejected.
#[test]
fn test_zero_pulse_width() {
    let mut config = config_with("");
    config.axes.x.step_pulse.0 = 0;

    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidPulseWidth(0)))
    );
}

/// Test validation fails for a zero cruise delay.
#[test]
fn test_zero_min_delay() {
    let config = config_with("[motion]\nmin_step_delay_us = 0");
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidStepDelays { min_us: 0, .. }))
    ));
}

/// Test that equal min and max delays are accepted (constant speed).
#[test]
fn test_equal_delays_accepted() {
    let config = config_with("[motion]\nmin_step_delay_us = 1000\nmax_step_delay_us = 1000");
    assert!(validate_config(&config).is_ok());
}

/// Test diagonal factor bounds.
#[test]
fn test_invalid_diagonal_factor() {
    let config = config_with("[motion]\ndiagonal_factor = 0.0");
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidDiagonalFactor(_)))
    ));

    let config = config_with("[motion]\ndiagonal_factor = 1.0");
    assert!(validate_config(&config).is_ok());
}

/// Test wave chunk size limits.
#[test]
fn test_chunk_size_limits() {
    let config = config_with("[wave]\nmax_pulses_per_wave = 2");
    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidChunkSize(2)))
    );

    let config = config_with("[wave]\nmax_pulses_per_wave = 12001");
    assert!(validate_config(&config).is_err());

    let config = config_with("[wave]\nmax_pulses_per_wave = 3");
    assert!(validate_config(&config).is_ok());
}

/// Test that a GPIO outside the wave bank is rejected.
#[test]
fn test_pin_out_of_range() {
    let config = config_with("[electromagnet]\npin = 40");
    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidPin(40)))
    );
}

/// Test that sharing a GPIO between roles is rejected.
#[test]
fn test_pin_conflict() {
    let config = config_with("[electromagnet]\npin = 18");
    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::PinConflict(18)))
    );
}

/// Test that board geometry without a scale leaves the limit unresolved.
#[test]
fn test_board_without_scale() {
    let mut config = config_with("[board]\nsquare_size_mm = 31.0");
    config.axes.x.max_position = None;

    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidMaxPosition { axis: AxisId::X, value: 0 }))
    ));
}
