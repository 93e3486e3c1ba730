//! Example: a complete gantry session on simulated hardware.
//!
//! This example demonstrates how to:
//! - Build both axes and the electromagnet from a TOML configuration
//! - Home the gantry and move a piece between two squares
//! - Stream the same move as pulse waves through a recording daemon
//!
//! Run with: `cargo run --example simulated_gantry --features std`

use gantry_motion::{
    axis::{Axis, AxisBuilder, AxisId},
    config::{parse_config, GantryConfig},
    error::{ConfigError, Error, Result},
    gantry::GantryBuilder,
    magnet::Electromagnet,
    sim::{SimDelay, SimEndstop, SimPin, SimWaveTransport, Trigger},
    wave::PulseTrainGenerator,
};

const CONFIG: &str = r#"
[axes.x]
step_pin = 17
dir_pin = 18
home_pin = 23
enable_pin = 5
step_pulse_us = 5

[axes.y]
step_pin = 27
dir_pin = 22
home_pin = 24
enable_pin = 6
step_pulse_us = 5

[board]
square_size_mm = 31.0
steps_per_mm = 40.0

[electromagnet]
pin = 25

[wave]
max_pulses_per_wave = 600
"#;

type SimAxis = Axis<SimPin, SimPin, SimPin, SimEndstop, SimDelay>;

/// Build an axis whose endstop closes after `home_pulses` homing pulses.
fn build_axis(config: &GantryConfig, id: AxisId, home_pulses: u32) -> Result<SimAxis> {
    let step = SimPin::new();
    let endstop = SimEndstop::new(Trigger::AfterPulses(step.probe(), home_pulses));

    AxisBuilder::new(id)
        .from_gantry_config(config)?
        .step_pin(step)
        .dir_pin(SimPin::new())
        .enable_pin(SimPin::new())
        .home_pin(endstop)
        .delay(SimDelay::new())
        .build()
}

/// Centre of a board square in steps.
fn square(col: i64, row: i64) -> (i64, i64) {
    let pitch = 31 * 40;
    (col * pitch + pitch / 2, row * pitch + pitch / 2)
}

fn main() -> Result<()> {
    println!("=== Simulated Gantry Example ===\n");

    let config = parse_config(CONFIG)?;
    println!(
        "Travel limits: X {} steps, Y {} steps",
        config.max_position(AxisId::X).unwrap_or_default(),
        config.max_position(AxisId::Y).unwrap_or_default()
    );

    let magnet_config = config
        .electromagnet
        .as_ref()
        .ok_or(Error::Config(ConfigError::MissingField("electromagnet")))?;

    // Software-timed gantry
    let mut gantry = GantryBuilder::new()
        .from_config(&config)
        .x_axis(build_axis(&config, AxisId::X, 120)?)
        .y_axis(build_axis(&config, AxisId::Y, 80)?)
        .magnet(Electromagnet::from_config(SimPin::new(), magnet_config)?)
        .build()?;

    let report = gantry.home()?;
    println!(
        "Homed after {} X and {} Y steps",
        report.x_steps, report.y_steps
    );

    // e2 -> e4
    let (from, to) = (square(4, 1), square(4, 3));
    gantry.move_to(from.0, from.1)?;
    gantry.magnet_on()?;
    let summary = gantry.move_to(to.0, to.1)?;
    gantry.magnet_off()?;
    println!(
        "Moved piece {:?} -> {:?} ({} X / {} Y steps, {:?} timing)",
        summary.from, summary.to, summary.x_steps, summary.y_steps, summary.timing
    );

    // Hardware-timed gantry against a recording daemon
    let daemon = SimWaveTransport::new();
    let generator = PulseTrainGenerator::from_config(daemon.clone(), SimDelay::new(), &config.wave);
    let mut gantry = GantryBuilder::new()
        .from_config(&config)
        .x_axis(build_axis(&config, AxisId::X, 0)?)
        .y_axis(build_axis(&config, AxisId::Y, 0)?)
        .wave_executor(generator)
        .build()?;

    gantry.home()?;
    let (target_x, target_y) = square(7, 7);
    let summary = gantry.move_to(target_x, target_y)?;
    let log = daemon.log();
    println!(
        "Diagonal to h8: {} X / {} Y steps streamed in {} waves",
        summary.x_steps,
        summary.y_steps,
        log.waves.len()
    );

    println!("\nFinal status: {:?}", gantry.status());
    Ok(())
}
