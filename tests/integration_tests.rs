//! Integration tests for gantry-motion.
//!
//! These tests drive a complete gantry, built from TOML, against the
//! simulated backend and an in-process fake pigpiod.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use gantry_motion::axis::{Axis, AxisBuilder, AxisId, StepperAxis};
use gantry_motion::config::{parse_config, GantryConfig};
use gantry_motion::error::{AxisError, ConfigError, Error, MotionError, WaveError};
use gantry_motion::gantry::{Gantry, GantryBuilder, TimingMode};
use gantry_motion::magnet::Electromagnet;
use gantry_motion::motion::{LineSteps, StepTiming};
use gantry_motion::sim::{PinProbe, SimDelay, SimEndstop, SimPin, SimWaveTransport, Trigger};
use gantry_motion::wave::{command, decode_pulses, PigpioTransport, Pulse, PulseTrainGenerator, SoftwareTimed};

// =============================================================================
// Test rig
// =============================================================================

const GANTRY_CONFIG: &str = r#"
[axes.x]
step_pin = 17
dir_pin = 18
home_pin = 23
enable_pin = 5
max_position = 1000
step_pulse_us = 5

[axes.y]
step_pin = 27
dir_pin = 22
home_pin = 24
enable_pin = 6
max_position = 1000
step_pulse_us = 5

[motion]
min_step_delay_us = 800
max_step_delay_us = 4000
accel_steps = 300

[electromagnet]
pin = 25

[wave]
max_pulses_per_wave = 300
"#;

type SimAxis = Axis<SimPin, SimPin, SimPin, SimEndstop, SimDelay>;
type SimGantry<W> = Gantry<SimAxis, SimAxis, SimPin, W>;

struct AxisProbes {
    step: PinProbe,
    dir: PinProbe,
    delay: SimDelay,
}

struct Rig<W: gantry_motion::WaveExecutor> {
    gantry: SimGantry<W>,
    x: AxisProbes,
    y: AxisProbes,
    magnet: PinProbe,
}

fn config() -> GantryConfig {
    parse_config(GANTRY_CONFIG).expect("rig config should parse")
}

fn sim_axis(config: &GantryConfig, id: AxisId, step: SimPin) -> (SimAxis, AxisProbes) {
    let dir = SimPin::new();
    let delay = SimDelay::new();
    let probes = AxisProbes {
        step: step.probe(),
        dir: dir.probe(),
        delay: delay.clone(),
    };

    let axis = AxisBuilder::new(id)
        .from_gantry_config(config)
        .unwrap()
        .step_pin(step)
        .dir_pin(dir)
        .enable_pin(SimPin::new())
        .home_pin(SimEndstop::new(Trigger::Always))
        .delay(delay)
        .build()
        .unwrap();
    (axis, probes)
}

fn software_rig_with(x_step: SimPin) -> Rig<SoftwareTimed> {
    let config = config();
    let (x, x_probes) = sim_axis(&config, AxisId::X, x_step);
    let (y, y_probes) = sim_axis(&config, AxisId::Y, SimPin::new());
    let magnet_pin = SimPin::new();
    let magnet_probe = magnet_pin.probe();
    let magnet = Electromagnet::from_config(magnet_pin, config.electromagnet.as_ref().unwrap()).unwrap();

    let gantry = GantryBuilder::new()
        .from_config(&config)
        .x_axis(x)
        .y_axis(y)
        .magnet(magnet)
        .build()
        .unwrap();

    Rig {
        gantry,
        x: x_probes,
        y: y_probes,
        magnet: magnet_probe,
    }
}

fn software_rig() -> Rig<SoftwareTimed> {
    software_rig_with(SimPin::new())
}

fn hardware_rig(transport: SimWaveTransport) -> Rig<PulseTrainGenerator<SimWaveTransport, SimDelay>> {
    let config = config();
    let (x, x_probes) = sim_axis(&config, AxisId::X, SimPin::new());
    let (y, y_probes) = sim_axis(&config, AxisId::Y, SimPin::new());
    let magnet_pin = SimPin::new();
    let magnet_probe = magnet_pin.probe();
    let magnet = Electromagnet::new(magnet_pin, true).unwrap();
    let generator = PulseTrainGenerator::from_config(transport, SimDelay::new(), &config.wave);

    let gantry = GantryBuilder::new()
        .from_config(&config)
        .x_axis(x)
        .y_axis(y)
        .magnet(magnet)
        .wave_executor(generator)
        .build()
        .unwrap();

    Rig {
        gantry,
        x: x_probes,
        y: y_probes,
        magnet: magnet_probe,
    }
}

fn edges_on(waves: &[Vec<Pulse>], gpio: u8) -> usize {
    decode_pulses(waves).iter().filter(|(_, g)| *g == gpio).count()
}

// =============================================================================
// Coordinated moves: software timing
// =============================================================================

#[test]
fn software_diagonal_reaches_target() {
    let mut rig = software_rig();
    rig.gantry.home().unwrap();

    let summary = rig.gantry.move_to(300, 100).unwrap();

    assert_eq!(rig.gantry.position(), (300, 100));
    assert_eq!(summary.to, (300, 100));
    assert_eq!(summary.timing, TimingMode::Software);
    assert_eq!(rig.x.step.rising_edges(), 300);
    assert_eq!(rig.y.step.rising_edges(), 100);
    assert!(!rig.x.step.is_high());
    assert!(!rig.y.step.is_high());
}

#[test]
fn software_delays_follow_each_axis_ramp() {
    let mut rig = software_rig();
    rig.gantry.home().unwrap();
    let x_before = rig.x.delay.elapsed_ns();
    let y_before = rig.y.delay.elapsed_ns();

    rig.gantry.move_to(300, 100).unwrap();

    let timing = StepTiming::from_config(&config().motion);
    let (mut x_expected, mut y_expected) = (0u64, 0u64);
    for step in LineSteps::new(300, 100, timing) {
        let total = u64::from(step.delay_ns) + 5_000;
        match step.axis {
            AxisId::X => x_expected += total,
            AxisId::Y => y_expected += total,
        }
    }

    assert_eq!(rig.x.delay.elapsed_ns() - x_before, x_expected);
    assert_eq!(rig.y.delay.elapsed_ns() - y_before, y_expected);
}

#[test]
fn diagonal_moves_are_faster_per_step() {
    let timing = StepTiming::from_config(&config().motion);
    let straight: u64 = LineSteps::new(300, 0, timing).map(|e| u64::from(e.delay_ns)).sum();
    let diagonal: u64 = LineSteps::new(300, 300, timing)
        .filter(|e| e.axis == AxisId::X)
        .map(|e| u64::from(e.delay_ns))
        .sum();

    let ratio = diagonal as f64 / straight as f64;
    assert!((ratio - 0.7).abs() < 0.001, "ratio was {}", ratio);
}

#[test]
fn zero_move_is_immediate() {
    let mut rig = software_rig();
    rig.gantry.home().unwrap();
    let dir_writes = rig.x.dir.writes();

    let summary = rig.gantry.move_relative(0, 0).unwrap();

    assert_eq!(summary.x_steps + summary.y_steps, 0);
    assert_eq!(rig.x.dir.writes(), dir_writes);
    assert_eq!(rig.x.step.rising_edges(), 0);
}

#[test]
fn out_of_bounds_rejects_both_axes() {
    let mut rig = software_rig();
    rig.gantry.home().unwrap();
    rig.gantry.move_to(500, 500).unwrap();
    let x_edges = rig.x.step.rising_edges();
    let y_edges = rig.y.step.rising_edges();
    let x_dir_writes = rig.x.dir.writes();

    let err = rig.gantry.move_relative(100, 600).unwrap_err();

    assert_eq!(
        err,
        Error::Axis(AxisError::OutOfBounds {
            axis: AxisId::Y,
            target: 1100,
            max: 1000
        })
    );
    assert_eq!(rig.gantry.position(), (500, 500));
    assert_eq!(rig.x.step.rising_edges(), x_edges);
    assert_eq!(rig.y.step.rising_edges(), y_edges);
    assert_eq!(rig.x.dir.writes(), x_dir_writes);
    assert!(rig.gantry.status().x_axis.is_homed);
}

#[test]
fn move_to_requires_homing() {
    let mut rig = software_rig();
    assert_eq!(
        rig.gantry.move_to(10, 10),
        Err(Error::Motion(MotionError::NotHomed(AxisId::X)))
    );

    // Relative moves skip the check.
    rig.gantry.move_relative(10, 10).unwrap();
    assert_eq!(rig.gantry.position(), (10, 10));
}

#[test]
fn disabled_moving_axis_rejects_move() {
    let mut rig = software_rig();
    rig.gantry.home().unwrap();
    rig.gantry.x_mut().disable().unwrap();

    assert_eq!(
        rig.gantry.move_relative(10, 10),
        Err(Error::Axis(AxisError::Disabled(AxisId::X)))
    );
    assert_eq!(rig.y.step.rising_edges(), 0);

    // Y alone may still move.
    rig.gantry.move_relative(0, 10).unwrap();
    assert_eq!(rig.gantry.position(), (0, 10));
}

#[test]
fn pin_failure_keeps_reached_position_and_clears_homing() {
    // One write at build, then five full pulses before the sixth HIGH fails.
    let mut rig = software_rig_with(SimPin::failing_after(11));
    rig.gantry.home().unwrap();

    let err = rig.gantry.move_relative(10, 0).unwrap_err();

    assert!(matches!(err, Error::Pin(_)));
    assert_eq!(rig.gantry.position(), (5, 0));
    let status = rig.gantry.status();
    assert!(!status.x_axis.is_homed);
    assert!(!status.y_axis.is_homed);
}

#[test]
fn follow_path_visits_waypoints_in_order() {
    let mut rig = software_rig();
    rig.gantry.home().unwrap();

    let reached = rig
        .gantry
        .follow_path(&[(100, 0), (100, 200), (0, 0)])
        .unwrap();

    assert_eq!(reached, 3);
    assert_eq!(rig.gantry.position(), (0, 0));
    assert_eq!(rig.x.step.rising_edges(), 200);
    assert_eq!(rig.y.step.rising_edges(), 400);
}

#[test]
fn follow_path_stops_at_first_bad_waypoint() {
    let mut rig = software_rig();
    rig.gantry.home().unwrap();

    let err = rig.gantry.follow_path(&[(100, 100), (2000, 0), (0, 0)]);

    assert!(err.is_err());
    assert_eq!(rig.gantry.position(), (100, 100));
}

// =============================================================================
// Homing, magnet and emergency stop
// =============================================================================

#[test]
fn homing_timeout_leaves_axis_unhomed() {
    let config = config();
    let x_step = SimPin::new();
    let x_probe = x_step.probe();
    let mut x: SimAxis = AxisBuilder::new(AxisId::X)
        .from_gantry_config(&config)
        .unwrap()
        .step_pin(x_step)
        .dir_pin(SimPin::new())
        .enable_pin(SimPin::new())
        .home_pin(SimEndstop::new(Trigger::Never))
        .delay(SimDelay::new())
        .build()
        .unwrap();

    let err = x.home(gantry_motion::Direction::Negative, 1_000).unwrap_err();

    assert_eq!(
        err,
        Error::Axis(AxisError::HomingTimeout {
            axis: AxisId::X,
            steps: 1000
        })
    );
    assert_eq!(x_probe.rising_edges(), 1000);
    assert!(!x.state().is_homed());
}

#[test]
fn homing_stops_at_endstop() {
    let config = config();
    let x_step = SimPin::new();
    let endstop = SimEndstop::new(Trigger::AfterPulses(x_step.probe(), 42));
    let reads = endstop.clone();
    let mut x: SimAxis = AxisBuilder::new(AxisId::X)
        .from_gantry_config(&config)
        .unwrap()
        .step_pin(x_step)
        .dir_pin(SimPin::new())
        .enable_pin(SimPin::new())
        .home_pin(endstop)
        .delay(SimDelay::new())
        .build()
        .unwrap();

    assert_eq!(x.home(gantry_motion::Direction::Negative, 1_000).unwrap(), 42);
    assert_eq!(reads.reads(), 43);
    assert!(x.state().is_homed());
    assert_eq!(x.position(), 0);
}

#[test]
fn magnet_commands_and_status() {
    let mut rig = software_rig();

    rig.gantry.magnet_on().unwrap();
    assert!(rig.magnet.is_high());
    assert_eq!(rig.gantry.status().electromagnet.map(|m| m.is_on), Some(true));

    rig.gantry.magnet_toggle().unwrap();
    assert!(!rig.magnet.is_high());
}

#[test]
fn magnet_commands_without_magnet_are_noops() {
    let config = config();
    let (x, _) = sim_axis(&config, AxisId::X, SimPin::new());
    let (y, _) = sim_axis(&config, AxisId::Y, SimPin::new());
    let mut gantry = GantryBuilder::new().x_axis(x).y_axis(y).build().unwrap();

    assert!(gantry.magnet_on().is_ok());
    assert!(gantry.magnet_toggle().is_ok());
    assert!(gantry.status().electromagnet.is_none());
}

#[test]
fn emergency_stop_requires_rehoming() {
    let mut rig = software_rig();
    rig.gantry.home().unwrap();
    rig.gantry.magnet_on().unwrap();

    rig.gantry.emergency_stop().unwrap();

    assert!(!rig.magnet.is_high());
    assert!(!rig.x.step.is_high());
    assert_eq!(
        rig.gantry.move_to(1, 1),
        Err(Error::Motion(MotionError::NotHomed(AxisId::X)))
    );
    rig.gantry.home().unwrap();
    rig.gantry.move_to(1, 1).unwrap();
}

#[test]
fn status_serializes() {
    let mut rig = software_rig();
    rig.gantry.home().unwrap();
    rig.gantry.move_to(12, 34).unwrap();

    let status = rig.gantry.status();
    assert_eq!(status.x_axis.position, 12);
    assert_eq!(status.y_axis.max_position, 1000);

    let rendered = toml::to_string(&status).unwrap();
    assert!(rendered.contains("timing = \"software\""));
}

// =============================================================================
// Coordinated moves: hardware timing
// =============================================================================

#[test]
fn hardware_diagonal_reaches_target() {
    let transport = SimWaveTransport::new();
    let mut rig = hardware_rig(transport.clone());
    rig.gantry.home().unwrap();

    let summary = rig.gantry.move_to(300, 100).unwrap();

    assert_eq!(summary.timing, TimingMode::Hardware);
    assert_eq!(rig.gantry.position(), (300, 100));

    let log = transport.log();
    assert!(log.waves.len() > 1, "300-pulse chunks should split the move");
    assert!(log.waves.iter().all(|w| w.len() <= 300));
    assert_eq!(edges_on(&log.waves, 17), 300);
    assert_eq!(edges_on(&log.waves, 27), 100);
    assert!(log.writes.contains(&(18, true)));
    assert!(log.writes.contains(&(22, true)));
    assert_eq!(log.writes.last(), Some(&(27, false)));

    // Local STEP pins stay idle on the hardware path.
    assert_eq!(rig.x.step.rising_edges(), 0);
}

#[test]
fn hardware_and_software_emit_same_interleaving() {
    let transport = SimWaveTransport::new();
    let mut rig = hardware_rig(transport.clone());
    rig.gantry.home().unwrap();
    rig.gantry.move_to(300, 100).unwrap();

    let gpio_order: Vec<AxisId> = decode_pulses(&transport.log().waves)
        .iter()
        .map(|(_, gpio)| if *gpio == 17 { AxisId::X } else { AxisId::Y })
        .collect();
    let line_order: Vec<AxisId> = LineSteps::new(300, 100, StepTiming::from_config(&config().motion))
        .map(|e| e.axis)
        .collect();

    assert_eq!(gpio_order, line_order);
}

#[test]
fn hardware_reset_reconnects_once() {
    let transport = SimWaveTransport::new().fail_send(2);
    let mut rig = hardware_rig(transport.clone());
    rig.gantry.home().unwrap();

    let summary = rig.gantry.move_to(300, 100).unwrap();

    assert_eq!(summary.reconnects, 1);
    assert_eq!(rig.gantry.position(), (300, 100));
    let log = transport.log();
    assert_eq!(log.reconnects, 1);
    assert_eq!(edges_on(&log.waves, 17), 300);
    assert_eq!(edges_on(&log.waves, 27), 100);
}

#[test]
fn hardware_second_reset_propagates() {
    let transport = SimWaveTransport::new().fail_send(1).fail_send(2);
    let mut rig = hardware_rig(transport.clone());
    rig.gantry.home().unwrap();

    let err = rig.gantry.move_to(300, 100).unwrap_err();

    assert_eq!(err, Error::Wave(WaveError::ConnectionReset));
    assert_eq!(rig.gantry.position(), (0, 0));
    assert!(!rig.gantry.status().x_axis.is_homed);
    assert!(!rig.gantry.status().y_axis.is_homed);
}

#[test]
fn gpio_outside_wave_bank_is_rejected_before_any_move() {
    let result: Result<SimAxis, Error> = AxisBuilder::new(AxisId::X)
        .max_position(1000)
        .gpio(40, 41)
        .step_pin(SimPin::new())
        .dir_pin(SimPin::new())
        .enable_pin(SimPin::new())
        .home_pin(SimEndstop::new(Trigger::Always))
        .delay(SimDelay::new())
        .build();

    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidPin(40)))
    ));
}

#[test]
fn take_wave_executor_falls_back_to_software() {
    let mut rig = hardware_rig(SimWaveTransport::new());
    rig.gantry.home().unwrap();

    assert!(rig.gantry.take_wave_executor().is_some());
    let summary = rig.gantry.move_to(3, 2).unwrap();

    assert_eq!(summary.timing, TimingMode::Software);
    assert_eq!(rig.x.step.rising_edges(), 3);
    assert_eq!(rig.y.step.rising_edges(), 2);
}

// =============================================================================
// pigpiod socket protocol
// =============================================================================

#[test]
fn unreachable_daemon_falls_back_to_software_timing() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut config = config();
    config.wave.host = "127.0.0.1".try_into().unwrap();
    config.wave.port = port;

    let generator = PulseTrainGenerator::<PigpioTransport, SimDelay>::connect_from_config(
        SimDelay::new(),
        &config.wave,
    );
    assert!(generator.is_none());

    let (x, x_probes) = sim_axis(&config, AxisId::X, SimPin::new());
    let (y, _) = sim_axis(&config, AxisId::Y, SimPin::new());
    let mut gantry = GantryBuilder::new()
        .from_config(&config)
        .x_axis(x)
        .y_axis(y)
        .build()
        .unwrap();

    assert_eq!(gantry.timing_mode(), TimingMode::Software);
    gantry.move_relative(4, 0).unwrap();
    assert_eq!(x_probes.step.rising_edges(), 4);
}

struct Request {
    connection: usize,
    cmd: u32,
    p1: u32,
    extension: Vec<u8>,
}

/// Serve pigpiod requests; the first connection is dropped at its first WVTX.
fn fake_pigpiod(listener: TcpListener) -> thread::JoinHandle<Vec<Request>> {
    thread::spawn(move || {
        let mut requests = Vec::new();
        for connection in 0..2 {
            let (mut socket, _) = listener.accept().unwrap();
            let mut next_wave = 0u32;
            loop {
                let mut header = [0u8; 16];
                if socket.read_exact(&mut header).is_err() {
                    break;
                }
                let word = |i: usize| u32::from_le_bytes(header[i * 4..i * 4 + 4].try_into().unwrap());
                let (cmd, p1, p2, p3) = (word(0), word(1), word(2), word(3));
                let mut extension = vec![0u8; p3 as usize];
                socket.read_exact(&mut extension).unwrap();

                requests.push(Request {
                    connection,
                    cmd,
                    p1,
                    extension,
                });

                if connection == 0 && cmd == command::WVTX {
                    break;
                }

                let result: i32 = match cmd {
                    command::WVCRE => {
                        next_wave += 1;
                        next_wave as i32 - 1
                    }
                    command::WVAG => (p3 / 12) as i32,
                    _ => 0,
                };
                let mut reply = [0u8; 16];
                reply[0..4].copy_from_slice(&cmd.to_le_bytes());
                reply[4..8].copy_from_slice(&p1.to_le_bytes());
                reply[8..12].copy_from_slice(&p2.to_le_bytes());
                reply[12..16].copy_from_slice(&result.to_le_bytes());
                socket.write_all(&reply).unwrap();
            }
        }
        requests
    })
}

#[test]
fn pigpiod_reset_mid_move_is_recovered() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = fake_pigpiod(listener);

    let mut config = config();
    config.wave.host = "127.0.0.1".try_into().unwrap();
    config.wave.port = port;
    config.wave.timeout_ms = 5_000;
    let (x, _) = sim_axis(&config, AxisId::X, SimPin::new());
    let (y, _) = sim_axis(&config, AxisId::Y, SimPin::new());
    let generator: PulseTrainGenerator<PigpioTransport, SimDelay> =
        PulseTrainGenerator::connect_from_config(SimDelay::new(), &config.wave)
            .expect("fake daemon is listening");
    let mut gantry = GantryBuilder::new()
        .from_config(&config)
        .x_axis(x)
        .y_axis(y)
        .wave_executor(generator)
        .build()
        .unwrap();

    let summary = gantry.move_relative(3, 2).unwrap();
    assert_eq!(summary.reconnects, 1);
    assert_eq!(gantry.position(), (3, 2));
    drop(gantry);

    let requests = server.join().unwrap();

    // Pins are configured again on the new connection.
    let modes: Vec<u32> = requests
        .iter()
        .filter(|r| r.connection == 1 && r.cmd == command::MODES)
        .map(|r| r.p1)
        .collect();
    assert_eq!(modes, vec![17, 18, 27, 22]);

    // The replayed wave carries every step.
    let pulses: Vec<Pulse> = requests
        .iter()
        .filter(|r| r.connection == 1 && r.cmd == command::WVAG)
        .flat_map(|r| {
            r.extension
                .chunks_exact(12)
                .map(|c| Pulse {
                    gpio_on: u32::from_le_bytes(c[0..4].try_into().unwrap()),
                    gpio_off: u32::from_le_bytes(c[4..8].try_into().unwrap()),
                    delay_us: u32::from_le_bytes(c[8..12].try_into().unwrap()),
                })
                .collect::<Vec<_>>()
        })
        .collect();
    let waves = vec![pulses];
    assert_eq!(edges_on(&waves, 17), 3);
    assert_eq!(edges_on(&waves, 27), 2);
}
