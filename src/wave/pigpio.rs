//! pigpiod socket transport.
//!
//! Every request is a 16-byte header of four little-endian `u32` words
//! (`cmd`, `p1`, `p2`, `p3`) followed by `p3` bytes of extension. The daemon
//! answers with 16 bytes whose last word is the signed result; negative
//! results are pigpio error codes.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::string::{String, ToString};
use std::time::Duration;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::config::WaveConfig;
use crate::error::WaveError;

use super::generator::PulseTrainGenerator;
use super::transport::{Pulse, PulseWaveTransport};

/// pigpiod command numbers used by the transport.
pub mod command {
    /// Set GPIO mode.
    pub const MODES: u32 = 0;
    /// Write GPIO level.
    pub const WRITE: u32 = 4;
    /// Clear all waves.
    pub const WVCLR: u32 = 27;
    /// Add generic pulses to the pending wave.
    pub const WVAG: u32 = 28;
    /// Wave transmit busy.
    pub const WVBSY: u32 = 32;
    /// Create wave from pending pulses.
    pub const WVCRE: u32 = 49;
    /// Delete wave.
    pub const WVDEL: u32 = 50;
    /// Transmit wave once.
    pub const WVTX: u32 = 51;

    /// `MODES` argument for an output.
    pub const MODE_OUTPUT: u32 = 1;
}

const HEADER_LEN: usize = 16;
const PULSE_LEN: usize = 12;

/// Pulse daemon transport over TCP.
#[derive(Debug)]
pub struct PigpioTransport {
    host: String,
    port: u16,
    timeout: Duration,
    stream: Option<TcpStream>,
}

impl PigpioTransport {
    /// Connect to a pigpiod instance.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, WaveError> {
        let mut transport = Self {
            host: host.to_string(),
            port,
            timeout,
            stream: None,
        };
        transport.open()?;
        Ok(transport)
    }

    /// Connect using the `[wave]` configuration section.
    pub fn from_config(config: &WaveConfig) -> Result<Self, WaveError> {
        Self::connect(
            config.host.as_str(),
            config.port,
            Duration::from_millis(u64::from(config.timeout_ms)),
        )
    }

    /// Whether a connection is open.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Close the connection.
    pub fn close(&mut self) {
        self.stream = None;
    }

    fn open(&mut self) -> Result<(), WaveError> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port).to_socket_addrs()?.collect();
        let mut last_err = WaveError::NotConnected;

        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_read_timeout(Some(self.timeout))?;
                    stream.set_write_timeout(Some(self.timeout))?;
                    log::info!("connected to pigpiod at {}", addr);
                    self.stream = Some(stream);
                    return Ok(());
                }
                Err(e) => last_err = e.into(),
            }
        }

        Err(last_err)
    }

    fn command(&mut self, cmd: u32, p1: u32, p2: u32, extension: &[u8]) -> Result<i32, WaveError> {
        let stream = self.stream.as_mut().ok_or(WaveError::NotConnected)?;

        let p3 = u32::try_from(extension.len()).map_err(|_| WaveError::Command {
            command: cmd,
            code: -1,
        })?;
        let mut request = Vec::with_capacity(HEADER_LEN + extension.len());
        for word in [cmd, p1, p2, p3] {
            request.extend_from_slice(&word.to_le_bytes());
        }
        request.extend_from_slice(extension);

        let result = stream.write_all(&request).and_then(|()| {
            let mut reply = [0u8; HEADER_LEN];
            stream.read_exact(&mut reply)?;
            Ok(i32::from_le_bytes([reply[12], reply[13], reply[14], reply[15]]))
        });

        let code = match result {
            Ok(code) => code,
            Err(e) => {
                let err = WaveError::from(e);
                if err == WaveError::ConnectionReset {
                    self.stream = None;
                }
                return Err(err);
            }
        };

        if code < 0 {
            return Err(WaveError::Command { command: cmd, code });
        }
        Ok(code)
    }
}

impl<D: DelayNs> PulseTrainGenerator<PigpioTransport, D> {
    /// Connect to the daemon named in the `[wave]` section.
    ///
    /// Returns `None` when hardware timing is disabled or the daemon cannot
    /// be reached; the gantry then runs with software timing.
    pub fn connect_from_config(delay: D, config: &WaveConfig) -> Option<Self> {
        if !config.enabled {
            log::info!("hardware timing disabled in configuration; using software timing");
            return None;
        }

        match PigpioTransport::from_config(config) {
            Ok(transport) => Some(Self::from_config(transport, delay, config)),
            Err(e) => {
                log::warn!(
                    "pulse daemon at {}:{} unavailable ({}); falling back to software timing",
                    config.host,
                    config.port,
                    e
                );
                None
            }
        }
    }
}

/// Serialize pulses as the `WVAG` extension.
pub(crate) fn encode_pulses(pulses: &[Pulse]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(pulses.len() * PULSE_LEN);
    for pulse in pulses {
        bytes.extend_from_slice(&pulse.gpio_on.to_le_bytes());
        bytes.extend_from_slice(&pulse.gpio_off.to_le_bytes());
        bytes.extend_from_slice(&pulse.delay_us.to_le_bytes());
    }
    bytes
}

impl PulseWaveTransport for PigpioTransport {
    fn set_output(&mut self, gpio: u8) -> Result<(), WaveError> {
        self.command(command::MODES, u32::from(gpio), command::MODE_OUTPUT, &[])
            .map(drop)
    }

    fn write(&mut self, gpio: u8, high: bool) -> Result<(), WaveError> {
        self.command(command::WRITE, u32::from(gpio), u32::from(high), &[])
            .map(drop)
    }

    fn wave_clear(&mut self) -> Result<(), WaveError> {
        self.command(command::WVCLR, 0, 0, &[]).map(drop)
    }

    fn wave_add_generic(&mut self, pulses: &[Pulse]) -> Result<u32, WaveError> {
        let extension = encode_pulses(pulses);
        self.command(command::WVAG, 0, 0, &extension)
            .map(|n| n as u32)
    }

    fn wave_create(&mut self) -> Result<u32, WaveError> {
        self.command(command::WVCRE, 0, 0, &[]).map(|id| id as u32)
    }

    fn wave_send_once(&mut self, wave_id: u32) -> Result<u32, WaveError> {
        self.command(command::WVTX, wave_id, 0, &[]).map(|n| n as u32)
    }

    fn wave_tx_busy(&mut self) -> Result<bool, WaveError> {
        self.command(command::WVBSY, 0, 0, &[]).map(|busy| busy != 0)
    }

    fn wave_delete(&mut self, wave_id: u32) -> Result<(), WaveError> {
        self.command(command::WVDEL, wave_id, 0, &[]).map(drop)
    }

    fn reconnect(&mut self) -> Result<(), WaveError> {
        self.stream = None;
        self.open()
    }
}
