//! tty serial line on top of the `serialport` crate.
//!
//! The port is opened 8-bit raw. A `read` keeps pulling bytes until the
//! buffer is full or the configured timeout has elapsed since the call.

use asm_common::hal::{HalError, HalResult, Parity, SerialConfig, SerialLine, StopBits};
use serialport::{ClearBuffer, DataBits, FlowControl, SerialPort};
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};
use tracing::debug;

/// Line speeds the radio and GNSS modules can be configured for.
const BAUD_RATES: [u32; 8] = [1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

/// Lower bound for a blocking write.
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Serial line on a tty device such as `/dev/ttyS0`.
pub struct LinuxSerial {
    path: String,
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl LinuxSerial {
    /// Closed line on `path` with `config`.
    pub fn new(path: impl Into<String>, config: SerialConfig) -> Self {
        Self {
            path: path.into(),
            config,
            port: None,
        }
    }

    /// Device path.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn port(&mut self) -> HalResult<&mut Box<dyn SerialPort>> {
        match self.port.as_mut() {
            Some(port) => Ok(port),
            None => Err(HalError::NotOpen(self.path.clone())),
        }
    }
}

impl SerialLine for LinuxSerial {
    fn open(&mut self) -> HalResult<()> {
        if self.port.is_some() {
            return Ok(());
        }
        check_baud(self.config.baud_rate)?;
        let mut port = serialport::new(&self.path, self.config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(parity(self.config.parity))
            .stop_bits(stop_bits(self.config.stop_bits))
            .flow_control(FlowControl::None)
            .timeout(self.config.timeout)
            .open()
            .map_err(|e| HalError::open(&self.path, e))?;
        port.clear(ClearBuffer::All)
            .map_err(|e| HalError::io(&self.path, e))?;
        self.port = Some(port);
        debug!("Serial {} open at {} baud", self.path, self.config.baud_rate);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("Serial {} closed", self.path);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> HalResult<()> {
        check_baud(baud_rate)?;
        self.config.baud_rate = baud_rate;
        let path = self.path.clone();
        if let Some(port) = self.port.as_mut() {
            port.set_baud_rate(baud_rate)
                .map_err(|e| HalError::io(path, e))?;
        }
        Ok(())
    }

    fn set_parity(&mut self, value: Parity) -> HalResult<()> {
        self.config.parity = value;
        let path = self.path.clone();
        if let Some(port) = self.port.as_mut() {
            port.set_parity(parity(value))
                .map_err(|e| HalError::io(path, e))?;
        }
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    fn available(&mut self) -> HalResult<usize> {
        let path = self.path.clone();
        let count = self
            .port()?
            .bytes_to_read()
            .map_err(|e| HalError::io(path, e))?;
        Ok(count as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> HalResult<usize> {
        let path = self.path.clone();
        let deadline = Instant::now() + self.config.timeout;
        let port = self.port()?;
        let mut filled = 0;
        while filled < buf.len() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            port.set_timeout(deadline - now)
                .map_err(|e| HalError::io(&path, e))?;
            match port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(HalError::io(path, e)),
            }
        }
        Ok(filled)
    }

    fn write(&mut self, data: &[u8]) -> HalResult<usize> {
        let path = self.path.clone();
        let timeout = self.config.timeout.max(WRITE_TIMEOUT);
        let port = self.port()?;
        port.set_timeout(timeout)
            .map_err(|e| HalError::io(&path, e))?;
        match port.write_all(data).and_then(|()| port.flush()) {
            Ok(()) => Ok(data.len()),
            Err(e) if e.kind() == ErrorKind::TimedOut => {
                Err(HalError::Timeout(format!("{path} write")))
            }
            Err(e) => Err(HalError::io(path, e)),
        }
    }

    fn flush_input(&mut self) -> HalResult<()> {
        let path = self.path.clone();
        self.port()?
            .clear(ClearBuffer::Input)
            .map_err(|e| HalError::io(path, e))
    }
}

fn check_baud(baud_rate: u32) -> HalResult<()> {
    if BAUD_RATES.contains(&baud_rate) {
        Ok(())
    } else {
        Err(HalError::InvalidParam(format!("baud rate {baud_rate}")))
    }
}

fn parity(value: Parity) -> serialport::Parity {
    match value {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    }
}

fn stop_bits(value: StopBits) -> serialport::StopBits {
    match value {
        StopBits::One => serialport::StopBits::One,
        StopBits::Two => serialport::StopBits::Two,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_baud_rates() {
        assert!(check_baud(9600).is_ok());
        assert!(check_baud(115200).is_ok());
        assert!(matches!(check_baud(14400), Err(HalError::InvalidParam(_))));
    }

    #[test]
    fn test_framing_maps_to_port_settings() {
        assert_eq!(parity(Parity::Even), serialport::Parity::Even);
        assert_eq!(parity(Parity::None), serialport::Parity::None);
        assert_eq!(stop_bits(StopBits::Two), serialport::StopBits::Two);
    }

    #[test]
    fn test_closed_line_rejects_io() {
        let mut line = LinuxSerial::new("/dev/does-not-exist", SerialConfig::default());
        assert!(!line.is_open());
        let mut buf = [0u8; 4];
        assert!(matches!(line.read(&mut buf), Err(HalError::NotOpen(_))));
        assert!(matches!(line.write(b"x"), Err(HalError::NotOpen(_))));
        assert!(matches!(line.available(), Err(HalError::NotOpen(_))));
        assert!(matches!(line.flush_input(), Err(HalError::NotOpen(_))));
    }

    #[test]
    fn test_open_missing_device() {
        let mut line = LinuxSerial::new("/dev/does-not-exist", SerialConfig::default());
        assert!(matches!(line.open(), Err(HalError::OpenFailed { .. })));
        assert!(!line.is_open());
    }

    #[test]
    fn test_config_changes_while_closed() {
        let mut line = LinuxSerial::new("/dev/ttyS0", SerialConfig::new(115200));
        line.set_baud_rate(9600).unwrap();
        line.set_parity(Parity::Even).unwrap();
        line.set_timeout(Duration::from_millis(250));
        assert_eq!(line.config().baud_rate, 9600);
        assert_eq!(line.config().parity, Parity::Even);
        assert_eq!(line.config().timeout, Duration::from_millis(250));
        assert!(line.set_baud_rate(1234).is_err());
        assert_eq!(line.config().baud_rate, 9600);
    }
}
