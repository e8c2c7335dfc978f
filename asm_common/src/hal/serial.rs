//! Serial line seam.

use super::error::HalResult;
use std::time::Duration;

/// Baud rates accepted by every backend.
pub const SUPPORTED_BAUD_RATES: [u32; 8] = [1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

/// UART parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    /// No parity bit.
    #[default]
    None,
    /// Odd parity.
    Odd,
    /// Even parity.
    Even,
}

/// UART stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopBits {
    /// One stop bit.
    #[default]
    One,
    /// Two stop bits.
    Two,
}

/// Framing and timeout of a serial line. Data bits are always 8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line speed in bits per second.
    pub baud_rate: u32,
    /// Parity.
    pub parity: Parity,
    /// Stop bits.
    pub stop_bits: StopBits,
    /// Upper bound for one `read` call to fill its buffer.
    pub timeout: Duration,
}

impl SerialConfig {
    /// 8N1 at `baud_rate` with the default 100 ms timeout.
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::default()
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: Duration::from_millis(100),
        }
    }
}

/// Returns true if `baud_rate` is one of [`SUPPORTED_BAUD_RATES`].
pub fn is_supported_baud(baud_rate: u32) -> bool {
    SUPPORTED_BAUD_RATES.contains(&baud_rate)
}

/// Byte-oriented, timeout-aware serial line.
///
/// # Contract
///
/// - `read` blocks until `buf` is full or the configured timeout elapses,
///   and returns the number of bytes actually read (possibly 0).
/// - `available` never blocks.
/// - `flush_input` discards everything currently buffered on the input side.
pub trait SerialLine: Send {
    /// Open the underlying device with the current configuration.
    fn open(&mut self) -> HalResult<()>;

    /// Close the device. Closing a closed line is a no-op.
    fn close(&mut self);

    /// Whether the line is open.
    fn is_open(&self) -> bool;

    /// Current framing and timeout.
    fn config(&self) -> &SerialConfig;

    /// Change line speed. Applied immediately if open.
    fn set_baud_rate(&mut self, baud_rate: u32) -> HalResult<()>;

    /// Change parity. Applied immediately if open.
    fn set_parity(&mut self, parity: Parity) -> HalResult<()>;

    /// Change the read timeout.
    fn set_timeout(&mut self, timeout: Duration);

    /// Number of bytes waiting in the input buffer.
    fn available(&mut self) -> HalResult<usize>;

    /// Read up to `buf.len()` bytes within the timeout.
    fn read(&mut self, buf: &mut [u8]) -> HalResult<usize>;

    /// Write all of `data`, returning the number of bytes written.
    fn write(&mut self, data: &[u8]) -> HalResult<usize>;

    /// Discard pending input.
    fn flush_input(&mut self) -> HalResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_9600_8n1() {
        let cfg = SerialConfig::default();
        assert_eq!(cfg.baud_rate, 9600);
        assert_eq!(cfg.parity, Parity::None);
        assert_eq!(cfg.stop_bits, StopBits::One);
        assert_eq!(cfg.timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_supported_baud() {
        assert!(is_supported_baud(9600));
        assert!(is_supported_baud(115200));
        assert!(!is_supported_baud(14400));
    }
}
