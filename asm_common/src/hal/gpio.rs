//! Single digital line seam.

use super::error::HalResult;
use serde::{Deserialize, Serialize};

/// Line direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Read-only line.
    Input,
    /// Driven line.
    Output,
}

/// Electrical level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    /// 0 V.
    #[default]
    Low,
    /// Vcc.
    High,
}

impl Level {
    /// Whether the level is [`Level::High`].
    pub fn is_high(self) -> bool {
        self == Level::High
    }

    /// The opposite level.
    pub fn inverted(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// Rockchip-style pin coordinate: bank, group (A..D = 0..3) and id (0..7).
///
/// The kernel pin number is `bank * 32 + group * 8 + id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GpioId {
    /// Bank 0..4.
    pub bank: u32,
    /// Group 0..3 (A..D).
    pub group: u32,
    /// Id 0..7.
    pub id: u32,
}

impl GpioId {
    /// Build a pin coordinate.
    pub const fn new(bank: u32, group: u32, id: u32) -> Self {
        Self { bank, group, id }
    }

    /// Kernel pin number, or `None` if any coordinate is out of range.
    pub const fn number(&self) -> Option<u32> {
        if self.bank > 4 || self.group > 3 || self.id > 7 {
            return None;
        }
        Some(self.bank * 32 + self.group * 8 + self.id)
    }
}

/// Direction + level control of one digital line.
pub trait GpioLine: Send {
    /// Kernel pin number.
    fn pin(&self) -> u32;

    /// Export and configure the line. Outputs are driven to `initial`.
    fn open(&mut self, direction: Direction, initial: Level) -> HalResult<()>;

    /// Release the line. Closing a closed line is a no-op.
    fn close(&mut self);

    /// Whether the line is open.
    fn is_open(&self) -> bool;

    /// Drive an output line.
    fn write(&mut self, level: Level) -> HalResult<()>;

    /// Sample the line. Outputs report the last driven level.
    fn read(&mut self) -> HalResult<Level>;

    /// Drive high.
    fn set(&mut self) -> HalResult<()> {
        self.write(Level::High)
    }

    /// Drive low.
    fn reset(&mut self) -> HalResult<()> {
        self.write(Level::Low)
    }

    /// Invert the current level, returning the new one.
    fn toggle(&mut self) -> HalResult<Level> {
        let next = self.read()?.inverted();
        self.write(next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_number() {
        // bank1 group C id4 -> status lamp on the original board
        assert_eq!(GpioId::new(1, 2, 4).number(), Some(52));
        assert_eq!(GpioId::new(0, 0, 0).number(), Some(0));
        assert_eq!(GpioId::new(4, 3, 7).number(), Some(159));
    }

    #[test]
    fn test_pin_number_out_of_range() {
        assert_eq!(GpioId::new(5, 0, 0).number(), None);
        assert_eq!(GpioId::new(0, 4, 0).number(), None);
        assert_eq!(GpioId::new(0, 0, 8).number(), None);
    }

    #[test]
    fn test_level_helpers() {
        assert!(Level::from(true).is_high());
        assert_eq!(Level::High.inverted(), Level::Low);
        assert_eq!(Level::default(), Level::Low);
    }
}
