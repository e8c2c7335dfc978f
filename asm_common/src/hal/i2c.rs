//! I²C bus seam.

use super::error::HalResult;
use parking_lot::Mutex;
use std::sync::Arc;

/// Master side of an I²C bus. Each call is one complete transaction.
pub trait I2cBus: Send {
    /// Bus device path, for diagnostics.
    fn name(&self) -> &str;

    /// Write `data` to the slave at `address`.
    fn write(&mut self, address: u8, data: &[u8]) -> HalResult<()>;

    /// Fill `buf` from the slave at `address`.
    fn read(&mut self, address: u8, buf: &mut [u8]) -> HalResult<()>;

    /// Whether a slave acknowledges at `address`.
    fn probe(&mut self, address: u8) -> bool {
        let mut scratch = [0u8; 1];
        self.read(address, &mut scratch).is_ok()
    }
}

/// Bus shared by several devices. The lock is held for one transaction
/// (or one multi-step scan) and never across a sleep.
pub type SharedI2cBus = Arc<Mutex<Box<dyn I2cBus>>>;

/// Wrap a bus for sharing between devices and threads.
pub fn share_bus(bus: Box<dyn I2cBus>) -> SharedI2cBus {
    Arc::new(Mutex::new(bus))
}
