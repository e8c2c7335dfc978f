//! PCF8574 8-bit quasi-bidirectional expander.
//!
//! The chip has no registers: a one-byte write latches the outputs, a
//! one-byte read samples the pins. Pins written high are weak pull-ups and
//! can be read as inputs. A shadow copy of the last written byte lets
//! single-pin writes leave the other pins untouched.

use asm_common::hal::{HalResult, I2cBus};

/// One expander on a bus. The bus is passed per call so that several
/// expanders can share a locked bus.
#[derive(Debug, Clone)]
pub struct Pcf8574 {
    address: u8,
    shadow: u8,
}

impl Pcf8574 {
    /// Expander at `address`, assumed power-on state (all high).
    pub fn new(address: u8) -> Self {
        Self {
            address,
            shadow: 0xFF,
        }
    }

    /// Slave address.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Last byte written.
    pub fn shadow(&self) -> u8 {
        self.shadow
    }

    /// Latch all eight pins.
    pub fn write8(&mut self, bus: &mut dyn I2cBus, value: u8) -> HalResult<()> {
        bus.write(self.address, &[value])?;
        self.shadow = value;
        Ok(())
    }

    /// Drive one pin, keeping the others at their shadowed level.
    pub fn write_pin(&mut self, bus: &mut dyn I2cBus, pin: u8, high: bool) -> HalResult<()> {
        let mask = 1u8 << (pin & 0x07);
        let value = if high {
            self.shadow | mask
        } else {
            self.shadow & !mask
        };
        self.write8(bus, value)
    }

    /// Sample all eight pins.
    pub fn read8(&mut self, bus: &mut dyn I2cBus) -> HalResult<u8> {
        let mut buf = [0u8; 1];
        bus.read(self.address, &mut buf)?;
        Ok(buf[0])
    }

    /// Write `mask` (pull-ups on the bits to sample) and read back.
    pub fn scan(&mut self, bus: &mut dyn I2cBus, mask: u8) -> HalResult<u8> {
        self.write8(bus, mask)?;
        self.read8(bus)
    }
}
