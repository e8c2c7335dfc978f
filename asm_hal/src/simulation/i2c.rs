//! Simulated I²C bus with PCF8574-style devices and a 4x4 keypad matrix.
//!
//! A plain device answers reads with the last byte written to it. A keypad
//! device answers according to the scan mask last written and the set of
//! keys held down: with mask `0xF0` the column of each held key pulls one
//! of bits 4..7 low, with mask `0x0F` its row pulls one of bits 0..3 low.

use asm_common::hal::{HalError, HalResult, I2cBus};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Device {
    latch: u8,
    keypad: bool,
    held: Vec<u8>,
    fault: bool,
    writes: Vec<Vec<u8>>,
    reads: usize,
}

impl Device {
    fn sample(&self) -> u8 {
        if !self.keypad {
            return self.latch;
        }
        let mut value = self.latch;
        for &code in &self.held {
            let col = code % 4;
            let row = code / 4;
            match self.latch {
                0xF0 => value &= !(0x10 << col),
                0x0F => value &= !(0x01 << row),
                _ => {}
            }
        }
        value
    }
}

#[derive(Debug, Default)]
struct BusState {
    devices: BTreeMap<u8, Device>,
}

/// Test-side view of a [`SimI2cBus`].
#[derive(Clone, Default)]
pub struct SimI2cHandle {
    state: Arc<Mutex<BusState>>,
}

impl SimI2cHandle {
    /// Attach a plain latch device (power-on value `0xFF`).
    pub fn add_device(&self, address: u8) {
        self.state.lock().devices.insert(
            address,
            Device {
                latch: 0xFF,
                ..Device::default()
            },
        );
    }

    /// Attach a keypad matrix expander.
    pub fn add_keypad(&self, address: u8) {
        self.state.lock().devices.insert(
            address,
            Device {
                latch: 0xFF,
                keypad: true,
                ..Device::default()
            },
        );
    }

    /// Hold exactly one key on every keypad.
    pub fn press(&self, code: u8) {
        self.press_many(&[code]);
    }

    /// Hold several keys at once (produces ambiguous patterns).
    pub fn press_many(&self, codes: &[u8]) {
        for dev in self.state.lock().devices.values_mut().filter(|d| d.keypad) {
            dev.held = codes.to_vec();
        }
    }

    /// Release all keys.
    pub fn release(&self) {
        self.press_many(&[]);
    }

    /// Make every transaction to `address` fail.
    pub fn set_fault(&self, address: u8, fault: bool) {
        if let Some(dev) = self.state.lock().devices.get_mut(&address) {
            dev.fault = fault;
        }
    }

    /// Last byte written to `address`.
    pub fn register(&self, address: u8) -> Option<u8> {
        self.state.lock().devices.get(&address).map(|d| d.latch)
    }

    /// Every write to `address`, one entry per transaction.
    pub fn writes(&self, address: u8) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .devices
            .get(&address)
            .map(|d| d.writes.clone())
            .unwrap_or_default()
    }

    /// Number of reads served by `address`.
    pub fn reads(&self, address: u8) -> usize {
        self.state
            .lock()
            .devices
            .get(&address)
            .map(|d| d.reads)
            .unwrap_or(0)
    }
}

/// In-memory [`I2cBus`].
pub struct SimI2cBus {
    name: String,
    handle: SimI2cHandle,
}

impl SimI2cBus {
    /// Empty bus.
    pub fn new() -> Self {
        Self::with_handle("sim-i2c", SimI2cHandle::default())
    }

    /// Bus over existing state.
    pub fn with_handle(name: impl Into<String>, handle: SimI2cHandle) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }

    /// Test-side handle.
    pub fn handle(&self) -> SimI2cHandle {
        self.handle.clone()
    }
}

impl Default for SimI2cBus {
    fn default() -> Self {
        Self::new()
    }
}

fn nack(address: u8) -> HalError {
    HalError::Bus {
        address,
        reason: "no acknowledge".to_string(),
    }
}

impl I2cBus for SimI2cBus {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, address: u8, data: &[u8]) -> HalResult<()> {
        let mut state = self.handle.state.lock();
        let dev = state
            .devices
            .get_mut(&address)
            .filter(|d| !d.fault)
            .ok_or_else(|| nack(address))?;
        if let Some(&last) = data.last() {
            dev.latch = last;
        }
        dev.writes.push(data.to_vec());
        Ok(())
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> HalResult<()> {
        let mut state = self.handle.state.lock();
        let dev = state
            .devices
            .get_mut(&address)
            .filter(|d| !d.fault)
            .ok_or_else(|| nack(address))?;
        dev.reads += 1;
        let value = dev.sample();
        buf.iter_mut().for_each(|b| *b = value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(bus: &mut SimI2cBus, mask: u8) -> u8 {
        bus.write(0x23, &[mask]).unwrap();
        let mut buf = [0u8];
        bus.read(0x23, &mut buf).unwrap();
        buf[0]
    }

    #[test]
    fn test_keypad_patterns() {
        let mut bus = SimI2cBus::new();
        let handle = bus.handle();
        handle.add_keypad(0x23);

        assert_eq!(scan(&mut bus, 0xF0), 0xF0);
        assert_eq!(scan(&mut bus, 0x0F), 0x0F);

        handle.press(5);
        assert_eq!(scan(&mut bus, 0xF0), 0xD0);
        assert_eq!(scan(&mut bus, 0x0F), 0x0D);

        handle.press(15);
        assert_eq!(scan(&mut bus, 0xF0), 0x70);
        assert_eq!(scan(&mut bus, 0x0F), 0x07);

        handle.press_many(&[0, 1]);
        assert_eq!(scan(&mut bus, 0xF0), 0xC0);
    }

    #[test]
    fn test_latch_and_fault() {
        let mut bus = SimI2cBus::new();
        let handle = bus.handle();
        handle.add_device(0x26);
        bus.write(0x26, &[0x7F]).unwrap();
        let mut buf = [0u8];
        bus.read(0x26, &mut buf).unwrap();
        assert_eq!(buf[0], 0x7F);
        assert_eq!(handle.reads(0x26), 1);

        handle.set_fault(0x26, true);
        assert!(bus.write(0x26, &[0]).is_err());
        assert!(!bus.probe(0x26));
        assert!(!bus.probe(0x50));
    }
}
