//! 4x4 matrix keypad scanner on a PCF8574.
//!
//! A scan drives the row half low and samples the column half, then the
//! reverse. One held key yields exactly one low bit in each half:
//!
//! | mask `0xF0` | `E0` | `D0` | `B0` | `70` |
//! |-------------|------|------|------|------|
//! | index       | 0    | 1    | 2    | 3    |
//!
//! | mask `0x0F` | `0E` | `0D` | `0B` | `07` |
//! |-------------|------|------|------|------|
//! | offset      | 0    | 4    | 8    | 12   |
//!
//! Any other pattern (two keys, a release mid-scan) is [`KEY_FAIL`].

use asm_common::hal::I2cBus;
use asm_common::io::{KEY_FAIL, KEY_NONE, KEY_THRESHOLD};
use asm_hal::Pcf8574;
use tracing::trace;

const HIGH_MASK: u8 = 0xF0;
const LOW_MASK: u8 = 0x0F;

fn high_index(value: u8) -> Option<u8> {
    match value {
        0xE0 => Some(0),
        0xD0 => Some(1),
        0xB0 => Some(2),
        0x70 => Some(3),
        _ => None,
    }
}

fn low_offset(value: u8) -> Option<u8> {
    match value {
        0x0E => Some(0),
        0x0D => Some(4),
        0x0B => Some(8),
        0x07 => Some(12),
        _ => None,
    }
}

/// Debounced scanner.
///
/// State changes (press or release) are accepted at most once per
/// debounce window, counted from the last accepted change. A press is
/// reported once; the next press needs an accepted release in between.
#[derive(Debug)]
pub struct Keypad {
    expander: Pcf8574,
    debounce_ms: u64,
    state: u8,
    last_change_ms: Option<u64>,
    last_key: Option<u8>,
}

impl Keypad {
    /// Scanner for the expander at `address`.
    pub fn new(address: u8, debounce_ms: u64) -> Self {
        Self {
            expander: Pcf8574::new(address),
            debounce_ms,
            state: KEY_NONE,
            last_change_ms: None,
            last_key: None,
        }
    }

    /// Leave the expander in the idle scan state.
    pub fn begin(&mut self, bus: &mut dyn I2cBus) -> asm_common::hal::HalResult<()> {
        self.expander.write8(bus, HIGH_MASK)
    }

    /// Undebounced matrix index, [`KEY_NONE`] or [`KEY_FAIL`].
    pub fn read_raw(&mut self, bus: &mut dyn I2cBus) -> u8 {
        let Ok(high) = self.expander.scan(bus, HIGH_MASK) else {
            return KEY_FAIL;
        };
        if high == HIGH_MASK {
            return KEY_NONE;
        }
        let Some(index) = high_index(high) else {
            return KEY_FAIL;
        };
        let low = self.expander.scan(bus, LOW_MASK);
        // restore the idle pattern for the next is_pressed probe
        if self.expander.write8(bus, HIGH_MASK).is_err() {
            return KEY_FAIL;
        }
        match low.ok().and_then(low_offset) {
            Some(offset) => index + offset,
            None => KEY_FAIL,
        }
    }

    /// Whether any key is down. One read, no debounce.
    pub fn is_pressed(&mut self, bus: &mut dyn I2cBus) -> bool {
        match self.expander.read8(bus) {
            Ok(0xFF) | Err(_) => false,
            Ok(value) => value != HIGH_MASK,
        }
    }

    /// Debounced scan at `now_ms`.
    ///
    /// Returns the matrix index on an accepted press, [`KEY_THRESHOLD`]
    /// while a change is held back by the window, [`KEY_FAIL`] on a bus
    /// error or ambiguous pattern, and [`KEY_NONE`] otherwise.
    pub fn get_key(&mut self, bus: &mut dyn I2cBus, now_ms: u64) -> u8 {
        let raw = self.read_raw(bus);
        if raw == KEY_FAIL {
            return KEY_FAIL;
        }
        if raw == self.state {
            return KEY_NONE;
        }
        if self
            .last_change_ms
            .is_some_and(|at| now_ms.saturating_sub(at) < self.debounce_ms)
        {
            return KEY_THRESHOLD;
        }
        if self.state != KEY_NONE && raw != KEY_NONE {
            // key moved without a release
            return KEY_NONE;
        }

        trace!("keypad: {} -> {} at {} ms", self.state, raw, now_ms);
        self.state = raw;
        self.last_change_ms = Some(now_ms);
        if raw == KEY_NONE {
            return KEY_NONE;
        }
        self.last_key = Some(raw);
        raw
    }

    /// Last accepted press.
    pub fn last_key(&self) -> Option<u8> {
        self.last_key
    }

    /// Expander address.
    pub fn address(&self) -> u8 {
        self.expander.address()
    }
}
