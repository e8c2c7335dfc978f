//! HD44780 character LCD behind a PCF8574 backpack, driven in 4-bit mode.
//!
//! Backpack wiring: RS = bit 0, RW = bit 1, EN = bit 2, backlight = bit 3,
//! D4..D7 = bits 4..7. Every byte is clocked as two nibbles, each latched
//! by an EN high/low pair.

use asm_common::hal::{CharDisplay, HalError, HalResult, I2cBus};
use asm_common::time::{Clock, SharedClock};
use tracing::debug;

const LCD_CLEARDISPLAY: u8 = 0x01;
const LCD_DISPLAYCONTROL: u8 = 0x08;
const LCD_FUNCTIONSET: u8 = 0x20;
const LCD_SETDDRAMADDR: u8 = 0x80;

const LCD_DISPLAYON: u8 = 0x04;
const LCD_2LINE: u8 = 0x08;

const PIN_RS: u8 = 0x01;
const PIN_EN: u8 = 0x04;
const PIN_BACKLIGHT: u8 = 0x08;

/// Character LCD on an I²C backpack.
pub struct I2cLcd {
    bus: Box<dyn I2cBus>,
    address: u8,
    cols: u8,
    rows: u8,
    clock: SharedClock,
    backlight: bool,
    display_control: u8,
    pos: u8,
}

impl I2cLcd {
    /// Display of `cols` x `rows` at `address`. Nothing is sent until
    /// [`CharDisplay::begin`].
    pub fn new(bus: Box<dyn I2cBus>, address: u8, cols: u8, rows: u8, clock: SharedClock) -> Self {
        Self {
            bus,
            address,
            cols,
            rows,
            clock,
            backlight: true,
            display_control: LCD_DISPLAYCONTROL,
            pos: 0,
        }
    }

    fn backlight_bit(&self) -> u8 {
        if self.backlight { PIN_BACKLIGHT } else { 0 }
    }

    fn write4bits(&mut self, nibble: u8) -> HalResult<()> {
        let value = (nibble << 4) | self.backlight_bit();
        self.bus.write(self.address, &[value | PIN_EN, value])
    }

    fn send(&mut self, value: u8, data: bool) -> HalResult<()> {
        let mut msn = if data { PIN_RS } else { 0 };
        msn |= self.backlight_bit();
        let mut lsn = msn;
        msn |= value & 0xF0;
        lsn |= value << 4;
        self.bus
            .write(self.address, &[msn | PIN_EN, msn, lsn | PIN_EN, lsn])
    }

    fn command(&mut self, value: u8) -> HalResult<()> {
        self.send(value, false)
    }
}

impl CharDisplay for I2cLcd {
    fn begin(&mut self) -> HalResult<()> {
        if !self.bus.probe(self.address) {
            return Err(HalError::Bus {
                address: self.address,
                reason: "display not connected".to_string(),
            });
        }
        self.bus.write(self.address, &[0x00])?;
        self.clock.sleep_ms(100);

        // Force 4-bit mode: three 8-bit function sets, then the 4-bit switch.
        self.write4bits(0x03)?;
        self.clock.sleep_ms(5);
        self.write4bits(0x03)?;
        self.clock.sleep_ms(1);
        self.write4bits(0x03)?;
        self.clock.sleep_ms(1);
        self.write4bits(0x02)?;
        self.clock.sleep_ms(1);

        self.command(LCD_FUNCTIONSET | LCD_2LINE)?;
        self.set_display(true)?;
        self.clear()?;
        debug!(
            "LCD {}x{} at 0x{:02X} on {} ready",
            self.cols,
            self.rows,
            self.address,
            self.bus.name()
        );
        Ok(())
    }

    fn cols(&self) -> u8 {
        self.cols
    }

    fn rows(&self) -> u8 {
        self.rows
    }

    fn clear(&mut self) -> HalResult<()> {
        self.command(LCD_CLEARDISPLAY)?;
        self.pos = 0;
        self.clock.sleep_ms(2);
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> HalResult<()> {
        if col >= self.cols || row >= self.rows {
            return Err(HalError::InvalidParam(format!("cursor {col},{row}")));
        }
        let mut offset = col;
        if row & 0x01 != 0 {
            offset += 0x40;
        }
        if row & 0x02 != 0 {
            offset += self.cols;
        }
        self.pos = col;
        self.command(LCD_SETDDRAMADDR | offset)
    }

    fn write_bytes(&mut self, data: &[u8]) -> HalResult<()> {
        for &c in data {
            if self.pos >= self.cols {
                break;
            }
            self.send(c, true)?;
            self.pos += 1;
        }
        Ok(())
    }

    fn set_backlight(&mut self, on: bool) -> HalResult<()> {
        self.backlight = on;
        self.set_display(on)
    }

    fn set_display(&mut self, on: bool) -> HalResult<()> {
        if on {
            self.display_control |= LCD_DISPLAYON;
        } else {
            self.display_control &= !LCD_DISPLAYON;
        }
        self.command(self.display_control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::SimI2cBus;
    use asm_common::time::SimClock;

    fn lcd() -> (I2cLcd, crate::simulation::SimI2cHandle) {
        let bus = SimI2cBus::new();
        let handle = bus.handle();
        handle.add_device(0x27);
        let lcd = I2cLcd::new(Box::new(bus), 0x27, 20, 4, SimClock::shared());
        (lcd, handle)
    }

    #[test]
    fn test_send_clocks_two_nibbles() {
        let (mut lcd, handle) = lcd();
        lcd.write_bytes(b"A").unwrap();
        // 'A' = 0x41, RS + backlight = 0x09
        assert_eq!(handle.writes(0x27).last().unwrap(), &vec![0x4D, 0x49, 0x1D, 0x19]);
    }

    #[test]
    fn test_begin_sequence() {
        let (mut lcd, handle) = lcd();
        lcd.begin().unwrap();
        let writes = handle.writes(0x27);
        assert_eq!(writes[0], vec![0x00]);
        assert_eq!(writes[1], vec![0x3C, 0x38]);
        assert_eq!(writes[4], vec![0x2C, 0x28]);
        // FUNCTIONSET | 2LINE = 0x28
        assert_eq!(writes[5], vec![0x2C, 0x28, 0x8C, 0x88]);
        // display on = 0x0C, then clear
        assert_eq!(writes[6], vec![0x0C, 0x08, 0xCC, 0xC8]);
        assert_eq!(writes[7], vec![0x0C, 0x08, 0x1C, 0x18]);
    }

    #[test]
    fn test_row_offsets() {
        let (mut lcd, handle) = lcd();
        let addr = |h: &crate::simulation::SimI2cHandle| {
            let w = h.writes(0x27);
            let last = w.last().unwrap();
            (last[1] & 0xF0) | (last[3] >> 4)
        };
        lcd.set_cursor(0, 0).unwrap();
        assert_eq!(addr(&handle), 0x80);
        lcd.set_cursor(3, 1).unwrap();
        assert_eq!(addr(&handle), 0x80 | 0x43);
        lcd.set_cursor(0, 2).unwrap();
        assert_eq!(addr(&handle), 0x80 | 20);
        lcd.set_cursor(19, 3).unwrap();
        assert_eq!(addr(&handle), 0x80 | (0x40 + 20 + 19));
        assert!(lcd.set_cursor(20, 0).is_err());
        assert!(lcd.set_cursor(0, 4).is_err());
    }

    #[test]
    fn test_writes_past_last_column_dropped() {
        let (mut lcd, handle) = lcd();
        lcd.set_cursor(18, 0).unwrap();
        let before = handle.writes(0x27).len();
        lcd.write_bytes(b"XYZ").unwrap();
        assert_eq!(handle.writes(0x27).len(), before + 2);
    }

    #[test]
    fn test_backlight_off_clears_bit() {
        let (mut lcd, handle) = lcd();
        lcd.set_backlight(false).unwrap();
        let last = handle.writes(0x27).last().unwrap().clone();
        assert!(last.iter().all(|b| b & PIN_BACKLIGHT == 0));
    }

    #[test]
    fn test_begin_without_device() {
        let bus = SimI2cBus::new();
        let mut lcd = I2cLcd::new(Box::new(bus), 0x27, 20, 4, SimClock::shared());
        assert!(matches!(lcd.begin(), Err(HalError::Bus { address: 0x27, .. })));
    }
}
