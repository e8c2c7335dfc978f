//! Simulated character display: a text buffer.

use asm_common::hal::{CharDisplay, HalError, HalResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug)]
struct Screen {
    cols: u8,
    rows: u8,
    cells: Vec<u8>,
    col: u8,
    row: u8,
    backlight: bool,
    display_on: bool,
    began: bool,
    clears: usize,
}

impl Screen {
    fn row_text(&self, row: u8) -> String {
        let start = row as usize * self.cols as usize;
        self.cells[start..start + self.cols as usize]
            .iter()
            .map(|&b| b as char)
            .collect()
    }
}

/// Test-side view of a [`SimDisplay`].
#[derive(Clone)]
pub struct SimDisplayHandle {
    screen: Arc<Mutex<Screen>>,
}

impl SimDisplayHandle {
    /// Contents of one row, padded with spaces.
    pub fn row(&self, row: u8) -> String {
        let screen = self.screen.lock();
        if row >= screen.rows {
            return String::new();
        }
        screen.row_text(row)
    }

    /// All rows.
    pub fn lines(&self) -> Vec<String> {
        let screen = self.screen.lock();
        (0..screen.rows).map(|r| screen.row_text(r)).collect()
    }

    /// Cursor position as `(col, row)`.
    pub fn cursor(&self) -> (u8, u8) {
        let screen = self.screen.lock();
        (screen.col, screen.row)
    }

    /// Backlight state.
    pub fn backlight(&self) -> bool {
        self.screen.lock().backlight
    }

    /// Display output state.
    pub fn display_on(&self) -> bool {
        self.screen.lock().display_on
    }

    /// Whether `begin` was called.
    pub fn began(&self) -> bool {
        self.screen.lock().began
    }

    /// Number of full clears.
    pub fn clears(&self) -> usize {
        self.screen.lock().clears
    }
}

/// In-memory [`CharDisplay`].
pub struct SimDisplay {
    screen: Arc<Mutex<Screen>>,
}

impl SimDisplay {
    /// Blank `cols` x `rows` display.
    pub fn new(cols: u8, rows: u8) -> Self {
        Self {
            screen: Arc::new(Mutex::new(Screen {
                cols,
                rows,
                cells: vec![b' '; cols as usize * rows as usize],
                col: 0,
                row: 0,
                backlight: true,
                display_on: false,
                began: false,
                clears: 0,
            })),
        }
    }

    /// Test-side handle.
    pub fn handle(&self) -> SimDisplayHandle {
        SimDisplayHandle {
            screen: Arc::clone(&self.screen),
        }
    }
}

impl CharDisplay for SimDisplay {
    fn begin(&mut self) -> HalResult<()> {
        let mut screen = self.screen.lock();
        screen.began = true;
        screen.display_on = true;
        screen.cells.fill(b' ');
        screen.col = 0;
        screen.row = 0;
        Ok(())
    }

    fn cols(&self) -> u8 {
        self.screen.lock().cols
    }

    fn rows(&self) -> u8 {
        self.screen.lock().rows
    }

    fn clear(&mut self) -> HalResult<()> {
        let mut screen = self.screen.lock();
        screen.cells.fill(b' ');
        screen.col = 0;
        screen.row = 0;
        screen.clears += 1;
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> HalResult<()> {
        let mut screen = self.screen.lock();
        if col >= screen.cols || row >= screen.rows {
            return Err(HalError::InvalidParam(format!("cursor {col},{row}")));
        }
        screen.col = col;
        screen.row = row;
        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> HalResult<()> {
        let mut screen = self.screen.lock();
        for &c in data {
            if screen.col >= screen.cols {
                break;
            }
            let idx = screen.row as usize * screen.cols as usize + screen.col as usize;
            screen.cells[idx] = c;
            screen.col += 1;
        }
        trace!("display row {}: {:?}", screen.row, screen.row_text(screen.row));
        Ok(())
    }

    fn set_backlight(&mut self, on: bool) -> HalResult<()> {
        let mut screen = self.screen.lock();
        screen.backlight = on;
        screen.display_on = on;
        Ok(())
    }

    fn set_display(&mut self, on: bool) -> HalResult<()> {
        self.screen.lock().display_on = on;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_clip() {
        let mut display = SimDisplay::new(20, 4);
        let handle = display.handle();
        display.begin().unwrap();
        display.set_cursor(17, 2).unwrap();
        display.write_bytes(b"ABCDE").unwrap();
        assert_eq!(handle.row(2), format!("{}ABC", " ".repeat(17)));
        assert_eq!(handle.cursor(), (20, 2));
        assert!(display.set_cursor(0, 4).is_err());
    }

    #[test]
    fn test_clear_and_flags() {
        let mut display = SimDisplay::new(16, 2);
        let handle = display.handle();
        display.write_bytes(b"hi").unwrap();
        display.clear().unwrap();
        assert_eq!(handle.row(0), " ".repeat(16));
        assert_eq!(handle.clears(), 1);
        display.set_backlight(false).unwrap();
        assert!(!handle.backlight());
        assert!(!handle.display_on());
    }
}
