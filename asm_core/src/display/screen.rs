//! Coordinate-checked text output on the character display.

use asm_common::hal::{CharDisplay, HalResult};
use tracing::debug;

/// Display API offered to pages.
///
/// Every call returns `false` instead of failing: out-of-range
/// coordinates are dropped, hardware errors are logged at debug.
pub struct Screen {
    display: Box<dyn CharDisplay>,
    cols: u8,
    rows: u8,
}

/// Map to the controller's character set; anything outside printable
/// ASCII becomes `?`.
fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c == ' ' || c.is_ascii_graphic() { c as u8 } else { b'?' })
        .collect()
}

impl Screen {
    /// Wrap a display.
    pub fn new(display: Box<dyn CharDisplay>) -> Self {
        let (cols, rows) = (display.cols(), display.rows());
        Self { display, cols, rows }
    }

    /// Initialise the controller.
    pub fn begin(&mut self) -> HalResult<()> {
        self.display.begin()
    }

    /// Columns.
    pub fn cols(&self) -> u8 {
        self.cols
    }

    /// Rows.
    pub fn rows(&self) -> u8 {
        self.rows
    }

    fn check(&self, op: &str, result: HalResult<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                debug!("display: {} failed: {}", op, e);
                false
            }
        }
    }

    fn in_range(&self, col: u8, row: u8) -> bool {
        col < self.cols && row < self.rows
    }

    /// Clear the screen and home the cursor.
    pub fn clean(&mut self) -> bool {
        let r = self.display.clear();
        self.check("clear", r)
    }

    /// Blank one row and leave the cursor at its start.
    pub fn clean_row(&mut self, row: u8) -> bool {
        if row >= self.rows {
            return false;
        }
        let blank = vec![b' '; self.cols as usize];
        let r = self
            .display
            .set_cursor(0, row)
            .and_then(|()| self.display.write_bytes(&blank))
            .and_then(|()| self.display.set_cursor(0, row));
        self.check("clean row", r)
    }

    /// Write at the cursor.
    pub fn print(&mut self, text: impl AsRef<str>) -> bool {
        let bytes = encode(text.as_ref());
        let r = self.display.write_bytes(&bytes);
        self.check("print", r)
    }

    /// Write starting at `(col, row)`.
    pub fn print_at(&mut self, col: u8, row: u8, text: impl AsRef<str>) -> bool {
        self.move_cursor(col, row) && self.print(text)
    }

    /// Move the cursor.
    pub fn move_cursor(&mut self, col: u8, row: u8) -> bool {
        if !self.in_range(col, row) {
            return false;
        }
        let r = self.display.set_cursor(col, row);
        self.check("cursor", r)
    }

    /// Switch the backlight.
    pub fn backlight(&mut self, on: bool) -> bool {
        let r = self.display.set_backlight(on);
        self.check("backlight", r)
    }

    /// Switch the display output.
    pub fn display(&mut self, on: bool) -> bool {
        let r = self.display.set_display(on);
        self.check("display", r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asm_hal::simulation::{SimDisplay, SimDisplayHandle};

    fn screen() -> (Screen, SimDisplayHandle) {
        let display = SimDisplay::new(20, 4);
        let handle = display.handle();
        let mut screen = Screen::new(Box::new(display));
        screen.begin().unwrap();
        (screen, handle)
    }

    #[test]
    fn test_print_at_and_clean_row() {
        let (mut screen, handle) = screen();
        assert!(screen.print_at(3, 1, "HELLO"));
        assert_eq!(&handle.row(1)[..8], "   HELLO");
        assert!(screen.clean_row(1));
        assert_eq!(handle.row(1), " ".repeat(20));
        assert_eq!(handle.cursor(), (0, 1));
    }

    #[test]
    fn test_out_of_range_dropped() {
        let (mut screen, handle) = screen();
        assert!(!screen.print_at(20, 0, "X"));
        assert!(!screen.print_at(0, 4, "X"));
        assert!(!screen.clean_row(4));
        assert!(handle.lines().iter().all(|l| l.trim().is_empty()));
    }

    #[test]
    fn test_non_ascii_replaced() {
        let (mut screen, handle) = screen();
        assert!(screen.print_at(0, 0, "a°b"));
        assert_eq!(&handle.row(0)[..3], "a?b");
    }

    #[test]
    fn test_switches() {
        let (mut screen, handle) = screen();
        assert!(screen.display(false));
        assert!(!handle.display_on());
        assert!(screen.backlight(false));
        assert!(!handle.backlight());
        assert!(screen.clean());
        assert_eq!(handle.clears(), 1);
    }
}
