//! Character display seam.

use super::error::HalResult;

/// Character LCD addressed by column/row.
///
/// Writes start at the current cursor; characters past the last column of
/// the row are dropped by the implementation.
pub trait CharDisplay: Send {
    /// Initialise the controller and clear the screen.
    fn begin(&mut self) -> HalResult<()>;

    /// Number of columns.
    fn cols(&self) -> u8;

    /// Number of rows.
    fn rows(&self) -> u8;

    /// Clear all rows and home the cursor.
    fn clear(&mut self) -> HalResult<()>;

    /// Move the cursor. Out-of-range coordinates are an error.
    fn set_cursor(&mut self, col: u8, row: u8) -> HalResult<()>;

    /// Write raw character codes at the cursor.
    fn write_bytes(&mut self, data: &[u8]) -> HalResult<()>;

    /// Switch the backlight.
    fn set_backlight(&mut self, on: bool) -> HalResult<()>;

    /// Switch the display output (contents are retained).
    fn set_display(&mut self, on: bool) -> HalResult<()>;
}
