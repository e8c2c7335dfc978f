//! Hardware seams.
//!
//! Every device the controller talks to sits behind one of the narrow traits
//! below. Linux backends live in `asm_hal`, together with in-memory
//! simulation backends used by `--simulate` and by the test suites.
//!
//! ```text
//!   asm_lora ──► SerialLine + GpioLine (AUX, M0, M1)
//!   asm_core ──► SerialLine (GNSS)
//!            ──► I2cBus (expanders, keypad)   shared, one mutex
//!            ──► CharDisplay (20x4 LCD)       supervisor thread only
//!            ──► GpioLine (status lamp)       blink timer thread only
//! ```

pub mod consts;
pub mod display;
pub mod error;
pub mod gpio;
pub mod i2c;
pub mod serial;

pub use display::CharDisplay;
pub use error::{HalError, HalResult};
pub use gpio::{Direction, GpioId, GpioLine, Level};
pub use i2c::{I2cBus, SharedI2cBus, share_bus};
pub use serial::{Parity, SerialConfig, SerialLine, StopBits};
