//! Common re-exports for convenience.

pub use crate::config::{ConfigError, ConfigLoader, HostConfig, LogLevel, MachineConfig};
pub use crate::hal::{
    CharDisplay, Direction, GpioId, GpioLine, HalError, HalResult, I2cBus, Level, Parity,
    SerialConfig, SerialLine, SharedI2cBus, StopBits, share_bus,
};
pub use crate::io::{IoId, KEY_FAIL, KEY_NONE, KEY_THRESHOLD, KeyEvent, Keymap};
pub use crate::time::{Clock, SharedClock, SimClock, SystemClock};
