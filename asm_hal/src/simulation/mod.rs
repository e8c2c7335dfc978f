//! In-memory hardware.
//!
//! Every seam has a simulated backend whose far side is observable and
//! controllable through a cloneable handle. All timing goes through a
//! [`asm_common::time::Clock`], so tests pair these with a `SimClock` and
//! check timing contracts in virtual milliseconds; `--simulate` pairs them
//! with the system clock.

mod display;
mod e220;
mod feed;
mod gpio;
mod i2c;
mod serial;

pub use display::{SimDisplay, SimDisplayHandle};
pub use e220::{FACTORY_REGISTERS, MODULE_INFO, SimE220};
pub use feed::PeriodicFeed;
pub use gpio::{PinEvent, SimGpio, SimPin};
pub use i2c::{SimI2cBus, SimI2cHandle};
pub use serial::{SimPeer, SimSerial, SimSerialHandle, TxRecord};
