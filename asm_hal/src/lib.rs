//! # Airsoft HAL Library
//!
//! Concrete backends for the hardware seams declared in `asm_common::hal`.
//!
//! # Module Structure
//!
//! - [`serial`] - tty serial line ([`LinuxSerial`])
//! - [`gpio`] - sysfs digital line ([`SysfsGpio`])
//! - [`i2c`] - `/dev/i2c-N` bus master ([`LinuxI2cBus`])
//! - [`pcf8574`] - 8-bit quasi-bidirectional expander
//! - [`lcd`] - HD44780 character LCD behind a PCF8574 backpack ([`I2cLcd`])
//! - [`simulation`] - In-memory stand-ins for every seam and a simulated E220
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        asm_hal                               │
//! │  ┌────────────┐  ┌───────────┐  ┌──────────┐  ┌───────────┐  │
//! │  │ LinuxSerial│  │ SysfsGpio │  │LinuxI2cBus│ │  I2cLcd   │  │
//! │  └─────┬──────┘  └─────┬─────┘  └────┬─────┘  └─────┬─────┘  │
//! │        ▼               ▼             ▼              ▼        │
//! │   SerialLine       GpioLine        I2cBus      CharDisplay   │
//! │        ▲               ▲             ▲              ▲        │
//! │  ┌─────┴──────┐  ┌─────┴─────┐  ┌────┴─────┐  ┌─────┴─────┐  │
//! │  │ SimSerial  │  │  SimGpio  │  │SimI2cBus │  │SimDisplay │  │
//! │  └────────────┘  └───────────┘  └──────────┘  └───────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod gpio;
pub mod i2c;
pub mod lcd;
pub mod pcf8574;
pub mod serial;
pub mod simulation;

pub use gpio::SysfsGpio;
pub use i2c::LinuxI2cBus;
pub use lcd::I2cLcd;
pub use pcf8574::Pcf8574;
pub use serial::LinuxSerial;
