//! Airsoft LoRa Library
//!
//! Driver for Ebyte E220 LoRa modules (UART + M0/M1/AUX lines).
//!
//! # Module Structure
//!
//! - [`driver`] - Mode switching, register access, message TX/RX
//! - [`config`] - 8-byte configuration record and field descriptions
//! - [`frame`] - Transparent, fixed-address and configuration frames
//! - [`mode`] - Operating modes and their pin levels
//! - [`error`] - Status taxonomy
//! - [`consts`] - Command bytes, register addresses, timing
//! - [`cipher`] - Keeloq-style block cipher
//!
//! # Usage
//!
//! ```rust
//! use asm_lora::frame::{self, FixedTarget};
//!
//! let wire = frame::fixed(FixedTarget::broadcast(0x04), b"HELLO").unwrap();
//! assert_eq!(&wire[..3], &[0xFF, 0xFF, 0x04]);
//! ```

#![deny(missing_docs)]

pub mod cipher;
pub mod config;
pub mod consts;
pub mod driver;
pub mod error;
pub mod frame;
pub mod mode;

pub use config::{Configuration, ModuleInfo, TransmissionFlags};
pub use consts::SaveType;
pub use driver::{E220, E220Pins};
pub use error::{LoraError, LoraResult, Received};
pub use mode::ModeType;
