//! Airsoft Common Library
//!
//! Shared configuration, hardware seams and board constants used by every
//! crate of the game-machine controller.
//!
//! # Module Structure
//!
//! - [`config`] - Host `key=value` file and TOML machine wiring
//! - [`hal`] - Hardware seam traits (serial, GPIO, I²C, character display)
//! - [`io`] - Lamp/relay map and keystroke types
//! - [`time`] - Clock abstraction (system and simulated)
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use asm_common::prelude::*;
//!
//! let host = HostConfig::parse("address_high=18\naddress_low=52\n").unwrap();
//! assert_eq!((host.address_high, host.address_low), (0x12, 0x34));
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod hal;
pub mod io;
pub mod prelude;
pub mod time;
