//! Airsoft GNSS Library
//!
//! Streaming NMEA 0183 decoding for the on-board receiver.
//!
//! # Module Structure
//!
//! - [`parser`] - Character-level state machine, interval merging, statistics
//! - [`fix`] - Fix model with per-field validity
//! - [`sentence`] - Recognised sentence tags
//! - [`format`] - Checksummed framing, polls, GGA/RMC output
//! - [`time`] - Date and time with calendar checks
//!
//! # Usage
//!
//! ```rust
//! use asm_gnss::{NmeaParser, format_sentence};
//!
//! let mut parser = NmeaParser::new();
//! parser.feed(format_sentence("GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,").as_bytes());
//! parser.feed(format_sentence("GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,,,A").as_bytes());
//!
//! let fix = parser.latest().unwrap();
//! assert_eq!(fix.satellites, 8);
//! assert_eq!(fix.date.year, 2094);
//! ```

#![deny(missing_docs)]

mod field;
pub mod fix;
pub mod format;
pub mod parser;
pub mod sentence;
pub mod time;

pub use fix::{Fix, Satellite, Status, Valid};
pub use format::{checksum, format_gga, format_rmc, format_sentence, poll_message};
pub use parser::{Decode, NmeaParser, Statistics};
pub use sentence::Sentence;
pub use time::{Date, Time};
