//! # Airsoft Game Machine Core
//!
//! Device workers, the display page engine and the supervisor that ties
//! them together.
//!
//! # Module Structure
//!
//! - [`supervisor`] - Startup order, page loop, reverse shutdown
//! - [`worker`] - Worker trait and thread handles
//! - [`radio`] - LoRa worker with inbox/outbox mailboxes
//! - [`gnss`] - NMEA worker and fix snapshot
//! - [`inout`] - Lamp/relay outputs and keystroke queue
//! - [`keypad`] - Debounced 4x4 matrix scanner
//! - [`blink`] - Status lamp timer
//! - [`display`] - Page stack, screen API, main page
//! - [`services`] - Worker handles as seen by pages
//! - [`board`] - Linux and simulated device assembly
//! - [`error`] - Worker and supervisor errors
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   Supervisor (main thread)                   │
//! │   keystrokes ──► PageEngine ──► Screen ──► CharDisplay       │
//! └───────┬──────────────┬────────────────┬─────────────┬────────┘
//!         │ RadioLink    │ GnssSnapshot   │ IoPort      │
//!         ▼              ▼                ▼             ▼
//!   ┌──────────┐   ┌──────────┐    ┌──────────┐   ┌──────────┐
//!   │  radio   │   │   gnss   │    │    io    │   │  blink   │
//!   │  E220    │   │  NMEA    │    │ PCF8574  │   │  GPIO    │
//!   └──────────┘   └──────────┘    └──────────┘   └──────────┘
//! ```

#![deny(missing_docs)]

pub mod blink;
pub mod board;
pub mod display;
pub mod error;
pub mod gnss;
pub mod inout;
pub mod keypad;
pub mod radio;
pub mod services;
pub mod supervisor;
pub mod worker;

pub use board::{Board, SimHandles};
pub use error::{SupervisorError, WorkerError};
pub use supervisor::Supervisor;
