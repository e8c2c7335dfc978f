//! Operating modes selected by the M0/M1 lines.

use std::fmt;

use asm_common::hal::Level;

/// Module operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeType {
    /// M1=0 M0=0: data TX/RX at the configured rate.
    #[default]
    Normal,
    /// M1=0 M0=1: wake-on-radio transmitter.
    WorTransmitter,
    /// M1=1 M0=0: wake-on-radio receiver.
    WorReceiver,
    /// M1=1 M0=1: register access, UART must run at 9600.
    Configuration,
}

impl ModeType {
    /// Levels to drive, as `(m0, m1)`.
    pub const fn pins(self) -> (Level, Level) {
        match self {
            ModeType::Normal => (Level::Low, Level::Low),
            ModeType::WorTransmitter => (Level::High, Level::Low),
            ModeType::WorReceiver => (Level::Low, Level::High),
            ModeType::Configuration => (Level::High, Level::High),
        }
    }

    /// Mode selected by the given line levels.
    pub const fn from_pins(m0: Level, m1: Level) -> Self {
        match (m0, m1) {
            (Level::Low, Level::Low) => ModeType::Normal,
            (Level::High, Level::Low) => ModeType::WorTransmitter,
            (Level::Low, Level::High) => ModeType::WorReceiver,
            (Level::High, Level::High) => ModeType::Configuration,
        }
    }

    /// Whether the mode needs the UART at 9600 bps.
    pub const fn requires_config_baud(self) -> bool {
        matches!(self, ModeType::Configuration)
    }
}

impl fmt::Display for ModeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModeType::Normal => "normal",
            ModeType::WorTransmitter => "wor-transmitter",
            ModeType::WorReceiver => "wor-receiver",
            ModeType::Configuration => "configuration",
        })
    }
}
