//! Wire constants of the E220 command protocol.

/// Command byte of a host-to-module register command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProgramCommand {
    /// Write registers and keep them across power cycles.
    WritePersist = 0xC0,
    /// Read registers; also the header of every successful reply.
    Read = 0xC1,
    /// Write registers until the next power cycle.
    WriteVolatile = 0xC2,
    /// Reply header of a malformed command.
    WrongFormat = 0xFF,
    /// Prefix of an over-the-air configuration message.
    WifiConfig = 0xCF,
}

impl ProgramCommand {
    /// Wire byte.
    pub const fn byte(self) -> u8 {
        self as u8
    }
}

/// How a configuration write is stored by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveType {
    /// `C0`: survives power cycles.
    Persist,
    /// `C2`: lost at power off.
    #[default]
    Volatile,
}

impl SaveType {
    /// Command used for the write.
    pub const fn command(self) -> ProgramCommand {
        match self {
            SaveType::Persist => ProgramCommand::WritePersist,
            SaveType::Volatile => ProgramCommand::WriteVolatile,
        }
    }
}

/// First configuration register.
pub const REG_ADDRESS_CFG: u8 = 0x00;
/// First module information register.
pub const REG_ADDRESS_PID: u8 = 0x08;

/// Length of the configuration record.
pub const PL_CONFIGURATION: u8 = 0x08;
/// Length of the module information record.
pub const PL_PID: u8 = 0x03;

/// Command header length (`command, address, length`).
pub const HEADER_LEN: usize = 3;

/// Largest frame the module accepts on its UART.
pub const MAX_TX_PACKET: usize = 200;

/// Bytes taken by the fixed-transmission prefix (`addrH addrL channel`).
pub const FIXED_PREFIX_LEN: usize = 3;

/// Address byte meaning "every module" in fixed transmission.
pub const BROADCAST_ADDRESS: u8 = 0xFF;

/// Largest read of the "whatever is buffered" receive flavor.
pub const MAX_RX_PACKET: usize = 255;

/// Timing of the driver, in milliseconds.
pub mod timing {
    /// Wait on each side of the M0/M1 write.
    pub const MODE_SETTLE_MS: u64 = 40;
    /// Upper bound of the AUX wait after a mode change.
    pub const MODE_AUX_TIMEOUT_MS: u64 = 1000;
    /// Pause after AUX reports idle, before the next UART byte.
    pub const AUX_IDLE_GUARD_MS: u64 = 2;
    /// Fixed wait replacing AUX when it is not wired.
    pub const NO_AUX_WAIT_MS: u64 = 100;
    /// AUX cap after a data frame.
    pub const SEND_TIMEOUT_MS: u64 = 5000;
    /// AUX cap after a sized receive.
    pub const RECEIVE_TIMEOUT_MS: u64 = 1000;
    /// Pause after each register command.
    pub const PROGRAM_COMMAND_WAIT_MS: u64 = 50;
    /// Power-on delay in `begin`.
    pub const BEGIN_WAIT_MS: u64 = 250;
    /// Serial read timeout set by `begin`.
    pub const SERIAL_TIMEOUT_MS: u64 = 100;
}

/// UART rate required in configuration mode.
pub const CONFIG_BAUD: u32 = 9600;

/// Band offset of the 868 MHz parts.
pub const DEFAULT_BAND_MHZ: u32 = 850;
