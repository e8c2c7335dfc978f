//! Error type shared by all hardware backends.

use thiserror::Error;

/// Error types for hardware seam operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// Device node could not be opened or configured.
    #[error("failed to open {path}: {reason}")]
    OpenFailed {
        /// Device path (e.g. `/dev/ttyS0`).
        path: String,
        /// OS error text.
        reason: String,
    },

    /// Operation attempted on a device that is not open.
    #[error("device not open: {0}")]
    NotOpen(String),

    /// Read/write/ioctl failed on an open device.
    #[error("I/O error on {device}: {reason}")]
    Io {
        /// Device path or name.
        device: String,
        /// OS error text.
        reason: String,
    },

    /// Blocking call exceeded its timeout.
    #[error("timeout on {0}")]
    Timeout(String),

    /// Rejected argument (unsupported baud rate, pin out of range, ...).
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// I²C slave did not acknowledge.
    #[error("bus error at address 0x{address:02X}: {reason}")]
    Bus {
        /// 7-bit slave address.
        address: u8,
        /// OS error text.
        reason: String,
    },
}

/// Result alias for hardware seam operations.
pub type HalResult<T> = Result<T, HalError>;

impl HalError {
    /// Build an [`HalError::Io`] from a device name and any displayable error.
    pub fn io(device: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        HalError::Io {
            device: device.into(),
            reason: reason.to_string(),
        }
    }

    /// Build an [`HalError::OpenFailed`] from a path and any displayable error.
    pub fn open(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        HalError::OpenFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
