//! Status taxonomy of the E220 driver.
//!
//! Each failure kind carries the numeric status code the module family
//! uses (`1` is success and never appears as an error) and the datasheet
//! description string.

use asm_common::hal::HalError;
use thiserror::Error;

/// Numeric status code of a successful operation.
pub const STATUS_SUCCESS: u8 = 1;

/// Driver failure kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoraError {
    /// Something that should not happen.
    #[error("Unknown")]
    Unknown,

    /// Feature not supported by this module.
    #[error("Not support!")]
    NotSupported,

    /// Operation has no implementation for this module family.
    #[error("Not implement")]
    NotImplemented,

    /// Driver used before `begin`.
    #[error("Not initial!")]
    NotInitialized,

    /// Caller passed an unusable argument.
    #[error("Invalid parameter!")]
    InvalidParam,

    /// Fewer bytes than expected were transferred.
    #[error("Data size not match!")]
    DataSizeMismatch,

    /// Destination buffer cannot hold the response.
    #[error("Buff too small!")]
    BufferTooSmall,

    /// AUX did not signal idle in time.
    #[error("Timeout!!")]
    Timeout,

    /// Underlying serial or GPIO failure.
    #[error("Hardware error! ({0})")]
    Hardware(#[from] HalError),

    /// Response header is not the expected `C1` echo.
    #[error("Save mode returned not recognized!")]
    HeadNotRecognized,

    /// Nothing was received.
    #[error("No response from device! (Check wiring)")]
    NoResponseFromDevice,

    /// Configuration mode requires the UART at 9600 bps.
    #[error("Wrong UART configuration! (BPS must be 9600 for configuration)")]
    WrongUartConfig,

    /// Module answered `FF FF FF`.
    #[error("Wrong format!")]
    WrongFormat,

    /// Wire frame longer than 200 bytes.
    #[error("The device support only 200byte of data transmission!")]
    PacketTooBig,
}

impl LoraError {
    /// Stable numeric status code.
    pub fn code(&self) -> u8 {
        match self {
            LoraError::Unknown => 2,
            LoraError::NotSupported => 3,
            LoraError::NotImplemented => 4,
            LoraError::NotInitialized => 5,
            LoraError::InvalidParam => 6,
            LoraError::DataSizeMismatch => 7,
            LoraError::BufferTooSmall => 8,
            LoraError::Timeout => 9,
            LoraError::Hardware(_) => 10,
            LoraError::HeadNotRecognized => 11,
            LoraError::NoResponseFromDevice => 12,
            LoraError::WrongUartConfig => 13,
            LoraError::WrongFormat => 14,
            LoraError::PacketTooBig => 15,
        }
    }

    /// Transient failures the workers retry on the next cycle.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LoraError::Timeout | LoraError::NoResponseFromDevice | LoraError::DataSizeMismatch
        )
    }
}

/// Description for any status code, success included.
pub fn status_description(code: u8) -> &'static str {
    match code {
        STATUS_SUCCESS => "Success",
        2 => "Unknown",
        3 => "Not support!",
        4 => "Not implement",
        5 => "Not initial!",
        6 => "Invalid parameter!",
        7 => "Data size not match!",
        8 => "Buff too small!",
        9 => "Timeout!!",
        10 => "Hardware error!",
        11 => "Save mode returned not recognized!",
        12 => "No response from device! (Check wiring)",
        13 => "Wrong UART configuration! (BPS must be 9600 for configuration)",
        14 => "Wrong format!",
        15 => "The device support only 200byte of data transmission!",
        _ => "Invalid status!",
    }
}

/// Result alias for driver operations.
pub type LoraResult<T> = Result<T, LoraError>;

/// Payload returned by receive operations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Received {
    /// Frame bytes with any RSSI byte removed.
    pub data: Vec<u8>,
    /// RSSI byte when the module appends one.
    pub rssi: Option<u8>,
}

impl Received {
    /// Payload as lossy UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_and_described() {
        let all = [
            LoraError::Unknown,
            LoraError::NotSupported,
            LoraError::NotImplemented,
            LoraError::NotInitialized,
            LoraError::InvalidParam,
            LoraError::DataSizeMismatch,
            LoraError::BufferTooSmall,
            LoraError::Timeout,
            LoraError::Hardware(HalError::Timeout("x".into())),
            LoraError::HeadNotRecognized,
            LoraError::NoResponseFromDevice,
            LoraError::WrongUartConfig,
            LoraError::WrongFormat,
            LoraError::PacketTooBig,
        ];
        for (i, e) in all.iter().enumerate() {
            assert_eq!(e.code() as usize, i + 2);
            assert_ne!(status_description(e.code()), "Invalid status!");
        }
        assert_eq!(status_description(STATUS_SUCCESS), "Success");
        assert_eq!(status_description(99), "Invalid status!");
    }

    #[test]
    fn test_hal_error_converts() {
        let e: LoraError = HalError::NotOpen("/dev/ttyS0".into()).into();
        assert_eq!(e.code(), 10);
        assert!(e.to_string().starts_with("Hardware error!"));
    }

    #[test]
    fn test_transient_kinds() {
        assert!(LoraError::NoResponseFromDevice.is_transient());
        assert!(!LoraError::PacketTooBig.is_transient());
    }
}
