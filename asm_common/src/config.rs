//! Configuration loading traits and types.
//!
//! Two files configure the controller:
//!
//! - the **host file** `<cwd>/airsoft/asm-config.cfg`, plain `key=value`
//!   lines carrying the radio address of this unit ([`HostConfig`]);
//! - an optional **machine file** in TOML describing board wiring
//!   ([`MachineConfig`]). Every field has a default matching the production
//!   board, so the file only lists what differs.
//!
//! # Usage
//!
//! ```rust,no_run
//! use asm_common::config::{ConfigError, ConfigLoader, HostConfig, MachineConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let host = HostConfig::load(Path::new("airsoft"))?;
//!     let machine = MachineConfig::load(Path::new("machine.toml"))?;
//!     machine.validate()?;
//!     println!("unit {:02X}{:02X} on {}", host.address_high, host.address_low, machine.radio.device);
//!     Ok(())
//! }
//! ```

use crate::hal::consts::*;
use crate::hal::gpio::GpioId;
use crate::hal::serial::is_supported_baud;
use crate::io::Keymap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// File could not be read or parsed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = read_file(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Any serde-deserializable struct can use ConfigLoader.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(path.to_path_buf())
        } else {
            ConfigError::ParseError(format!("{}: {}", path.display(), e))
        }
    })
}

// ─── Host file ──────────────────────────────────────────────────────

/// Radio identity of this unit, read from the host `key=value` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostConfig {
    /// High byte of the module address.
    pub address_high: u8,
    /// Low byte of the module address.
    pub address_low: u8,
}

impl HostConfig {
    /// `<cwd>/airsoft`.
    pub fn default_dir() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(CONFIG_DIR)
    }

    /// Read `asm-config.cfg` from `dir`.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        let content = read_file(&path)?;
        let config = Self::parse(&content)?;
        tracing::info!(
            "Host configuration {}: address {:02X}{:02X}",
            path.display(),
            config.address_high,
            config.address_low
        );
        Ok(config)
    }

    /// Parse `key=value` lines. Unknown keys, blank lines and `#` comments
    /// are ignored; missing keys keep their zero default.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "address_high" => config.address_high = parse_byte("address_high", value)?,
                "address_low" => config.address_low = parse_byte("address_low", value)?,
                _ => {}
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject the broadcast address, which is never assigned to a unit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address_high == 0xFF && self.address_low == 0xFF {
            return Err(ConfigError::ValidationError(
                "address FFFF is the broadcast address".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_byte(key: &str, value: &str) -> Result<u8, ConfigError> {
    value.trim().parse::<u8>().map_err(|_| {
        ConfigError::ValidationError(format!("{key} must be 0..255, got '{}'", value.trim()))
    })
}

// ─── Machine file ───────────────────────────────────────────────────

/// Board wiring and worker cadence.
///
/// # TOML Example
///
/// ```toml
/// log_level = "debug"
///
/// [radio]
/// channel = 4
/// aux_wired = false
///
/// [io]
/// debounce_ms = 80
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct MachineConfig {
    /// Default log verbosity.
    pub log_level: LogLevel,
    /// LoRa radio.
    pub radio: RadioConfig,
    /// GNSS receiver.
    pub gnss: GnssConfig,
    /// Expanders and keypad.
    pub io: IoConfig,
    /// Character display.
    pub display: DisplayConfig,
    /// Status lamp.
    pub status_led: StatusLedConfig,
    /// Supervisor lifecycle.
    pub supervisor: SupervisorConfig,
}

/// LoRa radio wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RadioConfig {
    /// Serial device.
    pub device: String,
    /// Whether the AUX line is connected.
    pub aux_wired: bool,
    /// AUX line.
    pub aux_pin: GpioId,
    /// M0 line.
    pub m0_pin: GpioId,
    /// M1 line.
    pub m1_pin: GpioId,
    /// Channel used for outbound broadcasts.
    pub channel: u8,
    /// Band offset in MHz (410, 220, 850 or 900).
    pub band_mhz: u16,
    /// Capacity of each mailbox.
    pub mailbox_capacity: usize,
    /// Worker loop period.
    pub loop_interval_ms: u64,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            device: LORA_SERIAL_DEVICE.to_string(),
            aux_wired: true,
            aux_pin: LORA_AUX_PIN,
            m0_pin: LORA_M0_PIN,
            m1_pin: LORA_M1_PIN,
            channel: 0x04,
            band_mhz: 850,
            mailbox_capacity: 32,
            loop_interval_ms: 100,
        }
    }
}

/// GNSS receiver wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GnssConfig {
    /// Serial device.
    pub device: String,
    /// Line speed.
    pub baud_rate: u32,
    /// Worker loop period.
    pub loop_interval_ms: u64,
}

impl Default for GnssConfig {
    fn default() -> Self {
        Self {
            device: GNSS_SERIAL_DEVICE.to_string(),
            baud_rate: GNSS_BAUD,
            loop_interval_ms: 100,
        }
    }
}

/// Expander and keypad wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IoConfig {
    /// I²C bus device.
    pub bus: String,
    /// Address of the IO0..7 expander.
    pub low_expander: u8,
    /// Address of the IO8..15 expander.
    pub high_expander: u8,
    /// Address of the keypad expander.
    pub keypad: u8,
    /// Debounce window.
    pub debounce_ms: u64,
    /// Keypad scan period.
    pub scan_interval_ms: u64,
    /// 16-character keymap.
    pub keymap: String,
    /// Capacity of the keystroke queue.
    pub queue_capacity: usize,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            bus: IO_I2C_BUS.to_string(),
            low_expander: IO0_7_ADDR,
            high_expander: IO8_15_ADDR,
            keypad: KEYPAD_ADDR,
            debounce_ms: 100,
            scan_interval_ms: 10,
            keymap: crate::io::DEFAULT_KEYMAP.to_string(),
            queue_capacity: 32,
        }
    }
}

/// Display wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// I²C bus device.
    pub bus: String,
    /// Backpack address.
    pub address: u8,
    /// Columns.
    pub cols: u8,
    /// Rows.
    pub rows: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            bus: DISPLAY_I2C_BUS.to_string(),
            address: DISPLAY_ADDR,
            cols: DISPLAY_COLS,
            rows: DISPLAY_ROWS,
        }
    }
}

/// Status lamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatusLedConfig {
    /// Lamp line.
    pub pin: GpioId,
    /// Toggle period.
    pub blink_interval_ms: u64,
}

impl Default for StatusLedConfig {
    fn default() -> Self {
        Self {
            pin: STATUS_LED_PIN,
            blink_interval_ms: 500,
        }
    }
}

/// Supervisor lifecycle limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupervisorConfig {
    /// Upper bound on joining one worker at shutdown.
    pub join_timeout_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            join_timeout_ms: 10_000,
        }
    }
}

/// Band offsets the radio family is built for.
pub const BAND_OFFSETS_MHZ: [u16; 4] = [410, 220, 850, 900];

impl MachineConfig {
    /// Load `path` if given, otherwise use the production defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => <Self as ConfigLoader>::load(p)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - a period, capacity or timeout is zero
    /// - the band offset is not one of [`BAND_OFFSETS_MHZ`]
    /// - the GNSS baud rate is unsupported
    /// - the keymap is not 16 characters
    /// - a GPIO coordinate is out of range
    /// - the display geometry is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: String| Err(ConfigError::ValidationError(msg));

        if self.radio.loop_interval_ms == 0
            || self.gnss.loop_interval_ms == 0
            || self.io.scan_interval_ms == 0
            || self.status_led.blink_interval_ms == 0
        {
            return fail("loop intervals must be > 0".to_string());
        }
        if self.radio.mailbox_capacity == 0 || self.io.queue_capacity == 0 {
            return fail("queue capacities must be > 0".to_string());
        }
        if self.supervisor.join_timeout_ms == 0 {
            return fail("supervisor.join_timeout_ms must be > 0".to_string());
        }
        if !BAND_OFFSETS_MHZ.contains(&self.radio.band_mhz) {
            return fail(format!(
                "radio.band_mhz {} not in {:?}",
                self.radio.band_mhz, BAND_OFFSETS_MHZ
            ));
        }
        if !is_supported_baud(self.gnss.baud_rate) {
            return fail(format!("gnss.baud_rate {} unsupported", self.gnss.baud_rate));
        }
        if Keymap::parse(&self.io.keymap).is_none() {
            return fail(format!(
                "io.keymap must be 16 characters, got {}",
                self.io.keymap.chars().count()
            ));
        }
        let pins = [
            ("radio.aux_pin", self.radio.aux_pin),
            ("radio.m0_pin", self.radio.m0_pin),
            ("radio.m1_pin", self.radio.m1_pin),
            ("status_led.pin", self.status_led.pin),
        ];
        for (name, pin) in pins {
            if pin.number().is_none() {
                return fail(format!("{name} out of range: {pin:?}"));
            }
        }
        if self.display.cols == 0 || self.display.rows == 0 {
            return fail("display geometry must be non-empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    // ─── Log level ──────────────────────────────────────────────────

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize)]
        struct Wrapper {
            level: LogLevel,
        }
        let parse = |s: &str| toml::from_str::<Wrapper>(s).unwrap().level;
        assert_eq!(parse("level = \"trace\""), LogLevel::Trace);
        assert_eq!(parse("level = \"warn\""), LogLevel::Warn);
        assert_eq!(LogLevel::Debug.as_directive(), "debug");
    }

    // ─── Host file ──────────────────────────────────────────────────

    #[test]
    fn test_host_parse() {
        let cfg = HostConfig::parse("address_high=18\naddress_low=52\n").unwrap();
        assert_eq!(cfg.address_high, 0x12);
        assert_eq!(cfg.address_low, 0x34);
    }

    #[test]
    fn test_host_ignores_unknown_and_comments() {
        let cfg = HostConfig::parse(
            "# unit 7\n\nteam=red\naddress_low = 7\nnot a pair\naddress_high= 1 \n",
        )
        .unwrap();
        assert_eq!(cfg, HostConfig { address_high: 1, address_low: 7 });
    }

    #[test]
    fn test_host_missing_keys_default_to_zero() {
        let cfg = HostConfig::parse("address_low=9").unwrap();
        assert_eq!(cfg, HostConfig { address_high: 0, address_low: 9 });
    }

    #[test]
    fn test_host_rejects_out_of_range() {
        let err = HostConfig::parse("address_high=256").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        let err = HostConfig::parse("address_low=abc").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_host_rejects_broadcast() {
        let err = HostConfig::parse("address_high=255\naddress_low=255").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_host_load_from_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "address_high=1\naddress_low=2\n").unwrap();
        let cfg = HostConfig::load(dir.path()).unwrap();
        assert_eq!(cfg, HostConfig { address_high: 1, address_low: 2 });
    }

    #[test]
    fn test_host_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = HostConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    // ─── Machine file ───────────────────────────────────────────────

    #[test]
    fn test_machine_defaults_match_board() {
        let cfg = MachineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.radio.device, "/dev/ttyS0");
        assert_eq!(cfg.radio.channel, 0x04);
        assert_eq!(cfg.gnss.device, "/dev/ttyS3");
        assert_eq!(cfg.io.keypad, 0x23);
        assert_eq!(cfg.display.address, 0x27);
        assert_eq!(cfg.status_led.blink_interval_ms, 500);
        assert_eq!(cfg.supervisor.join_timeout_ms, 10_000);
    }

    #[test]
    fn test_machine_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"log_level = "debug"

[radio]
channel = 7
aux_wired = false

[io]
debounce_ms = 80
"#
        )
        .unwrap();
        file.flush().unwrap();

        let cfg = MachineConfig::load_or_default(Some(file.path())).unwrap();
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.radio.channel, 7);
        assert!(!cfg.radio.aux_wired);
        assert_eq!(cfg.radio.device, "/dev/ttyS0");
        assert_eq!(cfg.io.debounce_ms, 80);
        assert_eq!(cfg.io.scan_interval_ms, 10);
    }

    #[test]
    fn test_machine_rejects_unknown_field() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[radio]\nchanel = 7").unwrap();
        let result = MachineConfig::load_or_default(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_machine_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();
        let result = MachineConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_machine_file_not_found() {
        let result = MachineConfig::load_or_default(Some(Path::new("/nonexistent/machine.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_machine_validation() {
        let mut cfg = MachineConfig::default();
        cfg.radio.band_mhz = 433;
        assert!(matches!(cfg.validate(), Err(ConfigError::ValidationError(_))));

        let mut cfg = MachineConfig::default();
        cfg.io.keymap = "123".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::ValidationError(_))));

        let mut cfg = MachineConfig::default();
        cfg.radio.mailbox_capacity = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = MachineConfig::default();
        cfg.status_led.pin = GpioId::new(9, 0, 0);
        assert!(cfg.validate().is_err());

        let mut cfg = MachineConfig::default();
        cfg.gnss.baud_rate = 1234;
        assert!(cfg.validate().is_err());
    }
}
