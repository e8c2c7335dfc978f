//! Board constants of the game machine.

use super::gpio::GpioId;

/// GPIO group C.
pub const GROUP_C: u32 = 2;

/// Serial device of the LoRa module.
pub const LORA_SERIAL_DEVICE: &str = "/dev/ttyS0";
/// Serial device of the GNSS receiver.
pub const GNSS_SERIAL_DEVICE: &str = "/dev/ttyS3";
/// I²C bus of the output expanders and the keypad.
pub const IO_I2C_BUS: &str = "/dev/i2c-3";
/// I²C bus of the character display.
pub const DISPLAY_I2C_BUS: &str = "/dev/i2c-4";

/// Expander driving IO0..IO7.
pub const IO0_7_ADDR: u8 = 0x26;
/// Expander driving IO8..IO15.
pub const IO8_15_ADDR: u8 = 0x20;
/// Expander behind the 4x4 keypad matrix.
pub const KEYPAD_ADDR: u8 = 0x23;
/// PCF8574 backpack of the LCD.
pub const DISPLAY_ADDR: u8 = 0x27;

/// Display geometry.
pub const DISPLAY_COLS: u8 = 20;
/// Display geometry.
pub const DISPLAY_ROWS: u8 = 4;

/// LoRa AUX line.
pub const LORA_AUX_PIN: GpioId = GpioId::new(1, GROUP_C, 1);
/// LoRa M0 line.
pub const LORA_M0_PIN: GpioId = GpioId::new(1, GROUP_C, 2);
/// LoRa M1 line.
pub const LORA_M1_PIN: GpioId = GpioId::new(1, GROUP_C, 3);
/// Status lamp.
pub const STATUS_LED_PIN: GpioId = GpioId::new(1, GROUP_C, 4);

/// GNSS line speed.
pub const GNSS_BAUD: u32 = 9600;
/// LoRa UART speed; configuration mode only works at this rate.
pub const LORA_BAUD: u32 = 9600;

/// Directory (relative to the working directory) holding the host file.
pub const CONFIG_DIR: &str = "airsoft";
/// Host configuration file name.
pub const CONFIG_FILE: &str = "asm-config.cfg";
