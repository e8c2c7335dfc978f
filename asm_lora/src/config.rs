//! The 8-byte configuration record and its packed fields.
//!
//! ```text
//!  byte  0      1      2        3        4        5         6      7
//!       ADDH   ADDL   SPEED    OPTION   CHAN     TRANSMODE CRYPTH CRYPTL
//!
//!  SPEED     7..5 UART baud   4..3 parity   2..0 air rate
//!  OPTION    7..6 sub-packet  5 RSSI noise  4..2 reserved  1..0 TX power
//!  TRANSMODE 7 RSSI append    6 fixed       5 -   4 LBT   3 -  2..0 WOR
//! ```
//!
//! Reserved bits are carried through unchanged, so decoding then encoding
//! any 8 bytes gives the same 8 bytes back.

use std::fmt;

use bitflags::bitflags;
use static_assertions::const_assert_eq;

use crate::consts::{HEADER_LEN, PL_CONFIGURATION, PL_PID};

/// Wire length of [`Configuration`].
pub const CONFIGURATION_LEN: usize = 8;
/// Wire length of [`ModuleInfo`] without its header.
pub const MODULE_INFO_LEN: usize = 3;

const_assert_eq!(CONFIGURATION_LEN, PL_CONFIGURATION as usize);
const_assert_eq!(MODULE_INFO_LEN, PL_PID as usize);
const_assert_eq!(HEADER_LEN + CONFIGURATION_LEN, 11);

/// Declares a field enum whose variants cover every bit pattern of the
/// field, with the datasheet description of each.
macro_rules! bit_field {
    (
        $(#[$meta:meta])*
        $name:ident, mask = $mask:literal {
            $($variant:ident = $bits:literal => $desc:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $(
                #[doc = $desc]
                $variant = $bits,
            )+
        }

        impl $name {
            /// Decode from the field bits (extra bits are masked off).
            pub const fn from_bits(bits: u8) -> Self {
                match bits & $mask {
                    $($bits => $name::$variant,)+
                    _ => unreachable!(),
                }
            }

            /// Field bits.
            pub const fn bits(self) -> u8 {
                self as u8
            }

            /// Datasheet description.
            pub const fn description(self) -> &'static str {
                match self {
                    $($name::$variant => $desc,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.description())
            }
        }
    };
}

bit_field! {
    /// UART line speed.
    UartBaud, mask = 0x07 {
        B1200 = 0 => "1200bps",
        B2400 = 1 => "2400bps",
        B4800 = 2 => "4800bps",
        B9600 = 3 => "9600bps (default)",
        B19200 = 4 => "19200bps",
        B38400 = 5 => "38400bps",
        B57600 = 6 => "57600bps",
        B115200 = 7 => "115200bps",
    }
}

impl UartBaud {
    /// Line speed in bits per second.
    pub const fn bps(self) -> u32 {
        match self {
            UartBaud::B1200 => 1200,
            UartBaud::B2400 => 2400,
            UartBaud::B4800 => 4800,
            UartBaud::B9600 => 9600,
            UartBaud::B19200 => 19200,
            UartBaud::B38400 => 38400,
            UartBaud::B57600 => 57600,
            UartBaud::B115200 => 115200,
        }
    }
}

bit_field! {
    /// UART framing.
    UartParity, mask = 0x03 {
        P8N1 = 0 => "8N1 (Default)",
        P8O1 = 1 => "8O1",
        P8E1 = 2 => "8E1",
        P8N1Alt = 3 => "8N1 (equal to 00",
    }
}

bit_field! {
    /// Over-the-air data rate. Codes 0 and 1 alias the 2.4 kbps default.
    AirDataRate, mask = 0x07 {
        R2400Alt0 = 0 => "2.4kbps",
        R2400Alt1 = 1 => "2.4kbps",
        R2400 = 2 => "2.4kbps (default)",
        R4800 = 3 => "4.8kbps",
        R9600 = 4 => "9.6kbps",
        R19200 = 5 => "19.2kbps",
        R38400 = 6 => "38.4kbps",
        R62500 = 7 => "62.5kbps",
    }
}

bit_field! {
    /// Air sub-packet length.
    SubPacketSize, mask = 0x03 {
        Bytes200 = 0 => "200bytes (default)",
        Bytes128 = 1 => "128bytes",
        Bytes64 = 2 => "64bytes",
        Bytes32 = 3 => "32bytes",
    }
}

bit_field! {
    /// Transmit power class of the 22 dBm parts.
    TransmissionPower, mask = 0x03 {
        Dbm22 = 0 => "22dBm (Default)",
        Dbm17 = 1 => "17dBm",
        Dbm13 = 2 => "13dBm",
        Dbm10 = 3 => "10dBm",
    }
}

bit_field! {
    /// Wake-on-radio cycle.
    WorPeriod, mask = 0x07 {
        Ms500 = 0 => "500ms",
        Ms1000 = 1 => "1000ms",
        Ms1500 = 2 => "1500ms",
        Ms2000 = 3 => "2000ms (default)",
        Ms2500 = 4 => "2500ms",
        Ms3000 = 5 => "3000ms",
        Ms3500 = 6 => "3500ms",
        Ms4000 = 7 => "4000ms",
    }
}

/// Description of an enable bit.
pub const fn enable_description(enabled: bool) -> &'static str {
    if enabled { "Enabled" } else { "Disabled (default)" }
}

/// Description of the fixed-transmission bit.
pub const fn fixed_transmission_description(fixed: bool) -> &'static str {
    if fixed {
        "Fixed transmission (first three bytes can be used as high/low address and channel)"
    } else {
        "Transparent transmission (default)"
    }
}

/// `SPEED` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Speed {
    /// Bits 5..7.
    pub uart_baud: UartBaud,
    /// Bits 3..4.
    pub uart_parity: UartParity,
    /// Bits 0..2.
    pub air_data_rate: AirDataRate,
}

impl Speed {
    /// Unpack.
    pub const fn from_byte(b: u8) -> Self {
        Self {
            uart_baud: UartBaud::from_bits(b >> 5),
            uart_parity: UartParity::from_bits(b >> 3),
            air_data_rate: AirDataRate::from_bits(b),
        }
    }

    /// Pack.
    pub const fn to_byte(self) -> u8 {
        (self.uart_baud.bits() << 5) | (self.uart_parity.bits() << 3) | self.air_data_rate.bits()
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self {
            uart_baud: UartBaud::B9600,
            uart_parity: UartParity::P8N1,
            air_data_rate: AirDataRate::R2400,
        }
    }
}

/// `OPTION` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioOption {
    /// Bits 6..7.
    pub sub_packet: SubPacketSize,
    /// Bit 5.
    pub rssi_ambient_noise: bool,
    /// Bits 2..4, kept verbatim.
    pub reserved: u8,
    /// Bits 0..1.
    pub transmission_power: TransmissionPower,
}

impl RadioOption {
    /// Unpack.
    pub const fn from_byte(b: u8) -> Self {
        Self {
            sub_packet: SubPacketSize::from_bits(b >> 6),
            rssi_ambient_noise: b & 0x20 != 0,
            reserved: (b >> 2) & 0x07,
            transmission_power: TransmissionPower::from_bits(b),
        }
    }

    /// Pack.
    pub const fn to_byte(self) -> u8 {
        (self.sub_packet.bits() << 6)
            | ((self.rssi_ambient_noise as u8) << 5)
            | ((self.reserved & 0x07) << 2)
            | self.transmission_power.bits()
    }
}

impl Default for RadioOption {
    fn default() -> Self {
        Self::from_byte(0x00)
    }
}

bitflags! {
    /// Single-bit switches of the `TRANSMODE` register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TransmissionFlags: u8 {
        /// Listen before talk.
        const LBT = 0x10;
        /// Fixed-address transmission.
        const FIXED = 0x40;
        /// Module appends an RSSI byte to every received frame.
        const RSSI = 0x80;
    }
}

/// `TRANSMODE` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmissionMode {
    /// Bits 0..2.
    pub wor_period: WorPeriod,
    /// Bits 3..7; reserved bits 3 and 5 are retained.
    pub flags: TransmissionFlags,
}

impl TransmissionMode {
    /// Unpack.
    pub const fn from_byte(b: u8) -> Self {
        Self {
            wor_period: WorPeriod::from_bits(b),
            flags: TransmissionFlags::from_bits_retain(b & !0x07),
        }
    }

    /// Pack.
    pub const fn to_byte(self) -> u8 {
        self.flags.bits() | self.wor_period.bits()
    }

    /// Listen before talk enabled.
    pub const fn lbt(&self) -> bool {
        self.flags.contains(TransmissionFlags::LBT)
    }

    /// Fixed-address mode.
    pub const fn fixed(&self) -> bool {
        self.flags.contains(TransmissionFlags::FIXED)
    }

    /// RSSI byte appended to received frames.
    pub const fn rssi(&self) -> bool {
        self.flags.contains(TransmissionFlags::RSSI)
    }
}

impl Default for TransmissionMode {
    fn default() -> Self {
        Self::from_byte(0x03)
    }
}

/// Module configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Configuration {
    /// Module address, high byte.
    pub address_high: u8,
    /// Module address, low byte.
    pub address_low: u8,
    /// UART and air rates.
    pub speed: Speed,
    /// Packet size, noise reporting, power.
    pub option: RadioOption,
    /// Channel; frequency is `channel + band` MHz.
    pub channel: u8,
    /// WOR period and transmission switches.
    pub transmission_mode: TransmissionMode,
    /// Module-side key, high byte.
    pub crypt_high: u8,
    /// Module-side key, low byte.
    pub crypt_low: u8,
}

impl Configuration {
    /// Decode the record.
    pub fn decode(bytes: &[u8; CONFIGURATION_LEN]) -> Self {
        Self {
            address_high: bytes[0],
            address_low: bytes[1],
            speed: Speed::from_byte(bytes[2]),
            option: RadioOption::from_byte(bytes[3]),
            channel: bytes[4],
            transmission_mode: TransmissionMode::from_byte(bytes[5]),
            crypt_high: bytes[6],
            crypt_low: bytes[7],
        }
    }

    /// Encode the record.
    pub fn encode(&self) -> [u8; CONFIGURATION_LEN] {
        [
            self.address_high,
            self.address_low,
            self.speed.to_byte(),
            self.option.to_byte(),
            self.channel,
            self.transmission_mode.to_byte(),
            self.crypt_high,
            self.crypt_low,
        ]
    }

    /// Both address bytes zero, as on a module that was never configured.
    pub fn is_unaddressed(&self) -> bool {
        self.address_high == 0 && self.address_low == 0
    }

    /// Whether the module address is `(high, low)`.
    pub fn has_address(&self, high: u8, low: u8) -> bool {
        self.address_high == high && self.address_low == low
    }

    /// Operating frequency for a band offset.
    pub fn channel_mhz(&self, band_mhz: u32) -> u32 {
        self.channel as u32 + band_mhz
    }

    /// `"{mhz} MHz"`.
    pub fn channel_description(&self, band_mhz: u32) -> String {
        format!("{} MHz", self.channel_mhz(band_mhz))
    }

    /// Dump in the module tool layout, for a given band.
    pub fn dump(&self, band_mhz: u32) -> ConfigurationDump<'_> {
        ConfigurationDump {
            config: self,
            band_mhz,
        }
    }
}

/// Multi-line [`Configuration`] dump, see [`Configuration::dump`].
pub struct ConfigurationDump<'a> {
    config: &'a Configuration,
    band_mhz: u32,
}

impl fmt::Display for ConfigurationDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.config;
        let t = &c.transmission_mode;
        writeln!(f, "----------------------------------------")?;
        writeln!(f, "AddH : {:02X}", c.address_high)?;
        writeln!(f, "AddL : {:02X}", c.address_low)?;
        writeln!(
            f,
            "Channel : {} -> {}",
            c.channel,
            c.channel_description(self.band_mhz)
        )?;
        writeln!(
            f,
            "SpeedParityBit     : {:08b} -> {}",
            c.speed.uart_parity.bits(),
            c.speed.uart_parity
        )?;
        writeln!(
            f,
            "SpeedUARTDatte     : {:08b} -> {}",
            c.speed.uart_baud.bits(),
            c.speed.uart_baud
        )?;
        writeln!(
            f,
            "SpeedAirDataRate   : {:08b} -> {}",
            c.speed.air_data_rate.bits(),
            c.speed.air_data_rate
        )?;
        writeln!(
            f,
            "OptionSubPacketSett: {:08b} -> {}",
            c.option.sub_packet.bits(),
            c.option.sub_packet
        )?;
        writeln!(
            f,
            "OptionTranPower    : {:08b} -> {}",
            c.option.transmission_power.bits(),
            c.option.transmission_power
        )?;
        writeln!(
            f,
            "OptionRSSIAmbientNo: {:08b} -> {}",
            c.option.rssi_ambient_noise as u8,
            enable_description(c.option.rssi_ambient_noise)
        )?;
        writeln!(
            f,
            "TransModeWORPeriod : {:08b} -> {}",
            t.wor_period.bits(),
            t.wor_period
        )?;
        writeln!(
            f,
            "TransModeEnableLBT : {:08b} -> {}",
            t.lbt() as u8,
            enable_description(t.lbt())
        )?;
        writeln!(
            f,
            "TransModeEnableRSSI: {:08b} -> {}",
            t.rssi() as u8,
            enable_description(t.rssi())
        )?;
        writeln!(
            f,
            "TransModeFixedTrans: {:08b} -> {}",
            t.fixed() as u8,
            fixed_transmission_description(t.fixed())
        )?;
        write!(f, "----------------------------------------")
    }
}

/// `PID` registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Model code.
    pub model: u8,
    /// Firmware version.
    pub version: u8,
    /// Feature bits.
    pub features: u8,
}

impl ModuleInfo {
    /// Decode the three register bytes.
    pub fn decode(bytes: &[u8; MODULE_INFO_LEN]) -> Self {
        Self {
            model: bytes[0],
            version: bytes[1],
            features: bytes[2],
        }
    }
}

impl fmt::Display for ModuleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "model 0x{:02X} version 0x{:02X} features 0x{:02X}",
            self.model, self.version, self.features
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACTORY: [u8; 8] = [0x00, 0x00, 0x62, 0x00, 0x12, 0x03, 0x00, 0x00];

    #[test]
    fn test_decode_factory_record() {
        let cfg = Configuration::decode(&FACTORY);
        assert!(cfg.is_unaddressed());
        assert_eq!(cfg.speed.uart_baud, UartBaud::B9600);
        assert_eq!(cfg.speed.uart_parity, UartParity::P8N1);
        assert_eq!(cfg.speed.air_data_rate, AirDataRate::R2400);
        assert_eq!(cfg.option.sub_packet, SubPacketSize::Bytes200);
        assert_eq!(cfg.option.transmission_power, TransmissionPower::Dbm22);
        assert_eq!(cfg.channel, 0x12);
        assert_eq!(cfg.transmission_mode.wor_period, WorPeriod::Ms2000);
        assert!(!cfg.transmission_mode.fixed());
        assert_eq!(cfg.channel_mhz(850), 868);
        assert_eq!(cfg.channel_description(850), "868 MHz");
    }

    #[test]
    fn test_bit_positions() {
        let cfg = Configuration::decode(&[0x12, 0x34, 0xE7, 0xE3, 0x04, 0xD7, 0xAB, 0xCD]);
        assert_eq!(cfg.speed.uart_baud, UartBaud::B115200);
        assert_eq!(cfg.speed.uart_parity, UartParity::P8N1);
        assert_eq!(cfg.speed.air_data_rate, AirDataRate::R62500);
        assert_eq!(cfg.option.sub_packet, SubPacketSize::Bytes32);
        assert!(cfg.option.rssi_ambient_noise);
        assert_eq!(cfg.option.transmission_power, TransmissionPower::Dbm10);
        let t = cfg.transmission_mode;
        assert!(t.lbt() && t.fixed() && t.rssi());
        assert_eq!(t.wor_period, WorPeriod::Ms4000);
        assert_eq!(cfg.speed.uart_baud.bps(), 115200);
    }

    #[test]
    fn test_every_byte_pattern_survives() {
        // Reserved bits included: each register byte decodes and re-encodes
        // to itself.
        for b in 0..=255u8 {
            assert_eq!(Speed::from_byte(b).to_byte(), b);
            assert_eq!(RadioOption::from_byte(b).to_byte(), b);
            assert_eq!(TransmissionMode::from_byte(b).to_byte(), b);
        }
        let raw = [0x12, 0x34, 0x62, 0x1C, 0x04, 0x2B, 0x06, 0x66];
        assert_eq!(Configuration::decode(&raw).encode(), raw);
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(UartParity::P8N1Alt.description(), "8N1 (equal to 00");
        assert_eq!(AirDataRate::R2400Alt1.description(), "2.4kbps");
        assert_eq!(WorPeriod::Ms2000.to_string(), "2000ms (default)");
        assert_eq!(enable_description(false), "Disabled (default)");
        assert!(fixed_transmission_description(true).starts_with("Fixed transmission"));
    }

    #[test]
    fn test_dump_lists_fields() {
        let cfg = Configuration::decode(&FACTORY);
        let text = cfg.dump(850).to_string();
        assert!(text.contains("Channel : 18 -> 868 MHz"));
        assert!(text.contains("SpeedUARTDatte     : 00000011 -> 9600bps (default)"));
        assert!(text.contains("TransModeFixedTrans: 00000000 -> Transparent transmission (default)"));
    }

    #[test]
    fn test_module_info() {
        let info = ModuleInfo::decode(&[0x20, 0x0B, 0x16]);
        assert_eq!(info.model, 0x20);
        assert_eq!(info.to_string(), "model 0x20 version 0x0B features 0x16");
    }
}
