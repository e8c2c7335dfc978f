//! Device assembly: every seam the supervisor needs, from Linux backends
//! or from the in-memory simulation.

use asm_common::config::MachineConfig;
use asm_common::hal::{CharDisplay, GpioLine, HalResult, I2cBus, Level, SerialConfig, SerialLine};
use asm_common::time::SharedClock;
use asm_gnss::format_sentence;
use asm_hal::simulation::{
    PeriodicFeed, SimDisplay, SimDisplayHandle, SimE220, SimI2cBus, SimI2cHandle, SimPin, SimSerial,
    SimSerialHandle,
};
use asm_hal::{I2cLcd, LinuxI2cBus, LinuxSerial, SysfsGpio};
use asm_lora::E220Pins;
use tracing::info;

/// Sentences replayed by the simulated receiver once per second.
const SIM_SENTENCES: [&str; 2] = [
    "GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,",
    "GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W",
];
const SIM_FIX_PERIOD_MS: u64 = 1000;

/// Unopened devices handed to the supervisor.
pub struct Board {
    /// LoRa module UART.
    pub lora_serial: Box<dyn SerialLine>,
    /// LoRa module control lines.
    pub lora_pins: E220Pins,
    /// GNSS receiver UART.
    pub gnss_serial: Box<dyn SerialLine>,
    /// Bus of the output expanders and the keypad.
    pub io_bus: Box<dyn I2cBus>,
    /// Character display.
    pub display: Box<dyn CharDisplay>,
    /// Status lamp line.
    pub status_led: Box<dyn GpioLine>,
}

/// Far side of a simulated board.
#[derive(Clone)]
pub struct SimHandles {
    /// LoRa module.
    pub lora: SimE220,
    /// GNSS UART.
    pub gnss: SimSerialHandle,
    /// I/O bus devices.
    pub io: SimI2cHandle,
    /// Display contents.
    pub display: SimDisplayHandle,
    /// Status lamp.
    pub status_led: SimPin,
}

impl Board {
    /// Devices wired as `config` describes.
    pub fn linux(config: &MachineConfig, clock: SharedClock) -> HalResult<Self> {
        let radio = &config.radio;
        let aux: Option<Box<dyn GpioLine>> = if radio.aux_wired {
            Some(Box::new(SysfsGpio::new(radio.aux_pin)?))
        } else {
            None
        };
        let lora_pins = E220Pins {
            aux,
            m0: Some(Box::new(SysfsGpio::new(radio.m0_pin)?)),
            m1: Some(Box::new(SysfsGpio::new(radio.m1_pin)?)),
        };

        let display = &config.display;
        let lcd_bus = LinuxI2cBus::open(display.bus.clone())?;
        let lcd = I2cLcd::new(Box::new(lcd_bus), display.address, display.cols, display.rows, clock);

        info!(
            "board: radio {}, gnss {}, io {}, display {}",
            radio.device, config.gnss.device, config.io.bus, config.display.bus
        );
        Ok(Self {
            lora_serial: Box::new(LinuxSerial::new(radio.device.clone(), SerialConfig::default())),
            lora_pins,
            gnss_serial: Box::new(LinuxSerial::new(
                config.gnss.device.clone(),
                SerialConfig::new(config.gnss.baud_rate),
            )),
            io_bus: Box::new(LinuxI2cBus::open(config.io.bus.clone())?),
            display: Box::new(lcd),
            status_led: Box::new(SysfsGpio::new(config.status_led.pin)?),
        })
    }

    /// In-memory board: a factory-fresh E220, a receiver emitting a fix
    /// every second, both expanders, the keypad and a text display.
    pub fn simulated(config: &MachineConfig, clock: SharedClock) -> (Self, SimHandles) {
        let lora = SimE220::new(clock.clone());
        let lora_pins = E220Pins {
            aux: config.radio.aux_wired.then(|| Box::new(lora.aux_line()) as Box<dyn GpioLine>),
            m0: Some(Box::new(lora.m0_line())),
            m1: Some(Box::new(lora.m1_line())),
        };

        let lines = SIM_SENTENCES
            .iter()
            .map(|body| format_sentence(body).into_bytes())
            .collect();
        let gnss = SimSerial::new(
            "sim-gnss",
            SerialConfig::new(config.gnss.baud_rate),
            clock.clone(),
        )
        .with_peer(Box::new(PeriodicFeed::new(lines, SIM_FIX_PERIOD_MS)));

        let bus = SimI2cBus::new();
        let io = bus.handle();
        io.add_device(config.io.low_expander);
        io.add_device(config.io.high_expander);
        io.add_keypad(config.io.keypad);

        let display = SimDisplay::new(config.display.cols, config.display.rows);
        let pin = config.status_led.pin.number().unwrap_or(0);
        let status_led = SimPin::new(pin, Level::Low, clock);

        let handles = SimHandles {
            lora: lora.clone(),
            gnss: gnss.handle(),
            io,
            display: display.handle(),
            status_led: status_led.clone(),
        };
        let board = Self {
            lora_serial: Box::new(lora.serial()),
            lora_pins,
            gnss_serial: Box::new(gnss),
            io_bus: Box::new(bus),
            display: Box::new(display),
            status_led: Box::new(status_led.line()),
        };
        (board, handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asm_common::time::SimClock;

    #[test]
    fn test_simulated_board_wiring() {
        let mut config = MachineConfig::default();
        config.radio.aux_wired = false;
        let (board, handles) = Board::simulated(&config, SimClock::shared());
        assert!(board.lora_pins.aux.is_none());
        assert!(board.lora_pins.m0.is_some());
        assert_eq!(board.display.cols(), 20);
        assert_eq!(board.status_led.pin(), 52);
        assert_eq!(handles.io.register(config.io.keypad), Some(0xFF));
    }
}
