//! Simulated Ebyte E220 LoRa module.
//!
//! Behaves like the real module from the host's point of view:
//!
//! - with M0 = M1 = 1 (configuration mode) and the UART at 9600 baud it
//!   answers `C1`, `C0` and `C2` register commands with a `C1` echo, and
//!   anything else with `FF FF FF`;
//! - in any other mode every write is a frame sent over the air, and AUX
//!   is pulled low for the air time.
//!
//! Register file: `0x00..0x07` configuration, `0x08..0x0A` module info.

use super::gpio::{SimGpio, SimPin};
use super::serial::{SimPeer, SimSerial, SimSerialHandle, TxRecord};
use asm_common::hal::consts::{LORA_AUX_PIN, LORA_M0_PIN, LORA_M1_PIN};
use asm_common::hal::{Level, SerialConfig};
use asm_common::time::SharedClock;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

const READ: u8 = 0xC1;
const WRITE_PERSIST: u8 = 0xC0;
const WRITE_VOLATILE: u8 = 0xC2;
const REGISTER_COUNT: usize = 11;

/// Factory defaults: address 0000, 9600 8N1 at 2.4 kbps, 200-byte
/// sub-packets, 22 dBm, channel 18, WOR 2000 ms, no key.
pub const FACTORY_REGISTERS: [u8; 8] = [0x00, 0x00, 0x62, 0x00, 0x12, 0x03, 0x00, 0x00];

/// Model, version and feature bytes reported at register `0x08`.
pub const MODULE_INFO: [u8; 3] = [0x20, 0x0B, 0x16];

/// Air time charged per frame, in milliseconds.
const AIR_TIME_BASE_MS: u64 = 20;

#[derive(Debug)]
struct E220State {
    registers: [u8; REGISTER_COUNT],
    air: Vec<TxRecord>,
    config_commands: usize,
}

fn pin(id: asm_common::hal::GpioId) -> u32 {
    id.number().unwrap_or(0)
}

/// Simulated module: owns the state shared by its UART and its three pins.
#[derive(Clone)]
pub struct SimE220 {
    state: Arc<Mutex<E220State>>,
    clock: SharedClock,
    line: SimSerialHandle,
    m0: SimPin,
    m1: SimPin,
    aux: SimPin,
}

impl SimE220 {
    /// Module with factory settings, idle (AUX high).
    pub fn new(clock: SharedClock) -> Self {
        let mut registers = [0u8; REGISTER_COUNT];
        registers[..8].copy_from_slice(&FACTORY_REGISTERS);
        registers[8..].copy_from_slice(&MODULE_INFO);
        Self {
            state: Arc::new(Mutex::new(E220State {
                registers,
                air: Vec::new(),
                config_commands: 0,
            })),
            m0: SimPin::new(pin(LORA_M0_PIN), Level::Low, clock.clone()),
            m1: SimPin::new(pin(LORA_M1_PIN), Level::Low, clock.clone()),
            aux: SimPin::new(pin(LORA_AUX_PIN), Level::High, clock.clone()),
            line: SimSerialHandle::new(),
            clock,
        }
    }

    /// UART as seen by the host.
    pub fn serial(&self) -> SimSerial {
        SimSerial::with_handle(
            "sim-e220",
            self.line.clone(),
            SerialConfig::default(),
            self.clock.clone(),
        )
        .with_peer(Box::new(self.clone()))
    }

    /// M0 line for the host.
    pub fn m0_line(&self) -> SimGpio {
        self.m0.line()
    }

    /// M1 line for the host.
    pub fn m1_line(&self) -> SimGpio {
        self.m1.line()
    }

    /// AUX line for the host.
    pub fn aux_line(&self) -> SimGpio {
        self.aux.line()
    }

    /// M0 pin state.
    pub fn m0(&self) -> &SimPin {
        &self.m0
    }

    /// M1 pin state.
    pub fn m1(&self) -> &SimPin {
        &self.m1
    }

    /// AUX pin state.
    pub fn aux(&self) -> &SimPin {
        &self.aux
    }

    /// Host UART traffic.
    pub fn uart(&self) -> &SimSerialHandle {
        &self.line
    }

    /// Current 8-byte configuration.
    pub fn registers(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out.copy_from_slice(&self.state.lock().registers[..8]);
        out
    }

    /// Overwrite the configuration.
    pub fn set_registers(&self, registers: [u8; 8]) {
        self.state.lock().registers[..8].copy_from_slice(&registers);
    }

    /// Frames sent over the air.
    pub fn air_frames(&self) -> Vec<TxRecord> {
        self.state.lock().air.clone()
    }

    /// Register commands served.
    pub fn config_commands(&self) -> usize {
        self.state.lock().config_commands
    }

    /// Receive a frame from the air; appends `rssi` when the module is set
    /// to report it.
    pub fn deliver(&self, payload: &[u8], rssi: u8) {
        let append = self.state.lock().registers[5] & 0x80 != 0;
        self.line.push_rx(payload);
        if append {
            self.line.push_rx(&[rssi]);
        }
    }

    fn in_configuration(&self) -> bool {
        self.m0.level().is_high() && self.m1.level().is_high()
    }

    fn register_command(&self, data: &[u8]) -> Vec<u8> {
        let wrong = vec![0xFF, 0xFF, 0xFF];
        if data.len() < 3 {
            return wrong;
        }
        let (cmd, addr, len) = (data[0], data[1] as usize, data[2] as usize);
        if addr + len > REGISTER_COUNT {
            return wrong;
        }
        let mut state = self.state.lock();
        state.config_commands += 1;
        match cmd {
            READ if data.len() == 3 => {
                let mut reply = vec![READ, data[1], data[2]];
                reply.extend_from_slice(&state.registers[addr..addr + len]);
                reply
            }
            WRITE_PERSIST | WRITE_VOLATILE if data.len() == 3 + len && addr + len <= 8 => {
                state.registers[addr..addr + len].copy_from_slice(&data[3..]);
                let mut reply = vec![READ, data[1], data[2]];
                reply.extend_from_slice(&data[3..]);
                reply
            }
            _ => wrong,
        }
    }
}

impl SimPeer for SimE220 {
    fn on_write(&mut self, data: &[u8], config: &SerialConfig, now_ms: u64) -> Vec<u8> {
        if self.in_configuration() {
            if config.baud_rate != 9600 {
                trace!("E220 sim: command at {} baud ignored", config.baud_rate);
                return Vec::new();
            }
            return self.register_command(data);
        }
        self.state.lock().air.push(TxRecord {
            at_ms: now_ms,
            data: data.to_vec(),
        });
        self.aux.busy_for(AIR_TIME_BASE_MS + data.len() as u64 / 4);
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asm_common::hal::{Direction, GpioLine, SerialLine};
    use asm_common::time::SimClock;

    fn config_mode(module: &SimE220) {
        let mut m0 = module.m0_line();
        let mut m1 = module.m1_line();
        m0.open(Direction::Output, Level::High).unwrap();
        m1.open(Direction::Output, Level::High).unwrap();
    }

    #[test]
    fn test_read_configuration() {
        let module = SimE220::new(SimClock::shared());
        config_mode(&module);
        let mut uart = module.serial();
        uart.open().unwrap();
        uart.write(&[0xC1, 0x00, 0x08]).unwrap();
        let mut buf = [0u8; 11];
        assert_eq!(uart.read(&mut buf).unwrap(), 11);
        assert_eq!(&buf[..3], &[0xC1, 0x00, 0x08]);
        assert_eq!(&buf[3..], &FACTORY_REGISTERS);
    }

    #[test]
    fn test_write_echo_and_bad_command() {
        let module = SimE220::new(SimClock::shared());
        config_mode(&module);
        let mut uart = module.serial();
        uart.open().unwrap();
        let body = [0x12, 0x34, 0x62, 0x00, 0x04, 0x43, 0x00, 0x00];
        let mut cmd = vec![0xC2, 0x00, 0x08];
        cmd.extend_from_slice(&body);
        uart.write(&cmd).unwrap();
        let mut buf = [0u8; 11];
        uart.read(&mut buf).unwrap();
        assert_eq!(buf[0], 0xC1);
        assert_eq!(&buf[3..], &body);
        assert_eq!(module.registers(), body);

        uart.write(&[0x55, 0x00, 0x08]).unwrap();
        let mut buf = [0u8; 3];
        uart.read(&mut buf).unwrap();
        assert_eq!(buf, [0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_normal_mode_sends_over_air() {
        let clock = SimClock::shared();
        let module = SimE220::new(clock.clone());
        let mut aux = module.aux_line();
        aux.open(Direction::Input, Level::Low).unwrap();
        let mut uart = module.serial();
        uart.open().unwrap();
        uart.write(b"HELLO").unwrap();
        assert_eq!(module.air_frames()[0].data, b"HELLO".to_vec());
        assert_eq!(aux.read().unwrap(), Level::Low);
        clock.advance_ms(AIR_TIME_BASE_MS + 1);
        assert_eq!(aux.read().unwrap(), Level::High);
    }

    #[test]
    fn test_deliver_appends_rssi_when_enabled() {
        let module = SimE220::new(SimClock::shared());
        let mut uart = module.serial();
        uart.open().unwrap();
        module.deliver(b"ab", 0xC8);
        assert_eq!(uart.available().unwrap(), 2);
        uart.flush_input().unwrap();

        let mut regs = module.registers();
        regs[5] |= 0x80;
        module.set_registers(regs);
        module.deliver(b"ab", 0xC8);
        let mut buf = [0u8; 3];
        uart.read(&mut buf).unwrap();
        assert_eq!(buf, [b'a', b'b', 0xC8]);
    }
}
