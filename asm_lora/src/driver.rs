//! E220 driver.
//!
//! The module is driven through one UART and up to three GPIO lines. M0/M1
//! select the operating mode; AUX, when wired, reports busy (low) and idle
//! (high). Every operation blocks the caller and is bounded by a timeout.
//!
//! # Mode transitions
//!
//! ```text
//!   request ──40 ms──► write M0/M1 ──40 ms──► poll AUX (1 ms, ≤ 1000 ms) ──2 ms──► ready
//! ```
//!
//! So at least 82 ms pass between a mode request and the next UART byte.
//! On timeout the lines stay where they were driven and the tracked mode
//! is left unchanged.

use std::time::Duration;

use asm_common::hal::{Direction, GpioLine, Level, SerialLine};
use asm_common::time::{Clock, SharedClock};
use tracing::{debug, info, trace, warn};

use crate::config::{CONFIGURATION_LEN, Configuration, MODULE_INFO_LEN, ModuleInfo};
use crate::consts::timing::*;
use crate::consts::{
    CONFIG_BAUD, DEFAULT_BAND_MHZ, HEADER_LEN, MAX_RX_PACKET, MAX_TX_PACKET, PL_CONFIGURATION, PL_PID,
    ProgramCommand, REG_ADDRESS_CFG, REG_ADDRESS_PID, SaveType,
};
use crate::error::{LoraError, LoraResult, Received};
use crate::frame::{self, FixedTarget};
use crate::mode::ModeType;

/// Optional control lines of the module.
#[derive(Default)]
pub struct E220Pins {
    /// Busy indicator, input.
    pub aux: Option<Box<dyn GpioLine>>,
    /// Mode select 0, output.
    pub m0: Option<Box<dyn GpioLine>>,
    /// Mode select 1, output.
    pub m1: Option<Box<dyn GpioLine>>,
}

/// Ebyte E220 LoRa module.
pub struct E220 {
    serial: Box<dyn SerialLine>,
    pins: E220Pins,
    clock: SharedClock,
    mode: ModeType,
    band_mhz: u32,
    initialized: bool,
}

impl E220 {
    /// Driver over an (unopened or opened) UART and optional lines.
    pub fn new(serial: Box<dyn SerialLine>, pins: E220Pins, clock: SharedClock) -> Self {
        Self {
            serial,
            pins,
            clock,
            mode: ModeType::Normal,
            band_mhz: DEFAULT_BAND_MHZ,
            initialized: false,
        }
    }

    /// Frequency band offset used when logging the channel.
    pub fn with_band(mut self, band_mhz: u32) -> Self {
        self.band_mhz = band_mhz;
        self
    }

    /// Open the lines and the UART, wait for power-up and enter Normal
    /// mode.
    pub fn begin(&mut self) -> LoraResult<()> {
        if let Some(aux) = self.pins.aux.as_mut() {
            aux.open(Direction::Input, Level::Low)?;
        }
        for line in [self.pins.m0.as_mut(), self.pins.m1.as_mut()]
            .into_iter()
            .flatten()
        {
            line.open(Direction::Output, Level::Low)?;
        }
        if !self.serial.is_open() {
            self.serial.open()?;
        }

        self.clock.sleep_ms(BEGIN_WAIT_MS);
        self.serial
            .set_timeout(Duration::from_millis(SERIAL_TIMEOUT_MS));

        self.initialized = true;
        if let Err(e) = self.set_mode(ModeType::Normal) {
            self.initialized = false;
            return Err(e);
        }
        info!(
            "E220 ready at {} baud (aux {})",
            self.serial.config().baud_rate,
            if self.pins.aux.is_some() { "wired" } else { "not wired" }
        );
        Ok(())
    }

    /// Release the lines and the UART.
    pub fn end(&mut self) {
        for line in [
            self.pins.aux.as_mut(),
            self.pins.m0.as_mut(),
            self.pins.m1.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            line.close();
        }
        self.serial.close();
        self.initialized = false;
    }

    /// Whether `begin` succeeded and `end` was not called since.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Last mode entered successfully.
    pub fn mode(&self) -> ModeType {
        self.mode
    }

    /// Switch operating mode.
    pub fn set_mode(&mut self, mode: ModeType) -> LoraResult<()> {
        self.ensure_initialized()?;
        self.clock.sleep_ms(MODE_SETTLE_MS);

        let (m0, m1) = mode.pins();
        match (self.pins.m0.as_mut(), self.pins.m1.as_mut()) {
            (Some(p0), Some(p1)) => {
                p0.write(m0)?;
                p1.write(m1)?;
            }
            _ => trace!("M0/M1 not wired, mode {} left to the board", mode),
        }

        self.clock.sleep_ms(MODE_SETTLE_MS);
        self.wait_complete_response(MODE_AUX_TIMEOUT_MS, NO_AUX_WAIT_MS)?;
        self.mode = mode;
        debug!("E220 mode {}", mode);
        Ok(())
    }

    /// Read the configuration record.
    pub fn get_configuration(&mut self) -> LoraResult<Configuration> {
        let reply = self.program_transaction(
            &[ProgramCommand::Read.byte(), REG_ADDRESS_CFG, PL_CONFIGURATION],
            REG_ADDRESS_CFG,
            PL_CONFIGURATION,
        )?;
        let config = decode_config(&reply)?;
        debug!("E220 configuration\n{}", config.dump(self.band_mhz));
        Ok(config)
    }

    /// Write the configuration record; returns the module's echo.
    pub fn set_configuration(
        &mut self,
        config: &Configuration,
        save: SaveType,
    ) -> LoraResult<Configuration> {
        let mut command = Vec::with_capacity(HEADER_LEN + CONFIGURATION_LEN);
        command.extend_from_slice(&[save.command().byte(), REG_ADDRESS_CFG, PL_CONFIGURATION]);
        command.extend_from_slice(&config.encode());
        let reply = self.program_transaction(&command, REG_ADDRESS_CFG, PL_CONFIGURATION)?;
        let echo = decode_config(&reply)?;
        info!(
            "E220 configuration written ({:?}): address {:02X}{:02X} channel {}",
            save, echo.address_high, echo.address_low, echo.channel
        );
        Ok(echo)
    }

    /// Read model, version and feature bytes.
    pub fn get_module_information(&mut self) -> LoraResult<ModuleInfo> {
        let reply = self.program_transaction(
            &[ProgramCommand::Read.byte(), REG_ADDRESS_PID, PL_PID],
            REG_ADDRESS_PID,
            PL_PID,
        )?;
        let mut bytes = [0u8; MODULE_INFO_LEN];
        bytes.copy_from_slice(&reply[HEADER_LEN..]);
        let info = ModuleInfo::decode(&bytes);
        debug!("E220 {}", info);
        Ok(info)
    }

    /// This module family has no reset command.
    pub fn reset_module(&mut self) -> LoraResult<()> {
        warn!("E220 reset requested: no reset command on this module");
        Err(LoraError::NotImplemented)
    }

    /// Send a payload as-is (transparent transmission).
    pub fn send_message(&mut self, payload: impl AsRef<[u8]>) -> LoraResult<()> {
        let frame = frame::transparent(payload.as_ref())?;
        self.send_frame(&frame)
    }

    /// Send to one module in fixed-transmission mode.
    pub fn send_fixed_message(
        &mut self,
        address_high: u8,
        address_low: u8,
        channel: u8,
        payload: impl AsRef<[u8]>,
    ) -> LoraResult<()> {
        let target = FixedTarget::new(address_high, address_low, channel);
        let frame = frame::fixed(target, payload.as_ref())?;
        self.send_frame(&frame)
    }

    /// Send to every module on `channel` in fixed-transmission mode.
    pub fn send_broadcast_fixed_message(
        &mut self,
        channel: u8,
        payload: impl AsRef<[u8]>,
    ) -> LoraResult<()> {
        let frame = frame::fixed(FixedTarget::broadcast(channel), payload.as_ref())?;
        self.send_frame(&frame)
    }

    /// Send a configuration record over the air to a remote module.
    pub fn send_configuration_message(
        &mut self,
        address_high: u8,
        address_low: u8,
        channel: u8,
        config: &Configuration,
        save: SaveType,
    ) -> LoraResult<()> {
        let body = frame::configuration_message(config, save)?;
        self.send_fixed_message(address_high, address_low, channel, &body)
    }

    /// Bytes waiting on the UART.
    pub fn available(&mut self) -> LoraResult<usize> {
        Ok(self.serial.available()?)
    }

    /// Read whatever is buffered.
    pub fn receive_message(&mut self) -> LoraResult<Received> {
        self.receive_buffered(false)
    }

    /// Read whatever is buffered; the last byte is the RSSI.
    pub fn receive_message_rssi(&mut self) -> LoraResult<Received> {
        self.receive_buffered(true)
    }

    /// Read exactly `size` bytes, plus one RSSI byte when `rssi` is set.
    pub fn receive_sized(&mut self, size: usize, rssi: bool) -> LoraResult<Received> {
        self.ensure_initialized()?;
        if size == 0 || size > MAX_RX_PACKET {
            return Err(LoraError::InvalidParam);
        }
        let mut data = vec![0u8; size];
        self.read_exact(&mut data)?;
        self.wait_complete_response(RECEIVE_TIMEOUT_MS, NO_AUX_WAIT_MS)?;

        let rssi = if rssi {
            let mut byte = [0u8; 1];
            match self.serial.read(&mut byte)? {
                1 => Some(byte[0]),
                _ => None,
            }
        } else {
            None
        };
        self.serial.flush_input()?;
        Ok(Received { data, rssi })
    }

    fn receive_buffered(&mut self, rssi: bool) -> LoraResult<Received> {
        self.ensure_initialized()?;
        let pending = self.serial.available()?.min(MAX_RX_PACKET);
        if pending == 0 {
            return Err(LoraError::NoResponseFromDevice);
        }
        let mut data = vec![0u8; pending];
        let n = self.serial.read(&mut data)?;
        data.truncate(n);
        let rssi = if rssi { data.pop() } else { None };
        self.serial.flush_input()?;
        trace!("E220 received {} bytes", data.len());
        Ok(Received { data, rssi })
    }

    fn send_frame(&mut self, frame: &[u8]) -> LoraResult<()> {
        self.ensure_initialized()?;
        if frame.len() > MAX_TX_PACKET {
            return Err(LoraError::PacketTooBig);
        }
        let written = self.serial.write(frame)?;
        if written == 0 {
            return Err(LoraError::NoResponseFromDevice);
        }
        if written != frame.len() {
            return Err(LoraError::DataSizeMismatch);
        }
        trace!("E220 sent {} bytes", written);
        self.wait_complete_response(SEND_TIMEOUT_MS, SEND_TIMEOUT_MS)?;
        self.serial.flush_input()?;
        Ok(())
    }

    /// Register command in Configuration mode: switch, send, read the
    /// `HEADER_LEN + len` reply, switch back, check the header.
    fn program_transaction(
        &mut self,
        command: &[u8],
        address: u8,
        len: u8,
    ) -> LoraResult<Vec<u8>> {
        self.ensure_initialized()?;
        if self.serial.config().baud_rate != CONFIG_BAUD {
            return Err(LoraError::WrongUartConfig);
        }

        let previous = self.mode;
        self.set_mode(ModeType::Configuration)?;

        let mut reply = vec![0u8; HEADER_LEN + len as usize];
        if let Err(e) = self.exchange(command, &mut reply) {
            if let Err(restore) = self.set_mode(previous) {
                debug!("E220 mode restore after failed command: {}", restore);
            }
            return Err(e);
        }

        self.set_mode(previous)?;

        if reply[..HEADER_LEN] != [ProgramCommand::Read.byte(), address, len] {
            return Err(LoraError::HeadNotRecognized);
        }
        Ok(reply)
    }

    fn exchange(&mut self, command: &[u8], reply: &mut [u8]) -> LoraResult<()> {
        self.write_program_command(command)?;
        self.read_reply(reply)?;
        self.wait_complete_response(RECEIVE_TIMEOUT_MS, NO_AUX_WAIT_MS)
    }

    fn write_program_command(&mut self, command: &[u8]) -> LoraResult<()> {
        let written = self.serial.write(command)?;
        self.clock.sleep_ms(PROGRAM_COMMAND_WAIT_MS);
        match written {
            0 => Err(LoraError::NoResponseFromDevice),
            n if n != command.len() => Err(LoraError::DataSizeMismatch),
            _ => Ok(()),
        }
    }

    /// Read a register reply. A leading `FF` is a format error even when
    /// the module sent fewer bytes than asked for.
    fn read_reply(&mut self, reply: &mut [u8]) -> LoraResult<()> {
        let n = self.serial.read(reply)?;
        if n == 0 {
            return Err(LoraError::NoResponseFromDevice);
        }
        if reply[0] == ProgramCommand::WrongFormat.byte() {
            return Err(LoraError::WrongFormat);
        }
        if n != reply.len() {
            return Err(LoraError::DataSizeMismatch);
        }
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> LoraResult<()> {
        match self.serial.read(buf)? {
            0 => Err(LoraError::NoResponseFromDevice),
            n if n != buf.len() => Err(LoraError::DataSizeMismatch),
            _ => Ok(()),
        }
    }

    /// Wait for AUX to report idle, or `no_aux_ms` when AUX is not wired,
    /// then give the module 2 ms before the next byte.
    fn wait_complete_response(&mut self, timeout_ms: u64, no_aux_ms: u64) -> LoraResult<()> {
        match self.pins.aux.as_mut() {
            Some(aux) => {
                let mut remaining = timeout_ms;
                while !aux.read()?.is_high() {
                    if remaining == 0 {
                        debug!("E220 AUX still busy after {} ms", timeout_ms);
                        return Err(LoraError::Timeout);
                    }
                    self.clock.sleep_ms(1);
                    remaining -= 1;
                }
            }
            None => self.clock.sleep_ms(no_aux_ms),
        }
        self.clock.sleep_ms(AUX_IDLE_GUARD_MS);
        Ok(())
    }

    fn ensure_initialized(&self) -> LoraResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(LoraError::NotInitialized)
        }
    }
}

impl Drop for E220 {
    fn drop(&mut self) {
        if self.initialized {
            self.end();
        }
    }
}

fn decode_config(reply: &[u8]) -> LoraResult<Configuration> {
    let body: &[u8; CONFIGURATION_LEN] = reply[HEADER_LEN..]
        .try_into()
        .map_err(|_| LoraError::DataSizeMismatch)?;
    Ok(Configuration::decode(body))
}
