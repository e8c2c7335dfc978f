//! `/dev/i2c-N` bus master.

use asm_common::hal::{HalError, HalResult, I2cBus};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use tracing::debug;

/// `I2C_SLAVE` from `linux/i2c-dev.h`.
const I2C_SLAVE: libc::c_ulong = 0x0703;

nix::ioctl_write_int_bad!(
    /// Select the slave address for subsequent reads and writes.
    i2c_set_slave,
    I2C_SLAVE
);

/// Character-device I²C adapter.
pub struct LinuxI2cBus {
    path: String,
    file: File,
    current: Option<u8>,
}

impl LinuxI2cBus {
    /// Open the adapter at `path`.
    pub fn open(path: impl Into<String>) -> HalResult<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| HalError::open(&path, e))?;
        debug!("I2C bus {} open", path);
        Ok(Self {
            path,
            file,
            current: None,
        })
    }

    fn select(&mut self, address: u8) -> HalResult<()> {
        if self.current == Some(address) {
            return Ok(());
        }
        // SAFETY: the descriptor is owned by `self.file`; the request takes an int argument.
        unsafe { i2c_set_slave(self.file.as_raw_fd(), libc::c_int::from(address)) }.map_err(
            |e| HalError::Bus {
                address,
                reason: e.to_string(),
            },
        )?;
        self.current = Some(address);
        Ok(())
    }
}

impl I2cBus for LinuxI2cBus {
    fn name(&self) -> &str {
        &self.path
    }

    fn write(&mut self, address: u8, data: &[u8]) -> HalResult<()> {
        self.select(address)?;
        self.file.write_all(data).map_err(|e| HalError::Bus {
            address,
            reason: e.to_string(),
        })
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> HalResult<()> {
        self.select(address)?;
        self.file.read_exact(buf).map_err(|e| HalError::Bus {
            address,
            reason: e.to_string(),
        })
    }
}
