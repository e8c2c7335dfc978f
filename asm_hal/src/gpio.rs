//! sysfs digital line (`/sys/class/gpio`).

use asm_common::hal::{Direction, GpioId, GpioLine, HalError, HalResult, Level};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default sysfs root.
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Time allowed for udev to create `gpioN` after an export.
const EXPORT_SETTLE: Duration = Duration::from_millis(100);

/// Digital line driven through the sysfs interface.
pub struct SysfsGpio {
    root: PathBuf,
    pin: u32,
    direction: Direction,
    open: bool,
    exported_by_us: bool,
    last: Level,
}

impl SysfsGpio {
    /// Line at `id` under the default sysfs root.
    pub fn new(id: GpioId) -> HalResult<Self> {
        Self::with_root(SYSFS_GPIO_ROOT, id)
    }

    /// Line at `id` under an alternative root.
    pub fn with_root(root: impl AsRef<Path>, id: GpioId) -> HalResult<Self> {
        let pin = id
            .number()
            .ok_or_else(|| HalError::InvalidParam(format!("gpio {id:?}")))?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            pin,
            direction: Direction::Input,
            open: false,
            exported_by_us: false,
            last: Level::Low,
        })
    }

    fn pin_dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.pin))
    }

    fn write_attr(&self, path: &Path, value: &str) -> HalResult<()> {
        fs::write(path, value).map_err(|e| HalError::io(path.display().to_string(), e))
    }

    fn export(&mut self) -> HalResult<()> {
        if self.pin_dir().exists() {
            return Ok(());
        }
        let export = self.root.join("export");
        fs::write(&export, self.pin.to_string())
            .map_err(|e| HalError::open(export.display().to_string(), e))?;
        self.exported_by_us = true;

        let start = Instant::now();
        while !self.pin_dir().exists() {
            if start.elapsed() >= EXPORT_SETTLE {
                return Err(HalError::open(
                    self.pin_dir().display().to_string(),
                    "not created after export",
                ));
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        Ok(())
    }
}

impl GpioLine for SysfsGpio {
    fn pin(&self) -> u32 {
        self.pin
    }

    fn open(&mut self, direction: Direction, initial: Level) -> HalResult<()> {
        self.export()?;
        let dir = self.pin_dir();
        let value = match (direction, initial) {
            (Direction::Input, _) => "in",
            // "high"/"low" set direction and level atomically.
            (Direction::Output, Level::High) => "high",
            (Direction::Output, Level::Low) => "low",
        };
        self.write_attr(&dir.join("direction"), value)?;
        self.direction = direction;
        self.last = initial;
        self.open = true;
        debug!("GPIO {} open as {:?}", self.pin, direction);
        Ok(())
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if self.exported_by_us {
            let unexport = self.root.join("unexport");
            if let Err(e) = fs::write(&unexport, self.pin.to_string()) {
                debug!("GPIO {} unexport failed: {}", self.pin, e);
            }
            self.exported_by_us = false;
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn write(&mut self, level: Level) -> HalResult<()> {
        if !self.open {
            return Err(HalError::NotOpen(format!("gpio{}", self.pin)));
        }
        if self.direction != Direction::Output {
            return Err(HalError::InvalidParam(format!("gpio{} is an input", self.pin)));
        }
        let value = if level.is_high() { "1" } else { "0" };
        self.write_attr(&self.pin_dir().join("value"), value)?;
        self.last = level;
        Ok(())
    }

    fn read(&mut self) -> HalResult<Level> {
        if !self.open {
            return Err(HalError::NotOpen(format!("gpio{}", self.pin)));
        }
        if self.direction == Direction::Output {
            return Ok(self.last);
        }
        let path = self.pin_dir().join("value");
        let raw = fs::read_to_string(&path)
            .map_err(|e| HalError::io(path.display().to_string(), e))?;
        match raw.trim() {
            "0" => Ok(Level::Low),
            "1" => Ok(Level::High),
            other => Err(HalError::io(
                path.display().to_string(),
                format!("unexpected value '{other}'"),
            )),
        }
    }
}

impl Drop for SysfsGpio {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_sysfs(pin: u32) -> TempDir {
        let root = TempDir::new().unwrap();
        let dir = root.path().join(format!("gpio{pin}"));
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("direction"), "in").unwrap();
        fs::write(dir.join("value"), "0").unwrap();
        root
    }

    #[test]
    fn test_output_writes_value() {
        let root = fake_sysfs(52);
        let mut line = SysfsGpio::with_root(root.path(), GpioId::new(1, 2, 4)).unwrap();
        line.open(Direction::Output, Level::High).unwrap();
        let dir = root.path().join("gpio52");
        assert_eq!(fs::read_to_string(dir.join("direction")).unwrap(), "high");

        line.reset().unwrap();
        assert_eq!(fs::read_to_string(dir.join("value")).unwrap(), "0");
        assert_eq!(line.toggle().unwrap(), Level::High);
        assert_eq!(fs::read_to_string(dir.join("value")).unwrap(), "1");
    }

    #[test]
    fn test_input_reads_value() {
        let root = fake_sysfs(41);
        let mut line = SysfsGpio::with_root(root.path(), GpioId::new(1, 1, 1)).unwrap();
        line.open(Direction::Input, Level::Low).unwrap();
        fs::write(root.path().join("gpio41/value"), "1\n").unwrap();
        assert_eq!(line.read().unwrap(), Level::High);
        assert!(matches!(line.write(Level::Low), Err(HalError::InvalidParam(_))));
    }

    #[test]
    fn test_export_without_udev_fails() {
        let root = TempDir::new().unwrap();
        let mut line = SysfsGpio::with_root(root.path(), GpioId::new(1, 2, 1)).unwrap();
        let err = line.open(Direction::Output, Level::Low).unwrap_err();
        assert!(matches!(err, HalError::OpenFailed { .. }));
        assert_eq!(fs::read_to_string(root.path().join("export")).unwrap(), "49");
    }

    #[test]
    fn test_not_open_and_bad_id() {
        let mut line = SysfsGpio::with_root("/tmp", GpioId::new(0, 0, 1)).unwrap();
        assert!(matches!(line.read(), Err(HalError::NotOpen(_))));
        assert!(SysfsGpio::with_root("/tmp", GpioId::new(7, 0, 0)).is_err());
    }
}
