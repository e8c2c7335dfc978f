//! Simulated digital line.

use asm_common::hal::{Direction, GpioLine, HalError, HalResult, Level};
use asm_common::time::{Clock, SharedClock};
use parking_lot::Mutex;
use std::sync::Arc;

/// One recorded write to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEvent {
    /// Virtual time of the write.
    pub at_ms: u64,
    /// Level driven.
    pub level: Level,
}

#[derive(Debug)]
struct PinInner {
    level: Level,
    hold: Option<Level>,
    busy_until_ms: u64,
    open: bool,
    direction: Direction,
    log: Vec<PinEvent>,
}

/// Shared state of a simulated line. Clones observe the same pin.
///
/// The host side uses [`SimPin::line`]; the "outside world" (a simulated
/// peripheral or a test) drives and inspects the pin through the handle.
#[derive(Clone)]
pub struct SimPin {
    pin: u32,
    clock: SharedClock,
    inner: Arc<Mutex<PinInner>>,
}

impl SimPin {
    /// Pin at `initial` level.
    pub fn new(pin: u32, initial: Level, clock: SharedClock) -> Self {
        Self {
            pin,
            clock,
            inner: Arc::new(Mutex::new(PinInner {
                level: initial,
                hold: None,
                busy_until_ms: 0,
                open: false,
                direction: Direction::Input,
                log: Vec::new(),
            })),
        }
    }

    /// Host-side line bound to this pin.
    pub fn line(&self) -> SimGpio {
        SimGpio { pin: self.clone() }
    }

    /// Kernel pin number.
    pub fn number(&self) -> u32 {
        self.pin
    }

    /// Level as seen by a reader right now.
    pub fn level(&self) -> Level {
        let inner = self.inner.lock();
        if let Some(forced) = inner.hold {
            return forced;
        }
        if self.clock.now_ms() < inner.busy_until_ms {
            return Level::Low;
        }
        inner.level
    }

    /// Drive the pin from outside (input lines).
    pub fn drive(&self, level: Level) {
        self.inner.lock().level = level;
    }

    /// Force the read level regardless of writes; `None` releases it.
    pub fn hold(&self, level: Option<Level>) {
        self.inner.lock().hold = level;
    }

    /// Read low for the next `ms` milliseconds.
    pub fn busy_for(&self, ms: u64) {
        let until = self.clock.now_ms() + ms;
        let mut inner = self.inner.lock();
        inner.busy_until_ms = inner.busy_until_ms.max(until);
    }

    /// Writes performed by the host, in order.
    pub fn writes(&self) -> Vec<PinEvent> {
        self.inner.lock().log.clone()
    }

    /// Most recent host write.
    pub fn last_write(&self) -> Option<PinEvent> {
        self.inner.lock().log.last().copied()
    }

    /// Whether the host has the line open.
    pub fn is_open(&self) -> bool {
        self.inner.lock().open
    }
}

/// Host-side [`GpioLine`] over a [`SimPin`].
pub struct SimGpio {
    pin: SimPin,
}

impl GpioLine for SimGpio {
    fn pin(&self) -> u32 {
        self.pin.pin
    }

    fn open(&mut self, direction: Direction, initial: Level) -> HalResult<()> {
        let now = self.pin.clock.now_ms();
        let mut inner = self.pin.inner.lock();
        inner.open = true;
        inner.direction = direction;
        if direction == Direction::Output {
            inner.level = initial;
            inner.log.push(PinEvent {
                at_ms: now,
                level: initial,
            });
        }
        Ok(())
    }

    fn close(&mut self) {
        self.pin.inner.lock().open = false;
    }

    fn is_open(&self) -> bool {
        self.pin.is_open()
    }

    fn write(&mut self, level: Level) -> HalResult<()> {
        let now = self.pin.clock.now_ms();
        let mut inner = self.pin.inner.lock();
        if !inner.open {
            return Err(HalError::NotOpen(format!("gpio{}", self.pin.pin)));
        }
        inner.level = level;
        inner.log.push(PinEvent { at_ms: now, level });
        Ok(())
    }

    fn read(&mut self) -> HalResult<Level> {
        if !self.pin.is_open() {
            return Err(HalError::NotOpen(format!("gpio{}", self.pin.pin)));
        }
        Ok(self.pin.level())
    }
}
