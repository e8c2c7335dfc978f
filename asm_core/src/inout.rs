//! I/O worker: lamp/relay expanders and keypad scanning on one shared bus.
//!
//! Outputs use inverted logic (logical ON drives the pin low), so both
//! expanders are written `0xFF` at start and at stop.

use std::collections::VecDeque;
use std::sync::Arc;

use asm_common::config::IoConfig;
use asm_common::hal::{HalResult, I2cBus, SharedI2cBus};
use asm_common::io::{Expander, IoId, KEY_NONE, KeyEvent, Keymap, MAX_IO};
use asm_common::time::SharedClock;
use asm_hal::Pcf8574;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::WorkerError;
use crate::keypad::Keypad;
use crate::worker::Worker;

const ALL_OFF: u8 = 0xFF;

struct Outputs {
    low: Pcf8574,
    high: Pcf8574,
    state: [bool; MAX_IO],
}

impl Outputs {
    fn expander(&mut self, which: Expander) -> &mut Pcf8574 {
        match which {
            Expander::Low => &mut self.low,
            Expander::High => &mut self.high,
        }
    }
}

/// Output and keystroke access shared by the worker and the supervisor.
pub struct IoPort {
    bus: SharedI2cBus,
    outputs: Mutex<Outputs>,
    events: Mutex<VecDeque<KeyEvent>>,
    capacity: usize,
}

impl IoPort {
    /// Port over `bus` with the expander addresses from `config`.
    pub fn new(bus: SharedI2cBus, config: &IoConfig) -> Self {
        Self {
            bus,
            outputs: Mutex::new(Outputs {
                low: Pcf8574::new(config.low_expander),
                high: Pcf8574::new(config.high_expander),
                state: [false; MAX_IO],
            }),
            events: Mutex::new(VecDeque::with_capacity(config.queue_capacity)),
            capacity: config.queue_capacity,
        }
    }

    /// Run `f` with the bus locked.
    pub fn with_bus<R>(&self, f: impl FnOnce(&mut dyn I2cBus) -> R) -> R {
        let mut bus = self.bus.lock();
        f(bus.as_mut())
    }

    /// Switch one output.
    pub fn set(&self, id: IoId, on: bool) -> HalResult<()> {
        let point = id.point();
        let mut outputs = self.outputs.lock();
        self.with_bus(|bus| {
            outputs
                .expander(point.expander)
                .write_pin(bus, point.pin, point.electrical(on))
        })?;
        outputs.state[id as usize] = on;
        debug!("io: {} {}", id, if on { "on" } else { "off" });
        Ok(())
    }

    fn set_checked(&self, index: u8, on: bool, relay: bool) -> bool {
        let id = IoId::from_index(index).filter(|id| id.is_relay() == relay);
        let Some(id) = id else {
            warn!("io: no {} with id {}", if relay { "relay" } else { "lamp" }, index);
            return false;
        };
        match self.set(id, on) {
            Ok(()) => true,
            Err(e) => {
                debug!("io: {} write failed: {}", id, e);
                false
            }
        }
    }

    /// Switch lamp `index` (0..4).
    pub fn led(&self, index: u8, on: bool) -> bool {
        self.set_checked(index, on, false)
    }

    /// Switch relay `index` (5..10).
    pub fn relay(&self, index: u8, on: bool) -> bool {
        self.set_checked(index, on, true)
    }

    /// Invert one output; returns the new logical state.
    pub fn toggle(&self, id: IoId) -> HalResult<bool> {
        let next = !self.is_on(id);
        self.set(id, next)?;
        Ok(next)
    }

    /// Last logical state written.
    pub fn is_on(&self, id: IoId) -> bool {
        self.outputs.lock().state[id as usize]
    }

    /// Drive every output OFF.
    pub fn all_off(&self) -> HalResult<()> {
        let mut outputs = self.outputs.lock();
        self.with_bus(|bus| {
            outputs.low.write8(bus, ALL_OFF)?;
            outputs.high.write8(bus, ALL_OFF)
        })?;
        outputs.state = [false; MAX_IO];
        Ok(())
    }

    /// Queue a keystroke; dropped when the queue is full.
    pub fn push_event(&self, event: KeyEvent) -> bool {
        let mut events = self.events.lock();
        if events.len() >= self.capacity {
            warn!("io: key queue full, dropping '{}'", event.ch);
            return false;
        }
        events.push_back(event);
        true
    }

    /// Oldest keystroke.
    pub fn next_event(&self) -> Option<KeyEvent> {
        self.events.lock().pop_front()
    }

    /// Keystrokes waiting.
    pub fn pending_events(&self) -> usize {
        self.events.lock().len()
    }
}

/// Scans the keypad and owns output initialisation.
pub struct IoWorker {
    port: Arc<IoPort>,
    keypad: Keypad,
    keymap: Keymap,
    clock: SharedClock,
    period_ms: u64,
}

impl IoWorker {
    /// Worker over `bus`.
    pub fn new(bus: SharedI2cBus, config: &IoConfig, clock: SharedClock) -> Self {
        Self {
            port: Arc::new(IoPort::new(bus, config)),
            keypad: Keypad::new(config.keypad, config.debounce_ms),
            keymap: Keymap::parse(&config.keymap).unwrap_or_default(),
            clock,
            period_ms: config.scan_interval_ms,
        }
    }

    /// Port shared with the supervisor.
    pub fn port(&self) -> Arc<IoPort> {
        Arc::clone(&self.port)
    }
}

impl Worker for IoWorker {
    fn name(&self) -> &'static str {
        "io"
    }

    fn start(&mut self) -> Result<(), WorkerError> {
        self.port.all_off()?;
        let keypad = &mut self.keypad;
        self.port.with_bus(|bus| keypad.begin(bus))?;
        info!("io: outputs off, keypad at 0x{:02X}", self.keypad.address());
        Ok(())
    }

    fn cycle(&mut self) {
        let now = self.clock.now_ms();
        let keypad = &mut self.keypad;
        let code = self.port.with_bus(|bus| keypad.get_key(bus, now));
        if code >= KEY_NONE {
            return;
        }
        if let Some(ch) = self.keymap.char_for(code) {
            debug!("io: key '{}' ({})", ch, code);
            self.port.push_event(KeyEvent { ch, code });
        }
    }

    fn period_ms(&self) -> u64 {
        self.period_ms
    }

    fn stop(&mut self) {
        if let Err(e) = self.port.all_off() {
            warn!("io: could not switch outputs off: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asm_common::hal::share_bus;
    use asm_common::time::SimClock;
    use asm_hal::simulation::{SimI2cBus, SimI2cHandle};

    fn setup() -> (IoWorker, SimI2cHandle, Arc<SimClock>) {
        let bus = SimI2cBus::new();
        let handle = bus.handle();
        let config = IoConfig::default();
        handle.add_device(config.low_expander);
        handle.add_device(config.high_expander);
        handle.add_keypad(config.keypad);
        let clock = SimClock::shared();
        let worker = IoWorker::new(share_bus(Box::new(bus)), &config, clock.clone());
        (worker, handle, clock)
    }

    // ─── Outputs ────────────────────────────────────────────────────

    #[test]
    fn test_outputs_inverted() {
        let (mut io, handle, _) = setup();
        io.start().unwrap();
        let port = io.port();
        assert_eq!(handle.register(0x26), Some(0xFF));
        assert_eq!(handle.register(0x20), Some(0xFF));

        assert!(port.led(0, true));
        assert_eq!(handle.register(0x26), Some(0x7F));
        assert!(port.relay(10, true));
        assert_eq!(handle.register(0x20), Some(0xDF));
        assert!(port.is_on(IoId::Rele6));

        assert!(port.led(0, false));
        assert_eq!(handle.register(0x26), Some(0xFF));

        assert!(port.toggle(IoId::Rele1).unwrap());
        assert_eq!(handle.register(0x26), Some(0xFB));

        io.stop();
        assert_eq!(handle.register(0x26), Some(0xFF));
        assert_eq!(handle.register(0x20), Some(0xFF));
        assert!(!port.is_on(IoId::Rele6));
    }

    #[test]
    fn test_rejects_unknown_ids() {
        let (mut io, handle, _) = setup();
        io.start().unwrap();
        let port = io.port();
        let writes = handle.writes(0x26).len();
        assert!(!port.led(11, true));
        assert!(!port.led(5, true));
        assert!(!port.relay(4, true));
        assert_eq!(handle.writes(0x26).len(), writes);
    }

    #[test]
    fn test_bus_fault_reported() {
        let (mut io, handle, _) = setup();
        io.start().unwrap();
        handle.set_fault(0x20, true);
        assert!(!io.port().relay(8, true));
        assert!(!io.port().is_on(IoId::Rele4));
    }

    // ─── Keystrokes ─────────────────────────────────────────────────

    #[test]
    fn test_scan_queues_mapped_keys() {
        let (mut io, handle, clock) = setup();
        io.start().unwrap();
        let port = io.port();

        handle.press(5);
        for _ in 0..20 {
            io.cycle();
            clock.advance_ms(10);
        }
        handle.release();
        for _ in 0..20 {
            io.cycle();
            clock.advance_ms(10);
        }
        handle.press(15);
        io.cycle();

        assert_eq!(port.next_event(), Some(KeyEvent { ch: '5', code: 5 }));
        assert_eq!(port.next_event(), Some(KeyEvent { ch: 'D', code: 15 }));
        assert_eq!(port.next_event(), None);
    }

    #[test]
    fn test_queue_bounded() {
        let (io, _, _) = setup();
        let port = io.port();
        for _ in 0..IoConfig::default().queue_capacity {
            assert!(port.push_event(KeyEvent { ch: '1', code: 0 }));
        }
        assert!(!port.push_event(KeyEvent { ch: '2', code: 1 }));
        assert_eq!(port.pending_events(), IoConfig::default().queue_capacity);
    }
}
