//! Keystroke delivery through the I/O worker on virtual time.

use std::sync::Arc;

use asm_common::config::IoConfig;
use asm_common::hal::share_bus;
use asm_common::io::{KEY_NONE, KeyEvent};
use asm_common::time::SimClock;
use asm_core::inout::{IoPort, IoWorker};
use asm_core::keypad::Keypad;
use asm_core::worker::Worker;
use asm_hal::simulation::{SimI2cBus, SimI2cHandle};

const SCAN_MS: u64 = 10;

fn io() -> (IoWorker, Arc<IoPort>, SimI2cHandle, Arc<SimClock>) {
    let config = IoConfig::default();
    let bus = SimI2cBus::new();
    let handle = bus.handle();
    handle.add_device(config.low_expander);
    handle.add_device(config.high_expander);
    handle.add_keypad(config.keypad);
    let clock = SimClock::shared();
    let mut worker = IoWorker::new(share_bus(Box::new(bus)), &config, clock.clone());
    worker.start().unwrap();
    let port = worker.port();
    (worker, port, handle, clock)
}

/// Cycle the worker every scan period until `until_ms`, returning the
/// keystrokes with the time they were queued.
fn run_until(
    worker: &mut IoWorker,
    port: &IoPort,
    clock: &SimClock,
    until_ms: u64,
    out: &mut Vec<(u64, KeyEvent)>,
) {
    use asm_common::time::Clock;
    while clock.now_ms() < until_ms {
        worker.cycle();
        while let Some(event) = port.next_event() {
            out.push((clock.now_ms(), event));
        }
        clock.advance_ms(SCAN_MS);
    }
}

// ─── Debounce ───────────────────────────────────────────────────────

#[test]
fn test_press_hold_release_press() {
    let (mut worker, port, keys, clock) = io();
    let mut events = Vec::new();

    keys.press(5);
    run_until(&mut worker, &port, &clock, 250, &mut events);
    keys.release();
    run_until(&mut worker, &port, &clock, 300, &mut events);
    keys.press(5);
    run_until(&mut worker, &port, &clock, 800, &mut events);

    let five = KeyEvent { ch: '5', code: 5 };
    assert_eq!(events.len(), 2, "{events:?}");
    assert_eq!(events[0], (0, five));
    assert_eq!(events[1].1, five);
    assert!(events[1].0 >= 300);
}

#[test]
fn test_every_event_follows_a_release() {
    // keypad driven directly to observe every raw scan
    let bus = SimI2cBus::new();
    let keys = bus.handle();
    keys.add_keypad(0x23);
    let mut bus: Box<dyn asm_common::hal::I2cBus> = Box::new(bus);
    let mut keypad = Keypad::new(0x23, 100);
    keypad.begin(bus.as_mut()).unwrap();

    // (hardware state, duration ms): chatter, holds, key changes
    let script: &[(Option<u8>, u64)] = &[
        (Some(1), 30),
        (None, 20),
        (Some(1), 300),
        (Some(2), 200),
        (None, 40),
        (Some(2), 150),
        (None, 200),
        (Some(7), 60),
        (None, 5),
        (Some(7), 400),
        (None, 300),
    ];

    let mut now = 0;
    let mut released_since_event = true;
    let mut delivered = 0;
    for &(state, duration) in script {
        match state {
            Some(code) => keys.press(code),
            None => keys.release(),
        }
        let end = now + duration;
        while now < end {
            let raw_released = state.is_none();
            let key = keypad.get_key(bus.as_mut(), now);
            if key < KEY_NONE {
                assert!(released_since_event, "key {key} at {now} ms without a release");
                released_since_event = false;
                delivered += 1;
            } else if raw_released && key == KEY_NONE {
                released_since_event = true;
            }
            now += SCAN_MS;
        }
    }
    assert!(delivered >= 3, "only {delivered} keystrokes");
}
