//! Supervisor lifecycle on the simulated board.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use asm_common::config::{ConfigError, MachineConfig};
use asm_common::hal::Level;
use asm_common::time::{SimClock, SystemClock};
use asm_core::{Board, SimHandles, Supervisor, SupervisorError};
use tempfile::TempDir;

fn host_dir(content: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("asm-config.cfg"), content).unwrap();
    dir
}

fn supervisor(dir: &Path) -> (Supervisor, Board, SimHandles) {
    let config = MachineConfig::default();
    let clock = SimClock::shared();
    let (board, sim) = Board::simulated(&config, clock.clone());
    (Supervisor::new(dir, config, clock), board, sim)
}

fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(1));
    }
}

// ─── Startup ────────────────────────────────────────────────────────

#[test]
fn test_start_brings_everything_up() {
    let dir = host_dir("address_high=18\naddress_low=52\n");
    let (mut sup, board, sim) = supervisor(dir.path());
    sup.start(board).unwrap();

    assert_eq!(sup.running_workers(), vec!["blink", "gnss", "radio", "io"]);
    assert_eq!(sup.host().map(|h| (h.address_high, h.address_low)), Some((0x12, 0x34)));
    assert_eq!(&sim.lora.registers()[..2], &[0x12, 0x34]);
    assert_eq!(sim.io.register(0x26), Some(0xFF));
    assert_eq!(sim.io.register(0x20), Some(0xFF));
    assert!(sim.status_led.is_open());
    assert!(sim.display.began());
    assert_eq!(sim.display.row(0), "AIRSOFT GAME MACHINE");
    assert_eq!(sup.engine().and_then(|e| e.current_name()), Some("Main Page"));

    sup.shutdown();
}

#[test]
fn test_missing_host_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let (mut sup, board, sim) = supervisor(dir.path());
    let err = sup.start(board).unwrap_err();
    assert!(matches!(err, SupervisorError::Config(ConfigError::FileNotFound(_))));
    assert!(sup.running_workers().is_empty());
    assert!(sim.status_led.writes().is_empty());
    assert!(sup.engine().is_none());
}

#[test]
fn test_partial_start_is_unwound() {
    let dir = host_dir("address_high=1\naddress_low=2\n");
    let (mut sup, board, sim) = supervisor(dir.path());
    sim.gnss.fail_open(true);

    let err = sup.start(board).unwrap_err();
    assert!(matches!(err, SupervisorError::Worker { name: "gnss", .. }));
    // blink was started and stopped again
    assert!(!sim.status_led.writes().is_empty());
    assert!(!sim.status_led.is_open());
    // radio never touched
    assert_eq!(sim.lora.config_commands(), 0);
    assert!(sup.running_workers().is_empty());

    let (board, _) = Board::simulated(&MachineConfig::default(), SimClock::shared());
    assert!(matches!(sup.start(board), Err(SupervisorError::AlreadyStarted)));
}

#[test]
fn test_bad_host_address_is_fatal() {
    let dir = host_dir("address_high=255\naddress_low=255\n");
    let (mut sup, board, _) = supervisor(dir.path());
    assert!(matches!(
        sup.start(board),
        Err(SupervisorError::Config(ConfigError::ValidationError(_)))
    ));
}

// ─── Main loop ──────────────────────────────────────────────────────

#[test]
fn test_key_a_broadcasts_hello() {
    let dir = host_dir("address_high=18\naddress_low=52\n");
    let (mut sup, board, sim) = supervisor(dir.path());
    sup.start(board).unwrap();

    sim.io.press(3);
    let hello = vec![0xFF, 0xFF, 0x04, 0x48, 0x45, 0x4C, 0x4C, 0x4F];
    wait_until("HELLO on air", || {
        sup.poll().unwrap();
        sim.lora.air_frames().iter().any(|f| f.data == hello)
    });
    sim.io.release();
    sup.shutdown();
}

#[test]
fn test_gnss_fix_reaches_display() {
    let dir = host_dir("address_high=18\naddress_low=52\n");
    let (mut sup, board, sim) = supervisor(dir.path());
    sup.start(board).unwrap();
    wait_until("fix on row 3", || {
        sup.poll().unwrap();
        sim.display.row(3).starts_with("GPS STD SAT 08")
    });
    sup.shutdown();
}

#[test]
fn test_digit_toggles_lamp() {
    let dir = host_dir("address_high=18\naddress_low=52\n");
    let (mut sup, board, sim) = supervisor(dir.path());
    sup.start(board).unwrap();

    // '2' is matrix index 1 -> LED2 on pin 6 of the low expander
    sim.io.press(1);
    wait_until("LED2 on", || {
        sup.poll().unwrap();
        sim.io.register(0x26) == Some(0xBF)
    });
    sim.io.release();
    sup.shutdown();
    assert_eq!(sim.io.register(0x26), Some(0xFF));
}

// ─── Shutdown ───────────────────────────────────────────────────────

#[test]
fn test_run_returns_when_flag_cleared() {
    let dir = host_dir("address_high=18\naddress_low=52\n");
    let (mut sup, board, sim) = supervisor(dir.path());
    sup.start(board).unwrap();
    sup.running_flag().store(false, Ordering::SeqCst);
    sup.run().unwrap();
    sup.shutdown();

    assert!(sup.running_workers().is_empty());
    assert!(sup.engine().is_none());
    assert!(!sim.status_led.is_open());
    assert!(!sim.status_led.level().is_high());
    assert!(matches!(sup.poll(), Err(SupervisorError::NotStarted)));
}

#[test]
fn test_shutdown_detaches_worker_past_join_bound() {
    let dir = host_dir("address_high=18\naddress_low=52\n");
    let mut config = MachineConfig::default();
    config.status_led.blink_interval_ms = 3_000;
    config.supervisor.join_timeout_ms = 50;
    let clock = SystemClock::shared();
    let (board, sim) = Board::simulated(&config, clock.clone());
    let mut sup = Supervisor::new(dir.path(), config, clock);
    sup.start(board).unwrap();

    // the blink thread is asleep for its full period and misses the bound
    let begun = Instant::now();
    sup.shutdown();
    assert!(begun.elapsed() < Duration::from_secs(2));
    assert!(sup.running_workers().is_empty());
    assert!(sup.engine().is_none());
    assert!(sim.status_led.is_open());

    // the detached thread still releases its lamp when it wakes
    wait_until("lamp released", || !sim.status_led.is_open());
    assert_eq!(sim.status_led.level(), Level::Low);
}
