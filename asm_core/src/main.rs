//! # Airsoft Game Machine
//!
//! On-board controller: LoRa radio, GNSS, keypad, lamps/relays and a
//! 20x4 display.
//!
//! # Usage
//!
//! ```bash
//! # Board hardware, host file in ./airsoft/asm-config.cfg
//! asm_core
//!
//! # In-memory hardware; type `key 5` to press a key, `quit` to stop
//! asm_core --config-dir airsoft/ --simulate
//!
//! # Custom wiring, verbose JSON logs
//! asm_core --machine machine.toml -v --json
//! ```

#![deny(warnings)]

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use asm_common::config::{HostConfig, LogLevel, MachineConfig};
use asm_common::io::Keymap;
use asm_common::time::{SharedClock, SystemClock};
use asm_core::{Board, SimHandles, Supervisor, SupervisorError};
use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

/// Airsoft game machine controller
#[derive(Parser, Debug)]
#[command(name = "asm_core")]
#[command(version)]
#[command(about = "Game machine controller: radio, GNSS, keypad, outputs and display")]
#[command(long_about = None)]
struct Args {
    /// Directory holding asm-config.cfg (default: <cwd>/airsoft).
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Board wiring file (TOML). Built-in defaults when omitted.
    #[arg(short, long, value_name = "FILE")]
    machine: Option<PathBuf>,

    /// Use in-memory hardware
    #[arg(short = 's', long)]
    simulate: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let machine = MachineConfig::load_or_default(args.machine.as_deref());
    setup_tracing(&args, machine.as_ref().map_or(LogLevel::Info, |m| m.log_level));

    match machine.map_err(SupervisorError::from).and_then(|m| run(&args, m)) {
        Ok(()) => {
            info!("Game machine shutdown complete");
            std::process::exit(0);
        }
        Err(e) => {
            error!("Game machine startup failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: &Args, machine: MachineConfig) -> Result<(), SupervisorError> {
    info!("Game machine v{} starting...", env!("CARGO_PKG_VERSION"));

    let clock: SharedClock = SystemClock::shared();
    let (board, sim) = if args.simulate {
        info!("Simulation mode enabled");
        let (board, handles) = Board::simulated(&machine, clock.clone());
        (board, Some(handles))
    } else {
        let board = Board::linux(&machine, clock.clone()).map_err(SupervisorError::Board)?;
        (board, None)
    };

    let config_dir = args.config_dir.clone().unwrap_or_else(HostConfig::default_dir);
    let keymap = Keymap::parse(&machine.io.keymap).unwrap_or_default();
    let hold_ms = machine.io.debounce_ms * 2;
    let mut supervisor = Supervisor::new(config_dir, machine, clock);

    let running = supervisor.running_flag();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    }) {
        warn!("No signal handler installed: {}", e);
    }
    spawn_console(supervisor.running_flag(), sim, keymap, hold_ms);

    supervisor.start(board)?;
    let result = supervisor.run();
    supervisor.shutdown();
    result
}

/// Read commands from stdin: `quit` stops the supervisor; with the
/// simulated board, `key <c>` presses and releases a key.
fn spawn_console(running: Arc<AtomicBool>, sim: Option<SimHandles>, keymap: Keymap, hold_ms: u64) {
    let spawned = std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                let line = line.trim();
                if line == "quit" {
                    info!("Quit requested");
                    running.store(false, Ordering::SeqCst);
                    break;
                }
                match (line.strip_prefix("key "), sim.as_ref()) {
                    (Some(key), Some(sim)) => press(sim, &keymap, key.trim(), hold_ms),
                    _ => warn!("Unknown command '{}'", line),
                }
            }
        });
    if let Err(e) = spawned {
        warn!("No console: {}", e);
    }
}

fn press(sim: &SimHandles, keymap: &Keymap, key: &str, hold_ms: u64) {
    let Some(ch) = key.chars().next() else {
        return;
    };
    let Some(code) = (0..16u8).find(|&c| keymap.char_for(c) == Some(ch)) else {
        warn!("No key '{}' on the keypad", ch);
        return;
    };
    sim.io.press(code);
    std::thread::sleep(std::time::Duration::from_millis(hold_ms));
    sim.io.release();
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args, level: LogLevel) {
    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        let directive: Directive = level
            .as_directive()
            .parse()
            .unwrap_or_else(|_| Level::INFO.into());
        EnvFilter::from_default_env().add_directive(directive)
    };

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
