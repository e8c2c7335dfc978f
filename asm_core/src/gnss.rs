//! GNSS worker: drains the receiver's serial line into the NMEA parser and
//! publishes each committed fix as a snapshot.

use std::sync::Arc;

use asm_common::config::GnssConfig;
use asm_common::hal::SerialLine;
use asm_gnss::{Fix, NmeaParser, Statistics};
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::WorkerError;
use crate::worker::Worker;

/// Largest read per cycle.
const MAX_CHUNK: usize = 512;
/// Serial read timeout; reads are sized to what is already buffered.
const READ_TIMEOUT_MS: u64 = 10;

#[derive(Default)]
struct SnapshotState {
    fix: Option<Arc<Fix>>,
    stats: Statistics,
    published: u64,
}

/// Latest committed fix, shared with readers.
#[derive(Default)]
pub struct GnssSnapshot {
    state: Mutex<SnapshotState>,
}

impl GnssSnapshot {
    /// Empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the fix and parser counters.
    pub fn publish(&self, fix: Fix, stats: Statistics) {
        let mut state = self.state.lock();
        state.fix = Some(Arc::new(fix));
        state.stats = stats;
        state.published += 1;
    }

    fn update_stats(&self, stats: Statistics) {
        self.state.lock().stats = stats;
    }

    /// Latest fix, if one was committed.
    pub fn latest(&self) -> Option<Arc<Fix>> {
        self.state.lock().fix.clone()
    }

    /// Parser counters at the last cycle.
    pub fn stats(&self) -> Statistics {
        self.state.lock().stats
    }

    /// Fixes published so far.
    pub fn published(&self) -> u64 {
        self.state.lock().published
    }
}

/// Owns the GNSS serial line and the parser.
pub struct GnssWorker {
    serial: Box<dyn SerialLine>,
    parser: NmeaParser,
    snapshot: Arc<GnssSnapshot>,
    baud_rate: u32,
    period_ms: u64,
    buf: Vec<u8>,
}

impl GnssWorker {
    /// Worker reading from `serial`.
    pub fn new(serial: Box<dyn SerialLine>, config: &GnssConfig) -> Self {
        Self {
            serial,
            parser: NmeaParser::new(),
            snapshot: Arc::new(GnssSnapshot::new()),
            baud_rate: config.baud_rate,
            period_ms: config.loop_interval_ms,
            buf: vec![0u8; MAX_CHUNK],
        }
    }

    /// Snapshot shared with readers.
    pub fn snapshot(&self) -> Arc<GnssSnapshot> {
        Arc::clone(&self.snapshot)
    }

    fn drain(&mut self) -> Result<usize, asm_common::hal::HalError> {
        let pending = self.serial.available()?.min(MAX_CHUNK);
        if pending == 0 {
            return Ok(0);
        }
        let n = self.serial.read(&mut self.buf[..pending])?;
        self.parser.feed(&self.buf[..n]);
        Ok(n)
    }
}

impl Worker for GnssWorker {
    fn name(&self) -> &'static str {
        "gnss"
    }

    fn start(&mut self) -> Result<(), WorkerError> {
        self.serial.set_baud_rate(self.baud_rate)?;
        self.serial.set_timeout(Duration::from_millis(READ_TIMEOUT_MS));
        self.serial.open()?;
        info!("gnss: listening at {} baud", self.baud_rate);
        Ok(())
    }

    fn cycle(&mut self) {
        match self.drain() {
            Ok(0) => {}
            Ok(n) => {
                let stats = self.parser.stats();
                match self.parser.take_fix() {
                    Some(fix) => {
                        debug!("gnss: fix {} with {} satellites ({} bytes)", fix.status, fix.satellites, n);
                        self.snapshot.publish(fix, stats);
                    }
                    None => self.snapshot.update_stats(stats),
                }
            }
            Err(e) => debug!("gnss: read failed: {}", e),
        }
    }

    fn period_ms(&self) -> u64 {
        self.period_ms
    }

    fn stop(&mut self) {
        self.serial.close();
    }
}
