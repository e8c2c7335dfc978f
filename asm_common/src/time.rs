//! Clock abstraction.
//!
//! Drivers and workers never call `Instant::now()` or `thread::sleep`
//! directly; they go through a [`Clock`] so that timing contracts can be
//! checked against simulated time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic millisecond clock with sleep.
pub trait Clock: Send + Sync {
    /// Milliseconds since the clock was created.
    fn now_ms(&self) -> u64;

    /// Block the calling thread for `ms` milliseconds.
    fn sleep_ms(&self, ms: u64);
}

/// Clock shared between a driver and its collaborators.
pub type SharedClock = Arc<dyn Clock>;

/// Wall-clock implementation backed by [`Instant`].
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Start a clock at zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Create a ready-to-share clock.
    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn sleep_ms(&self, ms: u64) {
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(ms));
        }
    }
}

/// Simulated clock: `sleep_ms` advances virtual time instead of blocking.
///
/// The thread yields on every sleep so that polling loops sharing the
/// clock with other threads cannot starve them.
#[derive(Debug, Default)]
pub struct SimClock {
    now_ms: AtomicU64,
}

impl SimClock {
    /// Virtual clock at t = 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual clock as a shared handle.
    pub fn shared() -> Arc<SimClock> {
        Arc::new(Self::new())
    }

    /// Move virtual time forward.
    pub fn advance_ms(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute virtual time.
    pub fn set_ms(&self, ms: u64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn sleep_ms(&self, ms: u64) {
        self.advance_ms(ms);
        std::thread::yield_now();
    }
}
