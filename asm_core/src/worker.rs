//! Worker threads.
//!
//! A worker acquires its devices in [`Worker::start`] on the caller's
//! thread, so startup failures reach the supervisor as values. It then runs
//! on its own OS thread: one [`Worker::cycle`] per period until the running
//! flag is cleared, followed by [`Worker::stop`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use asm_common::time::SharedClock;
use tracing::{info, warn};

use crate::error::WorkerError;

/// Poll step while waiting for a worker thread to finish.
const JOIN_POLL: Duration = Duration::from_millis(5);

/// Join bound used when a handle is dropped without an explicit stop.
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// A long-running device loop.
pub trait Worker: Send + 'static {
    /// Thread name and log prefix.
    fn name(&self) -> &'static str;

    /// Open and configure devices. Called once, before the thread exists.
    fn start(&mut self) -> Result<(), WorkerError>;

    /// One loop iteration. Transient errors are handled inside.
    fn cycle(&mut self);

    /// Sleep between cycles.
    fn period_ms(&self) -> u64;

    /// Release devices. Called on the worker thread after the last cycle.
    fn stop(&mut self) {}
}

/// Running worker thread.
pub struct WorkerHandle {
    name: &'static str,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Worker name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the thread is still alive.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Clear the running flag and join within `timeout`.
    ///
    /// Returns `false` if the thread did not finish in time; it is then
    /// detached and a warning is logged.
    pub fn stop(&mut self, timeout: Duration) -> bool {
        self.running.store(false, Ordering::SeqCst);
        let Some(thread) = self.thread.take() else {
            return true;
        };

        let deadline = Instant::now() + timeout;
        while !thread.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    "{}: did not stop within {} ms, detaching",
                    self.name,
                    timeout.as_millis()
                );
                return false;
            }
            std::thread::sleep(JOIN_POLL);
        }
        if thread.join().is_err() {
            warn!("{}: thread panicked", self.name);
        }
        true
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.stop(DEFAULT_JOIN_TIMEOUT);
        }
    }
}

/// Start `worker` and run it on a new thread.
pub fn spawn<W: Worker>(mut worker: W, clock: SharedClock) -> Result<WorkerHandle, WorkerError> {
    let name = worker.name();
    worker.start()?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    let thread = std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            info!("{name}: running");
            while flag.load(Ordering::SeqCst) {
                worker.cycle();
                clock.sleep_ms(worker.period_ms());
            }
            worker.stop();
            info!("{name}: stopped");
        })
        .map_err(|e| WorkerError::Spawn(e.to_string()))?;

    Ok(WorkerHandle {
        name,
        running,
        thread: Some(thread),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use asm_common::hal::HalError;
    use asm_common::time::SimClock;
    use std::sync::atomic::AtomicUsize;

    struct Counter {
        cycles: Arc<AtomicUsize>,
        stopped: Arc<AtomicBool>,
        fail: bool,
    }

    impl Worker for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        fn start(&mut self) -> Result<(), WorkerError> {
            if self.fail {
                return Err(HalError::NotOpen("counter".into()).into());
            }
            Ok(())
        }

        fn cycle(&mut self) {
            self.cycles.fetch_add(1, Ordering::SeqCst);
        }

        fn period_ms(&self) -> u64 {
            10
        }

        fn stop(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    fn counter(fail: bool) -> (Counter, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let cycles = Arc::new(AtomicUsize::new(0));
        let stopped = Arc::new(AtomicBool::new(false));
        let worker = Counter {
            cycles: Arc::clone(&cycles),
            stopped: Arc::clone(&stopped),
            fail,
        };
        (worker, cycles, stopped)
    }

    #[test]
    fn test_runs_until_stopped() {
        let (worker, cycles, stopped) = counter(false);
        let mut handle = spawn(worker, SimClock::shared()).unwrap();
        while cycles.load(Ordering::SeqCst) < 3 {
            std::thread::yield_now();
        }
        assert!(handle.stop(Duration::from_secs(5)));
        assert!(stopped.load(Ordering::SeqCst));
        assert!(!handle.is_running());
        // second stop is a no-op
        assert!(handle.stop(Duration::from_millis(1)));
    }

    struct Stuck {
        entered: Arc<AtomicBool>,
        stopped: Arc<AtomicBool>,
    }

    impl Worker for Stuck {
        fn name(&self) -> &'static str {
            "stuck"
        }

        fn start(&mut self) -> Result<(), WorkerError> {
            Ok(())
        }

        fn cycle(&mut self) {
            self.entered.store(true, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(300));
        }

        fn period_ms(&self) -> u64 {
            1
        }

        fn stop(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_join_timeout_detaches_blocked_worker() {
        let entered = Arc::new(AtomicBool::new(false));
        let stopped = Arc::new(AtomicBool::new(false));
        let worker = Stuck {
            entered: Arc::clone(&entered),
            stopped: Arc::clone(&stopped),
        };
        let mut handle = spawn(worker, SimClock::shared()).unwrap();
        while !entered.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }

        let begun = Instant::now();
        assert!(!handle.stop(Duration::from_millis(20)));
        assert!(begun.elapsed() < Duration::from_millis(250));
        assert!(!stopped.load(Ordering::SeqCst));
        // detached: nothing left to join
        assert!(!handle.is_running());
        assert!(handle.stop(Duration::from_millis(1)));

        // the thread leaves its cycle, sees the cleared flag and releases
        let deadline = Instant::now() + Duration::from_secs(5);
        while !stopped.load(Ordering::SeqCst) {
            assert!(Instant::now() < deadline, "stuck worker never stopped");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_start_failure_spawns_nothing() {
        let (worker, cycles, _) = counter(true);
        let err = spawn(worker, SimClock::shared()).err().unwrap();
        assert!(matches!(err, WorkerError::Hardware(_)));
        assert_eq!(cycles.load(Ordering::SeqCst), 0);
    }
}
