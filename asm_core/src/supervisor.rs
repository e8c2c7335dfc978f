//! Supervisor: startup, the page loop and ordered shutdown.
//!
//! Startup order: host configuration, status lamp blink, GNSS, radio,
//! I/O, display, main page. Shutdown runs in reverse and only touches what
//! was started, so it also cleans up after a failed start.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use asm_common::config::{HostConfig, MachineConfig};
use asm_common::hal::share_bus;
use asm_common::time::SharedClock;
use asm_lora::E220;
use tracing::{debug, info, warn};

use crate::blink::BlinkWorker;
use crate::board::Board;
use crate::display::{MainPage, PageEngine, Screen};
use crate::error::SupervisorError;
use crate::gnss::GnssWorker;
use crate::inout::IoWorker;
use crate::radio::RadioWorker;
use crate::services::Services;
use crate::worker::{Worker, WorkerHandle, spawn};

/// Owns every worker and the page engine.
pub struct Supervisor {
    config_dir: PathBuf,
    machine: MachineConfig,
    clock: SharedClock,
    running: Arc<AtomicBool>,
    started: bool,
    host: Option<HostConfig>,
    blink: Option<WorkerHandle>,
    gnss: Option<WorkerHandle>,
    radio: Option<WorkerHandle>,
    io: Option<WorkerHandle>,
    engine: Option<PageEngine>,
}

impl Supervisor {
    /// Supervisor reading the host file from `config_dir`.
    pub fn new(config_dir: impl Into<PathBuf>, machine: MachineConfig, clock: SharedClock) -> Self {
        Self {
            config_dir: config_dir.into(),
            machine,
            clock,
            running: Arc::new(AtomicBool::new(true)),
            started: false,
            host: None,
            blink: None,
            gnss: None,
            radio: None,
            io: None,
            engine: None,
        }
    }

    /// Flag cleared to leave [`Supervisor::run`].
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Host identity, once loaded.
    pub fn host(&self) -> Option<HostConfig> {
        self.host
    }

    /// Page engine, once started.
    pub fn engine(&self) -> Option<&PageEngine> {
        self.engine.as_ref()
    }

    /// Names of the workers currently running, in start order.
    pub fn running_workers(&self) -> Vec<&'static str> {
        [&self.blink, &self.gnss, &self.radio, &self.io]
            .into_iter()
            .flatten()
            .filter(|h| h.is_running())
            .map(|h| h.name())
            .collect()
    }

    /// Bring everything up on `board`. On failure whatever was started is
    /// stopped again before the error is returned.
    pub fn start(&mut self, board: Board) -> Result<(), SupervisorError> {
        if self.started {
            return Err(SupervisorError::AlreadyStarted);
        }
        self.started = true;
        if let Err(e) = self.start_all(board) {
            self.shutdown();
            return Err(e);
        }
        Ok(())
    }

    fn launch<W: Worker>(&self, worker: W) -> Result<WorkerHandle, SupervisorError> {
        let name = worker.name();
        debug!("supervisor: starting {}", name);
        spawn(worker, self.clock.clone()).map_err(|e| SupervisorError::worker(name, e))
    }

    fn start_all(&mut self, board: Board) -> Result<(), SupervisorError> {
        let host = HostConfig::load(&self.config_dir)?;
        self.host = Some(host);

        let Board {
            lora_serial,
            lora_pins,
            gnss_serial,
            io_bus,
            display,
            status_led,
        } = board;
        let mut services = Services::default();

        self.blink = Some(self.launch(BlinkWorker::new(status_led, &self.machine.status_led))?);

        let gnss = GnssWorker::new(gnss_serial, &self.machine.gnss);
        services.gnss = Some(gnss.snapshot());
        self.gnss = Some(self.launch(gnss)?);

        let driver = E220::new(lora_serial, lora_pins, self.clock.clone());
        let radio = RadioWorker::new(driver, host, &self.machine.radio);
        services.radio = Some(radio.link());
        self.radio = Some(self.launch(radio)?);

        let io = IoWorker::new(share_bus(io_bus), &self.machine.io, self.clock.clone());
        services.io = Some(io.port());
        self.io = Some(self.launch(io)?);

        let mut engine = PageEngine::new(Screen::new(display), services);
        engine.begin().map_err(SupervisorError::Display)?;
        let page = MainPage::new();
        if !engine.push(Box::new(page)) {
            return Err(SupervisorError::PageRejected("Main Page".to_string()));
        }
        self.engine = Some(engine);
        info!("supervisor: started");
        Ok(())
    }

    /// One loop iteration: deliver queued keystrokes, then either apply a
    /// pending activation or tick the current page. Returns the sleep
    /// before the next iteration.
    pub fn poll(&mut self) -> Result<u64, SupervisorError> {
        let engine = self.engine.as_mut().ok_or(SupervisorError::NotStarted)?;
        if let Some(io) = engine.services().io.clone() {
            while let Some(key) = io.next_event() {
                engine.dispatch_key(key);
            }
        }
        engine.step();
        Ok(engine.periodic_time())
    }

    /// Loop until the running flag is cleared.
    pub fn run(&mut self) -> Result<(), SupervisorError> {
        while self.running.load(Ordering::SeqCst) {
            let sleep = self.poll()?;
            self.clock.sleep_ms(sleep);
        }
        info!("supervisor: leaving main loop");
        Ok(())
    }

    /// Destroy the pages, then stop I/O, radio, GNSS and the blink timer.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(mut engine) = self.engine.take() {
            engine.clear();
        }
        let timeout = Duration::from_millis(self.machine.supervisor.join_timeout_ms);
        for slot in [&mut self.io, &mut self.radio, &mut self.gnss, &mut self.blink] {
            if let Some(mut handle) = slot.take() {
                if !handle.stop(timeout) {
                    warn!("supervisor: {} left running", handle.name());
                }
            }
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
