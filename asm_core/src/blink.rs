//! Status lamp blink timer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use asm_common::config::StatusLedConfig;
use asm_common::hal::{Direction, GpioLine, Level};
use tracing::{debug, info};

use crate::error::WorkerError;
use crate::worker::Worker;

/// Toggles the status lamp once per interval.
pub struct BlinkWorker {
    line: Box<dyn GpioLine>,
    lit: Arc<AtomicBool>,
    interval_ms: u64,
}

impl BlinkWorker {
    /// Timer driving `line`.
    pub fn new(line: Box<dyn GpioLine>, config: &StatusLedConfig) -> Self {
        Self {
            line,
            lit: Arc::new(AtomicBool::new(false)),
            interval_ms: config.blink_interval_ms,
        }
    }

    /// Current lamp state.
    pub fn lit_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.lit)
    }
}

impl Worker for BlinkWorker {
    fn name(&self) -> &'static str {
        "blink"
    }

    fn start(&mut self) -> Result<(), WorkerError> {
        self.line.open(Direction::Output, Level::Low)?;
        info!("blink: status lamp on pin {} every {} ms", self.line.pin(), self.interval_ms);
        Ok(())
    }

    fn cycle(&mut self) {
        let next = !self.lit.load(Ordering::Relaxed);
        let level = if next { Level::High } else { Level::Low };
        match self.line.write(level) {
            Ok(()) => self.lit.store(next, Ordering::Relaxed),
            Err(e) => debug!("blink: {}", e),
        }
    }

    fn period_ms(&self) -> u64 {
        self.interval_ms
    }

    fn stop(&mut self) {
        if let Err(e) = self.line.write(Level::Low) {
            debug!("blink: {}", e);
        }
        self.lit.store(false, Ordering::Relaxed);
        self.line.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asm_common::time::SimClock;
    use asm_hal::simulation::SimPin;

    #[test]
    fn test_toggles_then_rests_low() {
        let pin = SimPin::new(52, Level::Low, SimClock::shared());
        let mut blink = BlinkWorker::new(Box::new(pin.line()), &StatusLedConfig::default());
        blink.start().unwrap();
        assert!(pin.is_open());

        blink.cycle();
        assert!(pin.level().is_high());
        blink.cycle();
        assert!(!pin.level().is_high());
        blink.cycle();
        assert!(blink.lit_flag().load(Ordering::Relaxed));

        blink.stop();
        assert!(!pin.level().is_high());
        assert!(!pin.is_open());
        assert_eq!(blink.period_ms(), 500);
    }
}
