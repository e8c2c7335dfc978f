//! Simulated serial line.

use asm_common::hal::serial::is_supported_baud;
use asm_common::hal::{HalError, HalResult, Parity, SerialConfig, SerialLine};
use asm_common::time::{Clock, SharedClock};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// One host write, stamped with the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRecord {
    /// Virtual time of the write.
    pub at_ms: u64,
    /// Bytes written.
    pub data: Vec<u8>,
}

/// Device on the far end of a simulated line.
pub trait SimPeer: Send {
    /// React to a host write; returned bytes are queued for the host to read.
    fn on_write(&mut self, _data: &[u8], _config: &SerialConfig, _now_ms: u64) -> Vec<u8> {
        Vec::new()
    }

    /// Unsolicited output. Called whenever the host looks at the input side.
    fn poll(&mut self, _now_ms: u64) -> Vec<u8> {
        Vec::new()
    }
}

#[derive(Debug, Default)]
struct LineState {
    rx: VecDeque<u8>,
    tx: Vec<TxRecord>,
    fail_open: bool,
}

/// Test-side view of a [`SimSerial`]: inject input, inspect output.
#[derive(Clone, Default)]
pub struct SimSerialHandle {
    state: Arc<Mutex<LineState>>,
}

impl SimSerialHandle {
    /// Fresh, empty line state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the host to read.
    pub fn push_rx(&self, data: &[u8]) {
        self.state.lock().rx.extend(data.iter().copied());
    }

    /// Bytes queued but not yet read.
    pub fn pending_rx(&self) -> usize {
        self.state.lock().rx.len()
    }

    /// Every host write, in order.
    pub fn tx_log(&self) -> Vec<TxRecord> {
        self.state.lock().tx.clone()
    }

    /// All written bytes concatenated.
    pub fn tx_bytes(&self) -> Vec<u8> {
        self.state
            .lock()
            .tx
            .iter()
            .flat_map(|r| r.data.iter().copied())
            .collect()
    }

    /// Forget recorded writes.
    pub fn clear_tx(&self) {
        self.state.lock().tx.clear();
    }

    /// Make the next `open` fail.
    pub fn fail_open(&self, fail: bool) {
        self.state.lock().fail_open = fail;
    }
}

/// In-memory [`SerialLine`].
pub struct SimSerial {
    name: String,
    handle: SimSerialHandle,
    config: SerialConfig,
    clock: SharedClock,
    open: bool,
    peer: Option<Box<dyn SimPeer>>,
}

impl SimSerial {
    /// Line with its own fresh state.
    pub fn new(name: impl Into<String>, config: SerialConfig, clock: SharedClock) -> Self {
        Self::with_handle(name, SimSerialHandle::new(), config, clock)
    }

    /// Line over existing state.
    pub fn with_handle(
        name: impl Into<String>,
        handle: SimSerialHandle,
        config: SerialConfig,
        clock: SharedClock,
    ) -> Self {
        Self {
            name: name.into(),
            handle,
            config,
            clock,
            open: false,
            peer: None,
        }
    }

    /// Attach a far-end device.
    pub fn with_peer(mut self, peer: Box<dyn SimPeer>) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Test-side handle.
    pub fn handle(&self) -> SimSerialHandle {
        self.handle.clone()
    }

    fn ensure_open(&self) -> HalResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(HalError::NotOpen(self.name.clone()))
        }
    }

    fn pump(&mut self) {
        if let Some(peer) = self.peer.as_mut() {
            let out = peer.poll(self.clock.now_ms());
            if !out.is_empty() {
                self.handle.push_rx(&out);
            }
        }
    }
}

impl SerialLine for SimSerial {
    fn open(&mut self) -> HalResult<()> {
        if self.handle.state.lock().fail_open {
            return Err(HalError::open(&self.name, "simulated open failure"));
        }
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> HalResult<()> {
        if !is_supported_baud(baud_rate) {
            return Err(HalError::InvalidParam(format!("baud rate {baud_rate}")));
        }
        self.config.baud_rate = baud_rate;
        Ok(())
    }

    fn set_parity(&mut self, parity: Parity) -> HalResult<()> {
        self.config.parity = parity;
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    fn available(&mut self) -> HalResult<usize> {
        self.ensure_open()?;
        self.pump();
        Ok(self.handle.pending_rx())
    }

    fn read(&mut self, buf: &mut [u8]) -> HalResult<usize> {
        self.ensure_open()?;
        let deadline = self.clock.now_ms() + self.config.timeout.as_millis() as u64;
        let mut filled = 0;
        loop {
            self.pump();
            {
                let mut state = self.handle.state.lock();
                while filled < buf.len() {
                    match state.rx.pop_front() {
                        Some(b) => {
                            buf[filled] = b;
                            filled += 1;
                        }
                        None => break,
                    }
                }
            }
            if filled == buf.len() || self.clock.now_ms() >= deadline {
                return Ok(filled);
            }
            self.clock.sleep_ms(1);
        }
    }

    fn write(&mut self, data: &[u8]) -> HalResult<usize> {
        self.ensure_open()?;
        let now = self.clock.now_ms();
        self.handle.state.lock().tx.push(TxRecord {
            at_ms: now,
            data: data.to_vec(),
        });
        if let Some(peer) = self.peer.as_mut() {
            let reply = peer.on_write(data, &self.config, now);
            if !reply.is_empty() {
                self.handle.push_rx(&reply);
            }
        }
        Ok(data.len())
    }

    fn flush_input(&mut self) -> HalResult<()> {
        self.ensure_open()?;
        self.handle.state.lock().rx.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asm_common::time::{Clock, SimClock};

    struct Echo;

    impl SimPeer for Echo {
        fn on_write(&mut self, data: &[u8], _config: &SerialConfig, _now_ms: u64) -> Vec<u8> {
            data.to_vec()
        }
    }

    #[test]
    fn test_read_times_out_with_partial_data() {
        let clock = SimClock::shared();
        let mut line = SimSerial::new("sim0", SerialConfig::default(), clock.clone());
        line.open().unwrap();
        line.handle().push_rx(&[1, 2, 3]);

        let mut buf = [0u8; 8];
        let n = line.read(&mut buf).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert!(clock.now_ms() >= 100);
    }

    #[test]
    fn test_full_read_does_not_wait() {
        let clock = SimClock::shared();
        let mut line = SimSerial::new("sim0", SerialConfig::default(), clock.clone());
        line.open().unwrap();
        line.handle().push_rx(&[9, 8]);
        let mut buf = [0u8; 2];
        assert_eq!(line.read(&mut buf).unwrap(), 2);
        assert_eq!(clock.now_ms(), 0);
    }

    #[test]
    fn test_peer_reply_and_tx_log() {
        let clock = SimClock::shared();
        let mut line =
            SimSerial::new("sim0", SerialConfig::default(), clock.clone()).with_peer(Box::new(Echo));
        let handle = line.handle();
        line.open().unwrap();
        clock.advance_ms(7);
        line.write(b"hi").unwrap();
        assert_eq!(line.available().unwrap(), 2);
        assert_eq!(handle.tx_log(), vec![TxRecord { at_ms: 7, data: b"hi".to_vec() }]);
        line.flush_input().unwrap();
        assert_eq!(line.available().unwrap(), 0);
    }

    #[test]
    fn test_closed_and_failing_open() {
        let clock = SimClock::shared();
        let mut line = SimSerial::new("sim0", SerialConfig::default(), clock);
        assert!(matches!(line.write(b"x"), Err(HalError::NotOpen(_))));
        line.handle().fail_open(true);
        assert!(matches!(line.open(), Err(HalError::OpenFailed { .. })));
        assert!(line.set_baud_rate(1000).is_err());
    }
}
