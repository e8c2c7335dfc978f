//! Radio worker: the E220 driver behind two bounded mailboxes.

use std::collections::VecDeque;
use std::sync::Arc;

use asm_common::config::{HostConfig, RadioConfig};
use asm_lora::{E220, LoraError, Received, SaveType};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::WorkerError;
use crate::worker::Worker;

/// Bounded FIFO guarded by its own mutex.
pub struct Mailbox<T> {
    name: &'static str,
    queue: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T> Mailbox<T> {
    /// Empty mailbox holding at most `capacity` items.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an item; `false` (item dropped) when full.
    pub fn push(&self, item: T) -> bool {
        let mut queue = self.queue.lock();
        if queue.len() >= self.capacity {
            warn!("{} mailbox full ({}), dropping message", self.name, self.capacity);
            return false;
        }
        queue.push_back(item);
        true
    }

    /// Oldest item.
    pub fn pop(&self) -> Option<T> {
        self.queue.lock().pop_front()
    }

    /// Items waiting.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

/// The supervisor's side of the radio worker.
pub struct RadioLink {
    inbox: Mailbox<Received>,
    outbox: Mailbox<Vec<u8>>,
}

impl RadioLink {
    /// Link with both mailboxes bounded to `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            inbox: Mailbox::new("radio inbox", capacity),
            outbox: Mailbox::new("radio outbox", capacity),
        }
    }

    /// Queue a payload for broadcast.
    pub fn send(&self, payload: impl Into<Vec<u8>>) -> bool {
        self.outbox.push(payload.into())
    }

    /// Hand a received datagram to the supervisor side.
    pub fn deliver(&self, received: Received) -> bool {
        self.inbox.push(received)
    }

    /// Oldest received datagram.
    pub fn receive(&self) -> Option<Received> {
        self.inbox.pop()
    }

    /// Datagrams waiting to be read.
    pub fn pending_rx(&self) -> usize {
        self.inbox.len()
    }

    /// Payloads waiting to be sent.
    pub fn pending_tx(&self) -> usize {
        self.outbox.len()
    }
}

/// Owns the driver; one receive and at most one send per cycle.
pub struct RadioWorker {
    driver: E220,
    host: HostConfig,
    channel: u8,
    band_mhz: u32,
    period_ms: u64,
    rssi: bool,
    link: Arc<RadioLink>,
}

impl RadioWorker {
    /// Worker for `driver`, addressed as `host`.
    pub fn new(driver: E220, host: HostConfig, config: &RadioConfig) -> Self {
        Self {
            driver: driver.with_band(u32::from(config.band_mhz)),
            host,
            channel: config.channel,
            band_mhz: u32::from(config.band_mhz),
            period_ms: config.loop_interval_ms,
            rssi: false,
            link: Arc::new(RadioLink::new(config.mailbox_capacity)),
        }
    }

    /// Mailboxes shared with the supervisor.
    pub fn link(&self) -> Arc<RadioLink> {
        Arc::clone(&self.link)
    }

    fn receive(&mut self) {
        let result = if self.rssi {
            self.driver.receive_message_rssi()
        } else {
            self.driver.receive_message()
        };
        match result {
            Ok(received) if !received.data.is_empty() => {
                debug!("radio: received {} bytes", received.data.len());
                self.link.deliver(received);
            }
            Ok(_) | Err(LoraError::NoResponseFromDevice) => {}
            Err(e) => debug!("radio: receive failed: {}", e),
        }
    }

    fn transmit(&mut self) {
        let Some(payload) = self.link.outbox.pop() else {
            return;
        };
        match self.driver.send_broadcast_fixed_message(self.channel, &payload) {
            Ok(()) => debug!("radio: sent {} bytes on channel {}", payload.len(), self.channel),
            Err(e) => debug!("radio: send failed: {}", e),
        }
    }
}

impl Worker for RadioWorker {
    fn name(&self) -> &'static str {
        "radio"
    }

    fn start(&mut self) -> Result<(), WorkerError> {
        self.driver.begin()?;
        let mut config = self.driver.get_configuration()?;
        let (high, low) = (self.host.address_high, self.host.address_low);

        if config.is_unaddressed() || !config.has_address(high, low) {
            info!(
                "radio: module address {:02X}{:02X}, writing host address {:02X}{:02X}",
                config.address_high, config.address_low, high, low
            );
            config.address_high = high;
            config.address_low = low;
            self.driver.set_configuration(&config, SaveType::Persist)?;
            config = self.driver.get_configuration()?;
        }

        self.rssi = config.transmission_mode.rssi();
        info!(
            "radio: ready, address {:02X}{:02X}, {}, broadcast channel {}",
            config.address_high,
            config.address_low,
            config.channel_description(self.band_mhz),
            self.channel
        );
        Ok(())
    }

    fn cycle(&mut self) {
        self.receive();
        self.transmit();
    }

    fn period_ms(&self) -> u64 {
        self.period_ms
    }

    fn stop(&mut self) {
        self.driver.end();
    }
}
