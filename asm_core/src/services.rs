//! Handles to the running workers, as seen by pages.

use std::sync::Arc;

use asm_common::io::IoId;
use asm_gnss::Fix;
use asm_lora::Received;
use tracing::debug;

use crate::gnss::GnssSnapshot;
use crate::inout::IoPort;
use crate::radio::RadioLink;

/// Worker handles; a worker that is not running is `None`.
#[derive(Clone, Default)]
pub struct Services {
    /// Radio mailboxes.
    pub radio: Option<Arc<RadioLink>>,
    /// Lamps, relays and keystrokes.
    pub io: Option<Arc<IoPort>>,
    /// Latest GNSS fix.
    pub gnss: Option<Arc<GnssSnapshot>>,
}

impl Services {
    /// Queue a broadcast. `false` if the radio is down or the outbox full.
    pub fn send_radio(&self, payload: impl Into<Vec<u8>>) -> bool {
        self.radio.as_ref().is_some_and(|r| r.send(payload))
    }

    /// Oldest received datagram.
    pub fn receive_radio(&self) -> Option<Received> {
        self.radio.as_ref().and_then(|r| r.receive())
    }

    /// Invert an output; the new state, or `None` if it could not be set.
    pub fn toggle(&self, id: IoId) -> Option<bool> {
        let io = self.io.as_ref()?;
        match io.toggle(id) {
            Ok(on) => Some(on),
            Err(e) => {
                debug!("services: toggle {} failed: {}", id, e);
                None
            }
        }
    }

    /// Latest committed fix.
    pub fn latest_fix(&self) -> Option<Arc<Fix>> {
        self.gnss.as_ref().and_then(|g| g.latest())
    }
}
