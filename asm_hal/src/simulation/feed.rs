//! Periodic line feed: replays a fixed set of lines on a schedule, the way
//! a GNSS receiver emits one burst of sentences per fix interval.

use super::serial::SimPeer;

/// Emits `lines` once every `period_ms`, starting immediately.
pub struct PeriodicFeed {
    lines: Vec<Vec<u8>>,
    period_ms: u64,
    next_at_ms: u64,
}

impl PeriodicFeed {
    /// Feed repeating `lines` every `period_ms`.
    pub fn new(lines: Vec<Vec<u8>>, period_ms: u64) -> Self {
        Self {
            lines,
            period_ms: period_ms.max(1),
            next_at_ms: 0,
        }
    }
}

impl SimPeer for PeriodicFeed {
    fn poll(&mut self, now_ms: u64) -> Vec<u8> {
        if now_ms < self.next_at_ms {
            return Vec::new();
        }
        self.next_at_ms = now_ms + self.period_ms;
        self.lines.concat()
    }
}
