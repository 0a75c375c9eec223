//! Sequence and liveness tracking for one connection
//!
//! The connection state is derived from packet arrival alone. A tick counter
//! advances on every scheduler firing while connected and is snapshotted on
//! every valid inbound packet; the distance between the two, multiplied by
//! the tick period, is the time since the peer was last heard.

/// Outcome of a liveness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Not connected; nothing to check
    Idle,
    /// Peer heard within the timeout
    Alive,
    /// Timeout exceeded; the tracker is now disconnected
    Lost,
}

/// A gap between two consecutive inbound sequence numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceGap {
    pub last: u16,
    pub received: u16,
}

impl SequenceGap {
    /// Number of packets missing between `last` and `received`
    pub fn missing(&self) -> u16 {
        self.received.wrapping_sub(self.last).wrapping_sub(1)
    }
}

/// `true` if `received` directly follows `last`, including 65535 -> 0
pub fn is_successor(last: u16, received: u16) -> bool {
    last.wrapping_add(1) == received
}

/// Per-connection counters
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    tick: u64,
    last_seen_tick: u64,
    last_sequence: u16,
    connected: bool,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn last_seen_tick(&self) -> u64 {
        self.last_seen_tick
    }

    pub fn last_sequence(&self) -> u16 {
        self.last_sequence
    }

    /// Time since the last valid inbound packet
    pub fn idle_nanos(&self, period_nanos: u64) -> u64 {
        self.tick
            .wrapping_sub(self.last_seen_tick)
            .saturating_mul(period_nanos)
    }

    /// Check for a sequence gap
    ///
    /// Gaps are only reported once connected, so the first packet after a
    /// connect never looks like loss.
    pub fn check_sequence(&self, received: u16) -> Option<SequenceGap> {
        if !self.connected || is_successor(self.last_sequence, received) {
            return None;
        }
        Some(SequenceGap {
            last: self.last_sequence,
            received,
        })
    }

    /// Snapshot the current tick and sequence for a valid inbound packet
    pub fn record(&mut self, received: u16) {
        self.last_seen_tick = self.tick;
        self.last_sequence = received;
    }

    /// Enter the connected state; returns `true` on the edge
    pub fn connect(&mut self) -> bool {
        let edge = !self.connected;
        self.connected = true;
        edge
    }

    /// Leave the connected state; returns `true` on the edge
    pub fn disconnect(&mut self) -> bool {
        let edge = self.connected;
        self.connected = false;
        edge
    }

    /// Run once per scheduler firing
    ///
    /// Disconnects when the idle time exceeds `timeout_nanos`, otherwise
    /// advances the tick counter.
    pub fn on_tick(&mut self, period_nanos: u64, timeout_nanos: u64) -> Liveness {
        if !self.connected {
            return Liveness::Idle;
        }
        if self.idle_nanos(period_nanos) > timeout_nanos {
            self.connected = false;
            return Liveness::Lost;
        }
        self.tick = self.tick.wrapping_add(1);
        Liveness::Alive
    }

    /// Forget all state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
