//! Drift-corrected periodic scheduling
//!
//! Timers only offer "fire in N nanoseconds". Rearming with the nominal
//! period on every firing accumulates each firing's lateness, so the
//! corrector tracks the absolute deadline instead and rearms with
//! `period + (deadline - now)`.

/// Computes rearm delays that keep a one-shot timer on a fixed cadence
#[derive(Debug, Clone)]
pub struct DriftCorrector {
    period_nanos: u64,
    next_deadline: u64,
}

impl DriftCorrector {
    pub fn new(period_nanos: u64) -> Self {
        Self {
            period_nanos,
            next_deadline: 0,
        }
    }

    /// Reset the cadence so the first firing is due one period after `now`
    pub fn start(&mut self, now_nanos: u64) {
        self.next_deadline = now_nanos.saturating_add(self.period_nanos);
    }

    /// Record a firing at `now` and return the delay until the next one
    ///
    /// The difference must be signed: an early firing lengthens the next
    /// delay, a late one shortens it. A firing more than a full period late
    /// rearms immediately.
    pub fn on_fire(&mut self, now_nanos: u64) -> u64 {
        let drift = self.next_deadline as i128 - now_nanos as i128;
        let delay = self.period_nanos as i128 + drift;
        self.next_deadline = self.next_deadline.saturating_add(self.period_nanos);
        delay.clamp(0, u64::MAX as i128) as u64
    }

    pub fn period_nanos(&self) -> u64 {
        self.period_nanos
    }

    /// Absolute time the next firing is due
    pub fn next_deadline(&self) -> u64 {
        self.next_deadline
    }
}
