//! REAC connection engine
//!
//! Owns the per-link protocol state and drives both halves of the packet
//! exchange. See [`engine::ConnectionEngine`].

pub mod drift;
pub mod engine;
pub mod stream;
pub mod tracker;

pub use drift::DriftCorrector;
pub use engine::{ConnectionEngine, EngineStats};
pub use stream::{CounterStream, DataStream};
pub use tracker::{Liveness, SequenceGap, SequenceTracker};

use bytes::Bytes;
use std::time::Duration;

use crate::protocol::{DeviceIdentity, Role, PACKETS_PER_SECOND};

/// Interval between liveness checks of a Slave
pub const CONNECTION_CHECK_INTERVAL: Duration = Duration::from_millis(400);

/// Silence after which a connected peer is considered gone
pub const DISCONNECT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Cadence and timeout settings of an engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Master send rate
    pub packets_per_second: u32,
    /// Slave liveness check interval
    pub check_interval: Duration,
    /// Idle time that ends a connection
    pub disconnect_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            packets_per_second: PACKETS_PER_SECOND,
            check_interval: CONNECTION_CHECK_INTERVAL,
            disconnect_timeout: DISCONNECT_TIMEOUT,
        }
    }
}

/// Construction-time engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub role: Role,
    pub device: DeviceIdentity,
    pub timing: Timing,
}

impl EngineConfig {
    pub fn new(role: Role, device: DeviceIdentity) -> Self {
        Self {
            role,
            device,
            timing: Timing::default(),
        }
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Scheduler period in nanoseconds
    ///
    /// A Master fires once per packet; a Slave only runs the liveness
    /// watchdog since its sends follow inbound packets.
    pub fn period_nanos(&self) -> u64 {
        match self.role {
            Role::Master => 1_000_000_000 / u64::from(self.timing.packets_per_second.max(1)),
            Role::Slave => self.timing.check_interval.as_nanos() as u64,
        }
    }

    pub fn disconnect_timeout_nanos(&self) -> u64 {
        self.timing.disconnect_timeout.as_nanos() as u64
    }
}

/// Connection state change; `None` announces a disconnect
pub type ConnectionCallback = Box<dyn FnMut(Option<&DeviceIdentity>) + Send>;

/// Delivers the sample block of one inbound packet
pub type SamplesReceivedCallback = Box<dyn FnMut(&[u8]) + Send>;

/// Supplies the sample block of one outbound packet; `None` sends silence
pub type SamplesNeededCallback = Box<dyn FnMut() -> Option<Bytes> + Send>;

/// The engine's boundary toward the audio pipeline
///
/// Every callback is optional. A missing `samples_needed` sends silence.
#[derive(Default)]
pub struct Callbacks {
    pub(crate) connection: Option<ConnectionCallback>,
    pub(crate) samples_received: Option<SamplesReceivedCallback>,
    pub(crate) samples_needed: Option<SamplesNeededCallback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connection_change<F>(mut self, f: F) -> Self
    where
        F: FnMut(Option<&DeviceIdentity>) + Send + 'static,
    {
        self.connection = Some(Box::new(f));
        self
    }

    pub fn on_samples_received<F>(mut self, f: F) -> Self
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        self.samples_received = Some(Box::new(f));
        self
    }

    pub fn on_samples_needed<F>(mut self, f: F) -> Self
    where
        F: FnMut() -> Option<Bytes> + Send + 'static,
    {
        self.samples_needed = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("connection", &self.connection.is_some())
            .field("samples_received", &self.samples_received.is_some())
            .field("samples_needed", &self.samples_needed.is_some())
            .finish()
    }
}
