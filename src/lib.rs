//! # REAC Link
//!
//! Connection engine for the REAC audio-over-Ethernet protocol.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────── MASTER ────────────────────────────┐
//! │  ThreadTimer ──Fire──▶ WorkLoop ──▶ ConnectionEngine            │
//! │   (250 µs, drift          │          │ samples_needed()         │
//! │    corrected)             │          ▼                          │
//! │                           │        codec::encode ──▶ transmit   │
//! └───────────────────────────┼──────────────────────────┼─────────┘
//!                             │                          │ raw Ethernet
//!                             │                          ▼ type 0x8819
//! ┌───────────────────────────┼──────────────────────────┼─────────┐
//! │                           │     FrameHook (predicate) │         │
//! │  ThreadTimer ──Fire──▶ WorkLoop ◀──Frame──────────────┘         │
//! │   (400 ms liveness)       │                                     │
//! │                           ▼                                     │
//! │                    ConnectionEngine                             │
//! │                     codec::decode ─▶ SequenceTracker            │
//! │                     samples_received() ─▶ reply via encode      │
//! └──────────────────────────── SLAVE ─────────────────────────────┘
//! ```
//!
//! The engine in [`connection`] is host agnostic: it talks to its timer, its
//! frame filter and its transmit path through the traits in [`host`]. The
//! [`host`] module also provides an in-process host used by the
//! `reac-loopback` binary and the integration tests.

pub mod audio;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod host;
pub mod protocol;

pub use connection::{Callbacks, ConnectionEngine, EngineConfig, EngineStats, Timing};
pub use error::{Error, Result};
pub use protocol::{DeviceIdentity, PacketHeader, Role};

/// Application-wide constants
pub mod constants {
    /// Default depth of the work loop dispatch queue
    pub const DEFAULT_QUEUE_DEPTH: usize = crate::host::work_loop::DEFAULT_QUEUE_DEPTH;

    /// Default capacity of pipeline packet queues (in packets)
    pub const PACKET_QUEUE_CAPACITY: usize = 256;

    /// Default test tone frequency in Hz
    pub const DEFAULT_TONE_HZ: f32 = 1000.0;

    /// Interval between statistics log lines of the demo binary, in seconds
    pub const STATS_INTERVAL_SECS: u64 = 5;
}
