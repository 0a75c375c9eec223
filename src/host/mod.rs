//! Host collaborators of the connection engine
//!
//! The engine never owns a thread, a timer or a network interface. It is
//! driven through three narrow contracts that a host provides:
//!
//! - [`Scheduler`]: a one-shot timer the engine rearms on every firing
//! - [`FrameHook`]: an inbound frame filter on the link
//! - [`Transmitter`]: raw frame output on the link
//!
//! The host must run every engine entry point from one serialized context.
//! The [`work_loop`], [`timer`] and [`segment`] modules provide an in-process
//! host built that way.

pub mod segment;
pub mod timer;
pub mod work_loop;

pub use segment::{Segment, SegmentPort};
pub use timer::ThreadTimer;
pub use work_loop::{Command, Dispatcher, LoopHandle, LoopStatus, WorkLoop};

use bytes::Bytes;

use crate::error::{SetupError, TransmitError};

/// Predicate deciding whether an inbound frame belongs to the engine
pub type FramePredicate = fn(&[u8]) -> bool;

/// Token identifying an installed frame hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(pub u64);

/// What the host should do with a frame after the engine has seen it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDisposition {
    /// The frame was consumed; suppress default processing
    Handled,
    /// Not a REAC frame; continue normal processing unmodified
    PassThrough,
}

/// One-shot timer driving `ConnectionEngine::on_scheduler_fire`
pub trait Scheduler: Send {
    /// Attach to the host and schedule the first firing
    fn arm(&mut self, delay_nanos: u64) -> Result<(), SetupError>;

    /// Schedule the next firing, replacing any pending one
    fn rearm(&mut self, delay_nanos: u64);

    /// Cancel any pending firing
    fn cancel(&mut self);

    /// Monotonic clock used for drift correction
    fn now_nanos(&self) -> u64;

    /// Arming generation, bumped by `arm` and `cancel`
    ///
    /// Hosts that queue firings tag them with the generation they were
    /// armed under, so a firing from before a stop never reaches the next
    /// session. Schedulers that deliver synchronously can keep the default.
    fn generation(&self) -> u64 {
        0
    }
}

/// Inbound frame interception point
///
/// Frames matching the installed predicate are delivered to
/// `ConnectionEngine::on_inbound_frame` by the host, one at a time.
pub trait FrameHook: Send {
    fn install(&mut self, predicate: FramePredicate) -> Result<HookHandle, SetupError>;

    fn uninstall(&mut self, handle: HookHandle);
}

/// Raw frame output
pub trait Transmitter: Send {
    /// Queue one frame for transmission without blocking
    fn transmit(&mut self, frame: Bytes) -> Result<(), TransmitError>;
}
