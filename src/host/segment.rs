//! Virtual broadcast Ethernet segment
//!
//! Stands in for a network interface plus its input filter. Every port can
//! transmit raw frames and install one frame hook; a transmitted frame is
//! offered to every other port, and ports whose predicate accepts it get it
//! posted into their work loop as [`Command::Frame`].

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::{SetupError, TransmitError};
use crate::host::work_loop::{Command, Dispatcher};
use crate::host::{FrameHook, FramePredicate, HookHandle, Transmitter};

struct PortEntry {
    id: u64,
    dispatcher: Dispatcher,
    predicate: Option<FramePredicate>,
}

#[derive(Default)]
struct SegmentInner {
    ports: Vec<PortEntry>,
    next_id: u64,
    stats: SegmentStats,
}

/// Segment counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentStats {
    pub frames_transmitted: u64,
    pub frames_delivered: u64,
    /// Frames a matching port could not queue
    pub frames_dropped: u64,
}

/// Shared broadcast medium
#[derive(Clone, Default)]
pub struct Segment {
    inner: Arc<Mutex<SegmentInner>>,
}

impl Segment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new port delivering into `dispatcher`
    pub fn port(&self, dispatcher: Dispatcher) -> SegmentPort {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.ports.push(PortEntry {
            id,
            dispatcher,
            predicate: None,
        });
        SegmentPort {
            id,
            segment: self.clone(),
        }
    }

    /// Remove a port; its hook is dropped and its transmits fail
    pub fn detach(&self, port: &SegmentPort) {
        self.inner.lock().ports.retain(|entry| entry.id != port.id);
    }

    /// Number of ports with an installed hook
    pub fn hooks_installed(&self) -> usize {
        self.inner
            .lock()
            .ports
            .iter()
            .filter(|entry| entry.predicate.is_some())
            .count()
    }

    pub fn stats(&self) -> SegmentStats {
        self.inner.lock().stats.clone()
    }
}

/// One attachment point on a [`Segment`]
///
/// Clones refer to the same port, so one clone can serve as the engine's
/// frame hook and another as its transmitter.
#[derive(Clone)]
pub struct SegmentPort {
    id: u64,
    segment: Segment,
}

impl SegmentPort {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl FrameHook for SegmentPort {
    fn install(&mut self, predicate: FramePredicate) -> Result<HookHandle, SetupError> {
        let mut inner = self.segment.inner.lock();
        let entry = inner
            .ports
            .iter_mut()
            .find(|entry| entry.id == self.id)
            .ok_or_else(|| SetupError::HookUnavailable(format!("port {} detached", self.id)))?;

        if entry.predicate.is_some() {
            return Err(SetupError::HookAlreadyInstalled);
        }
        entry.predicate = Some(predicate);
        Ok(HookHandle(self.id))
    }

    fn uninstall(&mut self, handle: HookHandle) {
        let mut inner = self.segment.inner.lock();
        if let Some(entry) = inner.ports.iter_mut().find(|entry| entry.id == handle.0) {
            entry.predicate = None;
        }
    }
}

impl Transmitter for SegmentPort {
    fn transmit(&mut self, frame: Bytes) -> Result<(), TransmitError> {
        let mut inner = self.segment.inner.lock();
        if !inner.ports.iter().any(|entry| entry.id == self.id) {
            return Err(TransmitError::LinkDown);
        }
        inner.stats.frames_transmitted += 1;

        let mut delivered = 0;
        let mut dropped = 0;
        for entry in inner.ports.iter().filter(|entry| entry.id != self.id) {
            let Some(predicate) = entry.predicate else {
                continue;
            };
            if !predicate(&frame) {
                continue;
            }
            if entry.dispatcher.post(Command::Frame(frame.clone())) {
                delivered += 1;
            } else {
                dropped += 1;
            }
        }
        inner.stats.frames_delivered += delivered;
        inner.stats.frames_dropped += dropped;

        // Every listener was backed up
        if delivered == 0 && dropped > 0 {
            return Err(TransmitError::QueueFull);
        }
        Ok(())
    }
}
