//! Lock-free packet queue between the audio pipeline and the engine
//!
//! The engine callbacks run in the dispatch context and must never block,
//! so the pipeline exchanges whole sample blocks with them through a
//! single-producer single-consumer queue.

use bytes::Bytes;
use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Bounded queue of sample blocks, one per packet
pub struct PacketQueue {
    queue: ArrayQueue<Bytes>,
    overflow_count: AtomicUsize,
    underrun_count: AtomicUsize,
}

impl PacketQueue {
    /// Create a new queue holding up to `capacity` packets
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity),
            overflow_count: AtomicUsize::new(0),
            underrun_count: AtomicUsize::new(0),
        }
    }

    /// Push a sample block
    /// Returns false if the queue is full (overflow)
    pub fn push(&self, samples: Bytes) -> bool {
        match self.queue.push(samples) {
            Ok(()) => true,
            Err(_) => {
                self.overflow_count.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Push, evicting the oldest block when full
    pub fn force_push(&self, samples: Bytes) {
        if self.queue.force_push(samples).is_some() {
            self.overflow_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Pop a sample block
    /// Returns None if the queue is empty (underrun)
    pub fn pop(&self) -> Option<Bytes> {
        match self.queue.pop() {
            Some(samples) => Some(samples),
            None => {
                self.underrun_count.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn overflow_count(&self) -> usize {
        self.overflow_count.load(Ordering::Relaxed)
    }

    pub fn underrun_count(&self) -> usize {
        self.underrun_count.load(Ordering::Relaxed)
    }

    /// Get fill level as a fraction of capacity
    pub fn fill_level(&self) -> f32 {
        self.len() as f32 / self.capacity() as f32
    }
}

/// Thread-safe handle to a packet queue
pub type SharedPacketQueue = Arc<PacketQueue>;

/// Create a new shared packet queue
pub fn create_shared_queue(capacity: usize) -> SharedPacketQueue {
    Arc::new(PacketQueue::new(capacity))
}
