//! Serialized dispatch context
//!
//! A single thread owns the engine and executes every entry point in FIFO
//! order. Timers, frame hooks and the controlling thread never touch the
//! engine directly; they post [`Command`]s.

use bytes::Bytes;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::connection::{ConnectionEngine, EngineStats};
use crate::error::{Error, Result, SetupError};

/// Default depth of the dispatch queue
pub const DEFAULT_QUEUE_DEPTH: usize = 1024;

/// Work item for the dispatch thread
pub enum Command {
    /// Scheduler deadline reached, tagged with the arming generation
    Fire(u64),
    /// Inbound frame accepted by the frame hook
    Frame(Bytes),
    Start(Sender<std::result::Result<(), SetupError>>),
    Stop(Sender<()>),
    Status(Sender<LoopStatus>),
    Shutdown,
}

/// Snapshot of the engine owned by a work loop
#[derive(Debug, Clone)]
pub struct LoopStatus {
    pub started: bool,
    pub connected: bool,
    pub stats: EngineStats,
    /// Commands dropped because the queue was full
    pub dropped_commands: u64,
}

/// Cloneable posting end of a work loop
#[derive(Clone)]
pub struct Dispatcher {
    tx: Sender<Command>,
    dropped: Arc<AtomicU64>,
}

impl Dispatcher {
    /// Post without blocking; a full queue drops the command
    pub fn post(&self, command: Command) -> bool {
        match self.tx.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Post, waiting for queue space
    ///
    /// Only for threads outside the dispatch context, such as the timer.
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// A dispatch queue waiting for its engine
pub struct WorkLoop {
    dispatcher: Dispatcher,
    pub(crate) rx: Receiver<Command>,
}

impl WorkLoop {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_DEPTH)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self {
            dispatcher: Dispatcher {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            rx,
        }
    }

    /// Posting handle for the engine's collaborators
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Move the engine onto its dispatch thread
    pub fn spawn(self, name: &str, engine: ConnectionEngine) -> Result<LoopHandle> {
        let rx = self.rx;
        let dropped = self.dispatcher.dropped.clone();
        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(engine, rx, dropped))?;

        Ok(LoopHandle {
            dispatcher: self.dispatcher,
            thread: Some(thread),
        })
    }
}

impl Default for WorkLoop {
    fn default() -> Self {
        Self::new()
    }
}

fn run(mut engine: ConnectionEngine, rx: Receiver<Command>, dropped: Arc<AtomicU64>) {
    for command in rx.iter() {
        match command {
            Command::Fire(generation) => engine.on_scheduler_fire_tagged(generation),
            Command::Frame(frame) => {
                engine.on_inbound_frame(&frame);
            }
            Command::Start(reply) => {
                let _ = reply.send(engine.start());
            }
            Command::Stop(reply) => {
                engine.stop();
                let _ = reply.send(());
            }
            Command::Status(reply) => {
                let _ = reply.send(LoopStatus {
                    started: engine.is_started(),
                    connected: engine.is_connected(),
                    stats: engine.stats(),
                    dropped_commands: dropped.load(Ordering::Relaxed),
                });
            }
            Command::Shutdown => break,
        }
    }
    tracing::debug!("Work loop for {} engine exiting", engine.role());

    // Close the queue first so a timer blocked on a full queue can exit
    // before the engine joins it.
    drop(rx);
    drop(engine);
}

/// Controls a running work loop
pub struct LoopHandle {
    dispatcher: Dispatcher,
    thread: Option<JoinHandle<()>>,
}

impl LoopHandle {
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Start the engine inside its dispatch context
    pub fn start(&self) -> Result<()> {
        let (tx, rx) = bounded(1);
        if !self.dispatcher.send(Command::Start(tx)) {
            return Err(Error::LoopClosed);
        }
        rx.recv().map_err(|_| Error::LoopClosed)??;
        Ok(())
    }

    /// Stop the engine inside its dispatch context
    pub fn stop(&self) -> Result<()> {
        let (tx, rx) = bounded(1);
        if !self.dispatcher.send(Command::Stop(tx)) {
            return Err(Error::LoopClosed);
        }
        rx.recv().map_err(|_| Error::LoopClosed)
    }

    pub fn status(&self) -> Result<LoopStatus> {
        let (tx, rx) = bounded(1);
        if !self.dispatcher.send(Command::Status(tx)) {
            return Err(Error::LoopClosed);
        }
        rx.recv().map_err(|_| Error::LoopClosed)
    }

    /// Drop the engine on its own thread and wait for the thread to exit
    pub fn shutdown(mut self) {
        self.join();
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.dispatcher.send(Command::Shutdown);
            if thread.join().is_err() {
                tracing::error!("Work loop thread panicked");
            }
        }
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.join();
    }
}
