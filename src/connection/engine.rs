//! Connection engine
//!
//! The engine is a passive state machine. The host calls
//! [`ConnectionEngine::on_scheduler_fire`] from its timer and
//! [`ConnectionEngine::on_inbound_frame`] from its frame hook, both from the
//! same serialized context, and the engine answers by transmitting frames and
//! invoking the pipeline callbacks. No entry point blocks.
//!
//! ## Connection state
//!
//! ```text
//!            first valid inbound packet
//!   Disconnected ───────────────────────────▶ Connected
//!        ▲                                        │
//!        └──── idle > disconnect timeout ─────────┘
//!              (checked on scheduler firing)
//! ```
//!
//! `stop()` forces the Connected → Disconnected edge. The connection callback
//! fires once per edge.

use bytes::Bytes;

use crate::codec::{decode, encode, DecodedFrame};
use crate::connection::drift::DriftCorrector;
use crate::connection::stream::{CounterStream, DataStream};
use crate::connection::tracker::{Liveness, SequenceTracker};
use crate::connection::{Callbacks, EngineConfig};
use crate::error::SetupError;
use crate::host::{FrameDisposition, FrameHook, HookHandle, Scheduler, Transmitter};
use crate::protocol::{is_reac_frame, DeviceIdentity, PacketHeader, Role};

/// Engine counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub sequence_gaps: u64,
    pub malformed_frames: u64,
    pub send_failures: u64,
    pub connects: u64,
    pub disconnects: u64,
}

/// REAC connection engine for one link
pub struct ConnectionEngine {
    config: EngineConfig,
    callbacks: Callbacks,
    scheduler: Box<dyn Scheduler>,
    hook: Box<dyn FrameHook>,
    transmitter: Box<dyn Transmitter>,
    data_stream: Box<dyn DataStream>,
    tracker: SequenceTracker,
    drift: DriftCorrector,
    hook_handle: Option<HookHandle>,
    started: bool,
    stats: EngineStats,
}

impl ConnectionEngine {
    /// Create an engine; nothing is acquired until [`start`](Self::start)
    pub fn new(
        config: EngineConfig,
        callbacks: Callbacks,
        scheduler: impl Scheduler + 'static,
        hook: impl FrameHook + 'static,
        transmitter: impl Transmitter + 'static,
    ) -> Self {
        Self {
            drift: DriftCorrector::new(config.period_nanos()),
            config,
            callbacks,
            scheduler: Box::new(scheduler),
            hook: Box::new(hook),
            transmitter: Box::new(transmitter),
            data_stream: Box::new(CounterStream::new()),
            tracker: SequenceTracker::new(),
            hook_handle: None,
            started: false,
            stats: EngineStats::default(),
        }
    }

    /// Replace the default counter-only header computation
    pub fn with_data_stream(mut self, data_stream: impl DataStream + 'static) -> Self {
        self.data_stream = Box::new(data_stream);
        self
    }

    /// Arm the scheduler and install the frame hook
    ///
    /// If the hook cannot be installed the scheduler is cancelled again, so a
    /// failed start leaves nothing behind.
    pub fn start(&mut self) -> Result<(), SetupError> {
        if self.started {
            return Err(SetupError::AlreadyStarted);
        }

        let period = self.config.period_nanos();
        if period == 0 {
            tracing::error!("Refusing to start {} engine with a zero period", self.config.role);
            return Err(SetupError::ZeroPeriod);
        }
        if let Err(e) = self.scheduler.arm(period) {
            tracing::error!("Failed to arm scheduler: {}", e);
            return Err(e);
        }
        self.drift = DriftCorrector::new(period);
        self.drift.start(self.scheduler.now_nanos());

        match self.hook.install(is_reac_frame) {
            Ok(handle) => self.hook_handle = Some(handle),
            Err(e) => {
                tracing::error!("Failed to install frame hook: {}", e);
                self.scheduler.cancel();
                return Err(e);
            }
        }

        self.started = true;
        tracing::info!(
            "REAC {} engine started: period {}ns, {} in / {} out channels",
            self.config.role,
            period,
            self.config.device.in_channels,
            self.config.device.out_channels
        );
        Ok(())
    }

    /// Cancel the scheduler, remove the hook and announce disconnect
    ///
    /// Safe to call repeatedly and before `start`.
    pub fn stop(&mut self) {
        if !self.started {
            return;
        }

        self.scheduler.cancel();

        if self.tracker.disconnect() {
            self.stats.disconnects += 1;
            self.announce(false);
        }

        if let Some(handle) = self.hook_handle.take() {
            self.hook.uninstall(handle);
        }

        self.tracker.reset();
        self.started = false;
        tracing::info!("REAC {} engine stopped", self.config.role);
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_connected(&self) -> bool {
        self.tracker.is_connected()
    }

    pub fn role(&self) -> Role {
        self.config.role
    }

    pub fn device(&self) -> &DeviceIdentity {
        &self.config.device
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Scheduler period in nanoseconds
    pub fn period_nanos(&self) -> u64 {
        self.config.period_nanos()
    }

    pub fn tracker(&self) -> &SequenceTracker {
        &self.tracker
    }

    pub fn stats(&self) -> EngineStats {
        self.stats.clone()
    }

    /// Scheduler entry point
    ///
    /// Runs the liveness check, sends one packet when Master, then rearms
    /// the scheduler with the drift-corrected delay.
    pub fn on_scheduler_fire(&mut self) {
        if !self.started {
            return;
        }

        let period = self.config.period_nanos();
        if self.tracker.on_tick(period, self.config.disconnect_timeout_nanos()) == Liveness::Lost {
            self.stats.disconnects += 1;
            tracing::warn!(
                "REAC device {} timed out after {} ms",
                self.config.device.mac_string(),
                self.config.timing.disconnect_timeout.as_millis()
            );
            self.announce(false);
        }

        if self.config.role == Role::Master {
            self.send_packet();
        }

        let delay = self.drift.on_fire(self.scheduler.now_nanos());
        self.scheduler.rearm(delay);
    }

    /// Scheduler entry point for firings tagged with their arming generation
    ///
    /// Firings armed before the last `stop` are dropped.
    pub fn on_scheduler_fire_tagged(&mut self, generation: u64) {
        if generation != self.scheduler.generation() {
            tracing::debug!(
                "Dropping stale firing (generation {}, current {})",
                generation,
                self.scheduler.generation()
            );
            return;
        }
        self.on_scheduler_fire();
    }

    /// Frame hook entry point
    pub fn on_inbound_frame(&mut self, frame: &[u8]) -> FrameDisposition {
        if !is_reac_frame(frame) {
            return FrameDisposition::PassThrough;
        }
        if !self.started {
            return FrameDisposition::Handled;
        }

        // A Master would otherwise see its own broadcasts
        // TODO: exclude self-sent frames by source address once the source MAC is filled in
        if self.config.role == Role::Master {
            return FrameDisposition::Handled;
        }

        self.receive(frame);
        FrameDisposition::Handled
    }

    fn receive(&mut self, frame: &[u8]) {
        let decoded = match decode(frame, self.config.device.inbound_layout()) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.stats.malformed_frames += 1;
                tracing::warn!("Dropping inbound frame: {}", e);
                return;
            }
        };
        let counter = decoded.header.counter;
        self.stats.packets_received += 1;
        tracing::trace!("Received packet {}", counter);

        if let Some(gap) = self.tracker.check_sequence(counter) {
            self.stats.sequence_gaps += 1;
            tracing::warn!("Lost packet [{} {}]", gap.last, gap.received);
        }

        let connected_now = self.tracker.connect();
        self.tracker.record(counter);

        if connected_now {
            self.stats.connects += 1;
            tracing::info!(
                "REAC device {} connected ({} in, {} out)",
                self.config.device.mac_string(),
                self.config.device.in_channels,
                self.config.device.out_channels
            );
            self.announce(true);
        }

        self.deliver(frame, &decoded);
        self.data_stream.got_packet(&decoded.header);
        self.send_packet();
    }

    fn deliver(&mut self, frame: &[u8], decoded: &DecodedFrame) {
        let Some(callback) = self.callbacks.samples_received.as_mut() else {
            return;
        };

        // decode pinned the frame to the inbound layout, so the block is full size
        if let Some(samples) = decoded.samples(frame) {
            callback(samples);
        }
    }

    fn send_packet(&mut self) {
        let layout = self.config.device.outbound_layout();

        let samples: Option<Bytes> = match self.callbacks.samples_needed.as_mut().and_then(|f| f()) {
            Some(buffer) if buffer.len() != layout.samples_len() => {
                tracing::warn!(
                    "Got incorrectly sized sample buffer ({} bytes, expected {}), sending silence",
                    buffer.len(),
                    layout.samples_len()
                );
                None
            }
            other => other,
        };

        let mut header = PacketHeader::default();
        if let Err(e) = self.data_stream.process_packet(&mut header) {
            self.stats.send_failures += 1;
            tracing::warn!("Failed to process packet data stream: {}", e);
            return;
        }

        let frame = match encode(&header, samples.as_deref(), layout) {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.send_failures += 1;
                tracing::warn!("Failed to build packet: {}", e);
                return;
            }
        };

        match self.transmitter.transmit(frame) {
            Ok(()) => {
                self.stats.packets_sent += 1;
                tracing::trace!("Sent packet {}", header.counter);
            }
            Err(e) => {
                self.stats.send_failures += 1;
                tracing::warn!("Failed to send packet: {}", e);
            }
        }
    }

    fn announce(&mut self, connected: bool) {
        if let Some(callback) = self.callbacks.connection.as_mut() {
            callback(connected.then_some(&self.config.device));
        }
    }
}

impl Drop for ConnectionEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
