//! Shared test doubles for engine tests

#![allow(dead_code)]

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use reac_link::codec::encode;
use reac_link::error::{SetupError, TransmitError};
use reac_link::host::{FrameHook, FramePredicate, HookHandle, Scheduler, Transmitter};
use reac_link::protocol::FrameLayout;
use reac_link::{Callbacks, ConnectionEngine, DeviceIdentity, EngineConfig, PacketHeader, Role, Timing};

/// Everything the mock collaborators observe
#[derive(Default)]
pub struct Probe {
    pub armed: Option<u64>,
    pub rearms: Vec<u64>,
    pub cancels: usize,
    pub now: u64,
    pub generation: u64,
    pub hook: Option<HookHandle>,
    pub installs: usize,
    pub uninstalls: usize,
    pub sent: Vec<Bytes>,
    pub fail_arm: bool,
    pub fail_hook: bool,
    pub fail_transmit: bool,
}

pub type SharedProbe = Arc<Mutex<Probe>>;

pub struct MockScheduler(pub SharedProbe);

impl Scheduler for MockScheduler {
    fn arm(&mut self, delay_nanos: u64) -> Result<(), SetupError> {
        let mut probe = self.0.lock();
        if probe.fail_arm {
            return Err(SetupError::SchedulerUnavailable("mock".into()));
        }
        probe.generation += 1;
        probe.armed = Some(delay_nanos);
        Ok(())
    }

    fn rearm(&mut self, delay_nanos: u64) {
        let mut probe = self.0.lock();
        probe.armed = Some(delay_nanos);
        probe.rearms.push(delay_nanos);
    }

    fn cancel(&mut self) {
        let mut probe = self.0.lock();
        probe.armed = None;
        probe.cancels += 1;
        probe.generation += 1;
    }

    fn now_nanos(&self) -> u64 {
        self.0.lock().now
    }

    fn generation(&self) -> u64 {
        self.0.lock().generation
    }
}

pub struct MockHook(pub SharedProbe);

impl FrameHook for MockHook {
    fn install(&mut self, _predicate: FramePredicate) -> Result<HookHandle, SetupError> {
        let mut probe = self.0.lock();
        if probe.fail_hook {
            return Err(SetupError::HookUnavailable("mock".into()));
        }
        probe.installs += 1;
        let handle = HookHandle(probe.installs as u64);
        probe.hook = Some(handle);
        Ok(handle)
    }

    fn uninstall(&mut self, handle: HookHandle) {
        let mut probe = self.0.lock();
        assert_eq!(probe.hook, Some(handle), "uninstall of unknown hook");
        probe.hook = None;
        probe.uninstalls += 1;
    }
}

pub struct MockTransmitter(pub SharedProbe);

impl Transmitter for MockTransmitter {
    fn transmit(&mut self, frame: Bytes) -> Result<(), TransmitError> {
        let mut probe = self.0.lock();
        if probe.fail_transmit {
            return Err(TransmitError::QueueFull);
        }
        probe.sent.push(frame);
        Ok(())
    }
}

/// Callback invocations in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connected(DeviceIdentity),
    Disconnected,
    Samples(Vec<u8>),
}

pub type SharedEvents = Arc<Mutex<Vec<Event>>>;

pub fn recording_callbacks(events: &SharedEvents) -> Callbacks {
    let on_change = events.clone();
    let on_samples = events.clone();
    Callbacks::new()
        .on_connection_change(move |device| {
            on_change.lock().push(match device {
                Some(device) => Event::Connected(*device),
                None => Event::Disconnected,
            });
        })
        .on_samples_received(move |samples| {
            on_samples.lock().push(Event::Samples(samples.to_vec()));
        })
}

pub fn connection_events(events: &SharedEvents) -> Vec<Event> {
    events
        .lock()
        .iter()
        .filter(|e| !matches!(e, Event::Samples(_)))
        .cloned()
        .collect()
}

pub fn sample_events(events: &SharedEvents) -> Vec<Vec<u8>> {
    events
        .lock()
        .iter()
        .filter_map(|e| match e {
            Event::Samples(s) => Some(s.clone()),
            _ => None,
        })
        .collect()
}

/// Timing with a 1 ms liveness tick and the standard 1 s timeout
pub fn millisecond_timing() -> Timing {
    Timing {
        check_interval: Duration::from_millis(1),
        ..Timing::default()
    }
}

pub fn slave_config() -> EngineConfig {
    EngineConfig::new(Role::Slave, DeviceIdentity::placeholder()).with_timing(millisecond_timing())
}

pub fn master_config() -> EngineConfig {
    EngineConfig::new(Role::Master, DeviceIdentity::placeholder())
}

pub fn new_engine(config: EngineConfig, callbacks: Callbacks, probe: &SharedProbe) -> ConnectionEngine {
    ConnectionEngine::new(
        config,
        callbacks,
        MockScheduler(probe.clone()),
        MockHook(probe.clone()),
        MockTransmitter(probe.clone()),
    )
}

/// Sample block whose bytes encode the counter, so deliveries are traceable
pub fn sample_block(counter: u16, layout: FrameLayout) -> Vec<u8> {
    (0..layout.samples_len())
        .map(|i| (i as u16).wrapping_add(counter) as u8)
        .collect()
}

/// A valid inbound frame for the placeholder device
pub fn inbound_frame(counter: u16) -> Bytes {
    let layout = DeviceIdentity::placeholder().inbound_layout();
    encode(&PacketHeader::new(counter), Some(&sample_block(counter, layout)), layout)
        .expect("sample block has the layout size")
}
