//! Master and Slave engines on threads, linked by a virtual segment

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reac_link::audio::ToneGenerator;
use reac_link::host::{LoopHandle, LoopStatus, Segment, ThreadTimer, WorkLoop};
use reac_link::{Callbacks, ConnectionEngine, DeviceIdentity, EngineConfig, Role, Timing};

const WAIT: Duration = Duration::from_secs(5);

fn short_timing() -> Timing {
    Timing {
        check_interval: Duration::from_millis(10),
        disconnect_timeout: Duration::from_millis(300),
        ..Timing::default()
    }
}

fn spawn(name: &str, segment: &Segment, config: EngineConfig, callbacks: Callbacks) -> LoopHandle {
    let work_loop = WorkLoop::new();
    let timer = ThreadTimer::new(work_loop.dispatcher());
    let port = segment.port(work_loop.dispatcher());
    let engine = ConnectionEngine::new(config, callbacks, timer, port.clone(), port);
    let handle = work_loop.spawn(name, engine).unwrap();
    handle.start().unwrap();
    handle
}

fn wait_for(handle: &LoopHandle, condition: impl Fn(&LoopStatus) -> bool) -> LoopStatus {
    let deadline = Instant::now() + WAIT;
    loop {
        let status = handle.status().unwrap();
        if condition(&status) {
            return status;
        }
        assert!(Instant::now() < deadline, "timed out, last status {:?}", status);
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_slave_follows_master() {
    let segment = Segment::new();
    let slave_device = DeviceIdentity::placeholder();
    let master_device = DeviceIdentity::new(
        slave_device.mac,
        slave_device.out_channels,
        slave_device.in_channels,
    );

    let changes: Arc<Mutex<Vec<bool>>> = Arc::default();
    let received: Arc<Mutex<Vec<Bytes>>> = Arc::default();
    let slave_changes = changes.clone();
    let slave_received = received.clone();
    let slave_callbacks = Callbacks::new()
        .on_connection_change(move |device| slave_changes.lock().push(device.is_some()))
        .on_samples_received(move |samples| {
            slave_received.lock().push(Bytes::copy_from_slice(samples))
        });
    let slave = spawn(
        "test-slave",
        &segment,
        EngineConfig::new(Role::Slave, slave_device).with_timing(short_timing()),
        slave_callbacks,
    );

    let mut tone = ToneGenerator::new(master_device.outbound_layout(), 1000.0, 0.5);
    let master = spawn(
        "test-master",
        &segment,
        EngineConfig::new(Role::Master, master_device).with_timing(short_timing()),
        Callbacks::new().on_samples_needed(move || Some(tone.next_block())),
    );

    assert_eq!(segment.hooks_installed(), 2);

    let status = wait_for(&slave, |s| s.connected && s.stats.packets_sent > 10);
    assert_eq!(status.stats.connects, 1);
    assert_eq!(status.stats.malformed_frames, 0);

    {
        let received = received.lock();
        let expected = slave_device.inbound_layout().samples_len();
        assert!(!received.is_empty());
        assert!(received.iter().all(|block| block.len() == expected));
        assert!(received.iter().any(|block| block.iter().any(|&b| b != 0)));
    }

    // The Master never connects to its own or the Slave's frames
    let master_status = master.status().unwrap();
    assert!(!master_status.connected);
    assert!(master_status.stats.packets_sent > 0);

    master.stop().unwrap();
    let status = wait_for(&slave, |s| !s.connected);
    assert_eq!(status.stats.disconnects, 1);

    // Stays disconnected without further announcements
    std::thread::sleep(Duration::from_millis(400));
    assert!(!slave.status().unwrap().connected);
    assert_eq!(*changes.lock(), vec![true, false]);

    slave.stop().unwrap();
    assert_eq!(*changes.lock(), vec![true, false]);
    assert_eq!(segment.hooks_installed(), 0);

    master.shutdown();
    slave.shutdown();
}

#[test]
fn test_stopped_loop_reports_status() {
    let segment = Segment::new();
    let slave = spawn(
        "test-idle-slave",
        &segment,
        EngineConfig::new(Role::Slave, DeviceIdentity::placeholder()).with_timing(short_timing()),
        Callbacks::new(),
    );

    std::thread::sleep(Duration::from_millis(50));
    let status = slave.status().unwrap();
    assert!(status.started);
    assert!(!status.connected);
    assert_eq!(status.stats.packets_received, 0);

    slave.stop().unwrap();
    assert!(!slave.status().unwrap().started);
    // Starting again after a stop is allowed
    slave.start().unwrap();
    assert!(slave.status().unwrap().started);
    slave.shutdown();
}
