//! REAC Loopback Demo
//!
//! Runs a Master and a Slave engine on a virtual Ethernet segment. The
//! Master streams a test tone; the Slave reports connection changes and the
//! level of what it receives.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reac_link::{
    audio::{create_shared_queue, pcm::peak_level, ToneGenerator},
    config::AppConfig,
    constants::*,
    host::{LoopHandle, Segment, ThreadTimer, WorkLoop},
    Callbacks, ConnectionEngine, DeviceIdentity, EngineConfig, Role,
};

fn spawn_engine(
    name: &str,
    segment: &Segment,
    config: EngineConfig,
    callbacks: Callbacks,
) -> Result<LoopHandle> {
    let work_loop = WorkLoop::new();
    let timer = ThreadTimer::new(work_loop.dispatcher());
    let port = segment.port(work_loop.dispatcher());
    let engine = ConnectionEngine::new(config, callbacks, timer, port.clone(), port);

    let handle = work_loop
        .spawn(name, engine)
        .with_context(|| format!("Failed to spawn {} work loop", name))?;
    handle
        .start()
        .with_context(|| format!("Failed to start {} engine", name))?;
    Ok(handle)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load config, from the path given as first argument if any
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load_from(&PathBuf::from(path))?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting REAC loopback");

    // The config describes the Slave side; the Master mirrors its channels
    let mut slave_config = config.engine_config()?;
    slave_config.role = Role::Slave;
    let slave_device = slave_config.device;
    let master_config = EngineConfig::new(
        Role::Master,
        DeviceIdentity::new(slave_device.mac, slave_device.out_channels, slave_device.in_channels),
    )
    .with_timing(slave_config.timing);

    let segment = Segment::new();

    // Slave side: received blocks go to a queue drained by the stats loop
    let sink = create_shared_queue(PACKET_QUEUE_CAPACITY);
    let slave_sink = sink.clone();
    let slave_callbacks = Callbacks::new()
        .on_connection_change(|device| match device {
            Some(device) => tracing::info!(
                "Slave: connected to {} ({} in, {} out)",
                device.mac_string(),
                device.in_channels,
                device.out_channels
            ),
            None => tracing::info!("Slave: disconnected"),
        })
        .on_samples_received(move |samples| {
            slave_sink.force_push(bytes::Bytes::copy_from_slice(samples));
        });
    let slave = spawn_engine("reac-slave", &segment, slave_config, slave_callbacks)?;

    // Master side: a test tone on every channel
    let mut tone = ToneGenerator::new(master_config.device.outbound_layout(), DEFAULT_TONE_HZ, 0.5);
    let master_callbacks = Callbacks::new().on_samples_needed(move || Some(tone.next_block()));
    let master = spawn_engine("reac-master", &segment, master_config, master_callbacks)?;

    tracing::info!(
        "Master sending {} channels to Slave, press Ctrl+C to stop",
        master_config.device.out_channels
    );

    let mut stats_interval = tokio::time::interval(Duration::from_secs(STATS_INTERVAL_SECS));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = stats_interval.tick() => {
                let mut peak = 0.0f32;
                let mut blocks = 0usize;
                while let Some(block) = sink.pop() {
                    peak = peak.max(peak_level(&block));
                    blocks += 1;
                }

                let master_status = master.status()?;
                let slave_status = slave.status()?;
                let segment_stats = segment.stats();
                tracing::info!(
                    "Master: {} sent, {} send failures | Slave: {} ({} received, {} sent, {} gaps, {} malformed) | Segment: {} dropped",
                    master_status.stats.packets_sent,
                    master_status.stats.send_failures,
                    if slave_status.connected { "connected" } else { "disconnected" },
                    slave_status.stats.packets_received,
                    slave_status.stats.packets_sent,
                    slave_status.stats.sequence_gaps,
                    slave_status.stats.malformed_frames,
                    segment_stats.frames_dropped
                );
                if blocks > 0 {
                    tracing::info!("Slave: {} blocks drained, peak level {:.2}", blocks, peak);
                }
            }
        }
    }

    tracing::info!("Shutting down");
    master.stop()?;
    slave.stop()?;
    master.shutdown();
    slave.shutdown();
    Ok(())
}
