//! Application configuration
//!
//! Loaded from `config.toml` in the platform config directory, or from an
//! explicit path. A missing file yields the defaults.
//!
//! ```toml
//! [engine]
//! role = "slave"
//! in_channels = 16
//! out_channels = 8
//! mac = "00:40:ab:c4:80:f6"
//!
//! [timing]
//! check_interval_ms = 400
//! disconnect_timeout_ms = 1000
//!
//! [logging]
//! filter = "info"
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::connection::{EngineConfig, Timing};
use crate::error::ConfigError;
use crate::protocol::{format_mac, parse_mac, DeviceIdentity, Role, PACKETS_PER_SECOND};

/// Largest channel count a single frame can carry within a standard MTU
pub const MAX_CHANNELS: u16 = 40;

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineSection,
    pub timing: TimingSection,
    pub logging: LoggingSection,
}

/// Role and peer device settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub role: Role,
    pub in_channels: u16,
    pub out_channels: u16,
    pub mac: String,
}

impl Default for EngineSection {
    fn default() -> Self {
        let device = DeviceIdentity::placeholder();
        Self {
            role: Role::Slave,
            in_channels: device.in_channels,
            out_channels: device.out_channels,
            mac: format_mac(&device.mac),
        }
    }
}

/// Liveness timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSection {
    pub check_interval_ms: u64,
    pub disconnect_timeout_ms: u64,
}

impl Default for TimingSection {
    fn default() -> Self {
        let timing = Timing::default();
        Self {
            check_interval_ms: timing.check_interval.as_millis() as u64,
            disconnect_timeout_ms: timing.disconnect_timeout.as_millis() as u64,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "reac-link").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from the default location
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for channels in [self.engine.in_channels, self.engine.out_channels] {
            if channels == 0 || channels > MAX_CHANNELS {
                return Err(ConfigError::InvalidChannels(channels));
            }
        }
        if parse_mac(&self.engine.mac).is_none() {
            return Err(ConfigError::InvalidMac(self.engine.mac.clone()));
        }
        if self.timing.check_interval_ms == 0 {
            return Err(ConfigError::InvalidTiming(
                "check_interval_ms must be positive".into(),
            ));
        }
        if self.timing.disconnect_timeout_ms < self.timing.check_interval_ms {
            return Err(ConfigError::InvalidTiming(
                "disconnect_timeout_ms is shorter than check_interval_ms".into(),
            ));
        }
        Ok(())
    }

    /// Build the engine configuration
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        self.validate()?;
        let mac = parse_mac(&self.engine.mac)
            .ok_or_else(|| ConfigError::InvalidMac(self.engine.mac.clone()))?;
        let device = DeviceIdentity::new(mac, self.engine.in_channels, self.engine.out_channels);

        Ok(EngineConfig::new(self.engine.role, device).with_timing(Timing {
            packets_per_second: PACKETS_PER_SECOND,
            check_interval: Duration::from_millis(self.timing.check_interval_ms),
            disconnect_timeout: Duration::from_millis(self.timing.disconnect_timeout_ms),
        }))
    }
}
