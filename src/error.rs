//! Error types for the REAC link engine

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Transmit error: {0}")]
    Transmit(#[from] TransmitError),

    #[error("Data stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Work loop is not running")]
    LoopClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while acquiring the resources `start()` needs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("Engine already started")]
    AlreadyStarted,

    #[error("Scheduler unavailable: {0}")]
    SchedulerUnavailable(String),

    #[error("Frame hook unavailable: {0}")]
    HookUnavailable(String),

    #[error("Frame hook already installed")]
    HookAlreadyInstalled,

    #[error("Scheduler period is zero")]
    ZeroPeriod,
}

/// Outbound frame construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Sample buffer is {actual} bytes, expected {expected}")]
    SampleSizeMismatch { expected: usize, actual: usize },
}

/// Inbound frame validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Frame is {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Bad trailing marker: {found:02x?}")]
    BadTrailer { found: [u8; 2] },
}

/// Frame transmission errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransmitError {
    #[error("Link is down")]
    LinkDown,

    #[error("Transmit queue full")]
    QueueFull,
}

/// Errors raised by the header-computation data stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("Data stream not ready")]
    NotReady,
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid channel count: {0}")]
    InvalidChannels(u16),

    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    #[error("Invalid timing: {0}")]
    InvalidTiming(String),
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;
