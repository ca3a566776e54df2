//! Error types for shake-sos

use thiserror::Error;

/// Errors surfaced by the crate's public API
#[derive(Debug, Error)]
pub enum ShakeError {
    #[error("Failed to parse motion input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Motion sensor error: {0}")]
    Sensor(#[from] SensorError),

    #[error("Motion sensor permission denied")]
    PermissionDenied,

    #[error("Motion sensor not supported on this platform")]
    Unsupported,

    #[error("Share failed: {0}")]
    Share(#[from] ShareError),
}

/// Configuration values rejected by validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("threshold must be a positive finite number, got {0}")]
    InvalidThreshold(f64),

    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("jolts_required must be at least 1")]
    ZeroJolts,

    #[error("{field} of {value}ms exceeds the largest representable duration")]
    DurationTooLarge { field: &'static str, value: u64 },

    #[error("cooldown_ms must be greater than zero")]
    ZeroCooldown,

    #[error("at least one trigger phrase is required")]
    NoTriggerPhrases,
}

/// Failures reported by a motion source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    #[error("{0} stream was already consumed")]
    StreamConsumed(&'static str),

    #[error("{0} feed is closed")]
    Disconnected(&'static str),

    #[error("{0} already has an active subscriber")]
    AlreadySubscribed(&'static str),

    #[error("failed to start delivery thread: {0}")]
    Spawn(String),
}

/// Failures of the share fallback chain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareError {
    #[error("share cancelled by user")]
    Cancelled,

    #[error("{channel} share failed: {message}")]
    Failed { channel: String, message: String },

    #[error("no recipients to share with")]
    NoRecipients,

    #[error("sharing not supported on this device")]
    Unsupported,
}
