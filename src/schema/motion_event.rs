//! motion.sample.v1 and shake.event.v1 wire records
//!
//! Input records carry one accelerometer reading each. Axes are nullable so a
//! host can forward exactly what its platform reported; the detector decides
//! what to do with incomplete readings.
//!
//! Output records wrap a `ShakeEvent` with a schema version and an RFC 3339
//! rendering of the detection time.

use crate::types::{MotionReading, ShakeEvent};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Input schema version
pub const SCHEMA_VERSION: &str = "motion.sample.v1";

/// Output schema version
pub const EVENT_SCHEMA_VERSION: &str = "shake.event.v1";

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// Which platform reading the record came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Native accelerometer plugin
    NativeAccelerometer,
    /// Browser devicemotion `accelerationIncludingGravity`
    DeviceMotion,
    /// Recorded or synthetic data
    Replay,
    #[serde(untagged)]
    Other(String),
}

/// One accelerometer reading on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMotionEvent {
    /// Schema version; omitted records are treated as the current version
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Reading time (Unix epoch, milliseconds)
    pub timestamp_ms: i64,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor: Option<SensorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl RawMotionEvent {
    pub fn new(timestamp_ms: i64, x: f64, y: f64, z: f64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            timestamp_ms,
            x: Some(x),
            y: Some(y),
            z: Some(z),
            sensor: None,
            device_id: None,
        }
    }

    pub fn with_sensor(mut self, sensor: SensorKind) -> Self {
        self.sensor = Some(sensor);
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Check the schema version only; incomplete axes are allowed on the wire
    pub fn check_version(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }
        Ok(())
    }

    /// Full validation: schema version and every axis present and finite
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.check_version()?;

        for (axis, value) in [('x', self.x), ('y', self.y), ('z', self.z)] {
            match value {
                None => return Err(ValidationError::MissingAxis(axis)),
                Some(v) if !v.is_finite() => return Err(ValidationError::NonFiniteAxis(axis)),
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn reading(&self) -> MotionReading {
        MotionReading {
            timestamp_ms: self.timestamp_ms,
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }
}

impl From<MotionReading> for RawMotionEvent {
    fn from(reading: MotionReading) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            timestamp_ms: reading.timestamp_ms,
            x: reading.x,
            y: reading.y,
            z: reading.z,
            sensor: None,
            device_id: None,
        }
    }
}

/// A shake event on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShakeEventRecord {
    pub schema_version: String,
    /// Detection time as RFC 3339 (UTC)
    pub detected_at: String,
    #[serde(flatten)]
    pub event: ShakeEvent,
}

impl ShakeEventRecord {
    pub fn from_event(event: ShakeEvent) -> Self {
        Self {
            schema_version: EVENT_SCHEMA_VERSION.to_string(),
            detected_at: format_timestamp_ms(event.detected_at_ms),
            event,
        }
    }
}

/// Render epoch milliseconds as RFC 3339, or the raw number when out of range
pub fn format_timestamp_ms(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| timestamp_ms.to_string())
}

/// Validation errors for motion records
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Missing {0} axis")]
    MissingAxis(char),

    #[error("Non-finite {0} axis")]
    NonFiniteAxis(char),

    #[error("Timestamp went backwards: {current}ms after {previous}ms")]
    TimestampRegression { previous: i64, current: i64 },
}
