//! Core types for shake detection
//!
//! This module defines the data that flows through the detector: raw sensor
//! readings as delivered by a motion source, validated motion samples, the
//! detector's mutable state, and the shake events it emits.

use serde::{Deserialize, Serialize};

/// A timestamped 3-axis acceleration reading with all axes present
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Wall-clock time of the reading (Unix epoch, milliseconds)
    pub timestamp_ms: i64,
    /// Acceleration along x (device units, typically m/s² including gravity)
    pub x: f64,
    /// Acceleration along y
    pub y: f64,
    /// Acceleration along z
    pub z: f64,
}

impl MotionSample {
    pub fn new(timestamp_ms: i64, x: f64, y: f64, z: f64) -> Self {
        Self {
            timestamp_ms,
            x,
            y,
            z,
        }
    }

    /// Euclidean norm of the per-axis absolute differences to `previous`.
    ///
    /// Orientation independent: a jolt along any axis, or any combination of
    /// axes, is compared against the same scalar threshold.
    pub fn delta_magnitude(&self, previous: &MotionSample) -> f64 {
        let dx = (self.x - previous.x).abs();
        let dy = (self.y - previous.y).abs();
        let dz = (self.z - previous.z).abs();
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// A reading as delivered by a sensor source; any axis may be missing
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionReading {
    pub timestamp_ms: i64,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
}

impl MotionReading {
    pub fn new(timestamp_ms: i64, x: f64, y: f64, z: f64) -> Self {
        Self {
            timestamp_ms,
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// Convert to a sample; `None` when an axis is missing or not finite
    pub fn to_sample(&self) -> Option<MotionSample> {
        let x = self.x.filter(|v| v.is_finite())?;
        let y = self.y.filter(|v| v.is_finite())?;
        let z = self.z.filter(|v| v.is_finite())?;
        Some(MotionSample::new(self.timestamp_ms, x, y, z))
    }
}

impl From<MotionSample> for MotionReading {
    fn from(sample: MotionSample) -> Self {
        MotionReading::new(sample.timestamp_ms, sample.x, sample.y, sample.z)
    }
}

/// Logical phase of the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorPhase {
    /// No jolts counted
    Idle,
    /// At least one jolt counted, fewer than required to fire
    Accumulating,
}

/// Mutable detector state, owned by exactly one detector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorState {
    /// Most recent accepted sample
    pub last_sample: Option<MotionSample>,
    /// Time of the most recent accepted sample
    pub last_sample_time_ms: Option<i64>,
    /// Qualifying jolts in the current gesture
    pub shake_count: u32,
    /// Time of the most recently counted jolt (`None` before the first one)
    pub last_shake_time_ms: Option<i64>,
    /// Magnitudes of the jolts counted in the current gesture
    pub jolts: Vec<f64>,
    /// Time of the first jolt of the current gesture
    pub gesture_started_ms: Option<i64>,
}

impl DetectorState {
    /// Drop an in-progress gesture, keeping the sample history
    pub fn clear_gesture(&mut self) {
        self.shake_count = 0;
        self.jolts.clear();
        self.gesture_started_ms = None;
    }
}

/// Emitted when a deliberate shake gesture completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShakeEvent {
    /// Unique identifier for this event
    pub event_id: String,
    /// 1-based count of shakes fired by the emitting detector
    pub sequence: u64,
    /// Time of the jolt that completed the gesture
    pub detected_at_ms: i64,
    /// Time of the first jolt of the gesture
    pub gesture_started_at_ms: i64,
    /// Delta magnitudes of the counted jolts, oldest first
    pub jolt_magnitudes: Vec<f64>,
}

impl ShakeEvent {
    /// Duration of the gesture from first to last counted jolt
    pub fn gesture_duration_ms(&self) -> i64 {
        self.detected_at_ms - self.gesture_started_at_ms
    }

    /// Largest jolt in the gesture
    pub fn peak_magnitude(&self) -> f64 {
        self.jolt_magnitudes.iter().copied().fold(0.0, f64::max)
    }
}
