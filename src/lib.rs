//! Shake SOS - shake-gesture detection for personal-safety apps
//!
//! Turns a stream of raw accelerometer readings into discrete "shake" events
//! and routes them, together with voice and button triggers, into a single
//! emergency alert: motion source → shake detector → trigger gate → SOS
//! message → share chain.
//!
//! ## Modules
//!
//! - **Detection**: `detector`, `listener`, `sensor`, `permission`
//! - **Triggers**: `trigger`, `voice`
//! - **Alerts**: `alert`
//! - **Wire format**: `schema` (NDJSON motion input, shake event output)

pub mod alert;
pub mod config;
pub mod detector;
pub mod error;
pub mod listener;
pub mod permission;
pub mod schema;
pub mod sensor;
pub mod trigger;
pub mod types;
pub mod voice;

pub use config::{Settings, ShakeConfig, TimeoutPolicy};
pub use detector::ShakeDetector;
pub use error::{ConfigError, SensorError, ShakeError, ShareError};
pub use listener::ShakeListener;
pub use types::{MotionReading, MotionSample, ShakeEvent};

// Schema exports
pub use schema::{MotionEventAdapter, RawMotionEvent, ShakeEventRecord, SCHEMA_VERSION};

// Trigger and alert exports
pub use alert::{compose_sos_message, sms_link, Contact, GeoPoint, ShareChain, ShareRequest};
pub use trigger::{SosActivation, TriggerGate, TriggerSource};

/// Crate version embedded in emitted event records
pub const SHAKE_SOS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for emitted event records
pub const PRODUCER_NAME: &str = "shake-sos";
