//! Configuration
//!
//! All settings deserialize from JSON with every field optional; missing
//! fields take the defaults below. Call `validate` before handing a config
//! to a detector or listener.

use crate::error::{ConfigError, ShakeError};
use serde::{Deserialize, Serialize};

/// Minimum delta-acceleration magnitude for a jolt
pub const DEFAULT_THRESHOLD: f64 = 15.0;

/// Gap after which a partial gesture is abandoned
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Minimum spacing between two counted jolts
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Counted jolts needed to fire a shake
pub const DEFAULT_JOLTS_REQUIRED: u32 = 3;

/// Suppression window after an SOS activation
pub const DEFAULT_SOS_COOLDOWN_MS: u64 = 10_000;

/// Button hold time before an SOS triggers
pub const DEFAULT_HOLD_MS: u64 = 2_000;

/// Cancelable countdown before an alert is dispatched
pub const DEFAULT_COUNTDOWN_SECS: u32 = 5;

/// Delay before voice matching re-arms after a match
pub const DEFAULT_VOICE_REARM_MS: u64 = 5_000;

/// Largest duration comparable against millisecond timestamps
pub const MAX_DURATION_MS: u64 = i64::MAX as u64;

/// Which gap abandons an in-progress gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Reset only when the gap since the previous sample exceeds the timeout
    #[default]
    SampleGap,
    /// Also reset when the last counted jolt is older than the timeout
    SampleOrJoltGap,
}

/// Shake detector parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShakeConfig {
    pub threshold: f64,
    pub timeout_ms: u64,
    pub enabled: bool,
    pub debounce_ms: u64,
    pub jolts_required: u32,
    pub timeout_policy: TimeoutPolicy,
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            enabled: true,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            jolts_required: DEFAULT_JOLTS_REQUIRED,
            timeout_policy: TimeoutPolicy::default(),
        }
    }
}

impl ShakeConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.jolts_required == 0 {
            return Err(ConfigError::ZeroJolts);
        }
        let durations = [
            ("timeout_ms", self.timeout_ms),
            ("debounce_ms", self.debounce_ms),
        ];
        for (field, value) in durations {
            if value > MAX_DURATION_MS {
                return Err(ConfigError::DurationTooLarge { field, value });
            }
        }
        Ok(())
    }
}

/// Voice trigger settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub enabled: bool,
    pub trigger_phrases: Vec<String>,
    pub rearm_ms: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            trigger_phrases: vec![
                "help me".to_string(),
                "emergency".to_string(),
                "help".to_string(),
            ],
            rearm_ms: DEFAULT_VOICE_REARM_MS,
        }
    }
}

impl VoiceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trigger_phrases.iter().all(|p| p.trim().is_empty()) {
            return Err(ConfigError::NoTriggerPhrases);
        }
        Ok(())
    }
}

/// SOS flow timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SosConfig {
    pub cooldown_ms: u64,
    pub hold_ms: u64,
    pub countdown_secs: u32,
}

impl Default for SosConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: DEFAULT_SOS_COOLDOWN_MS,
            hold_ms: DEFAULT_HOLD_MS,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
        }
    }
}

impl SosConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cooldown_ms == 0 {
            return Err(ConfigError::ZeroCooldown);
        }
        Ok(())
    }
}

/// Top-level settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub shake: ShakeConfig,
    pub voice: VoiceConfig,
    pub sos: SosConfig,
}

impl Settings {
    /// Parse and validate settings JSON
    pub fn from_json(json: &str) -> Result<Self, ShakeError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ShakeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shake.validate()?;
        self.voice.validate()?;
        self.sos.validate()
    }
}
