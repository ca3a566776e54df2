//! Voice trigger phrases
//!
//! Speech recognition runs on the host. The matcher only sees transcript
//! segments and decides whether they contain a trigger phrase.

use crate::config::VoiceConfig;
use crate::error::ConfigError;
use log::info;

/// Case-insensitive trigger phrase matcher with a re-arm delay
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    phrases: Vec<String>,
    rearm_ms: u64,
    armed_at_ms: Option<i64>,
}

impl Default for PhraseMatcher {
    fn default() -> Self {
        let config = VoiceConfig::default();
        Self {
            phrases: normalize(&config.trigger_phrases),
            rearm_ms: config.rearm_ms,
            armed_at_ms: None,
        }
    }
}

impl PhraseMatcher {
    pub fn new(config: &VoiceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            phrases: normalize(&config.trigger_phrases),
            rearm_ms: config.rearm_ms,
            armed_at_ms: None,
        })
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Whether a match at `now_ms` would be reported
    pub fn is_armed(&self, now_ms: i64) -> bool {
        self.armed_at_ms.map_or(true, |at| now_ms >= at)
    }

    /// Check the latest transcript segments. Returns the first configured
    /// phrase found in the joined, lowercased transcript, then ignores input
    /// until the re-arm delay has passed.
    pub fn feed<S: AsRef<str>>(&mut self, segments: &[S], now_ms: i64) -> Option<String> {
        if !self.is_armed(now_ms) {
            return None;
        }

        let transcript = segments
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let phrase = self
            .phrases
            .iter()
            .find(|phrase| transcript.contains(phrase.as_str()))?
            .clone();

        let rearm = i64::try_from(self.rearm_ms).unwrap_or(i64::MAX);
        self.armed_at_ms = Some(now_ms.saturating_add(rearm));
        info!("Voice trigger phrase '{}' detected", phrase);
        Some(phrase)
    }

    pub fn reset(&mut self) {
        self.armed_at_ms = None;
    }
}

fn normalize(phrases: &[String]) -> Vec<String> {
    phrases
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}
