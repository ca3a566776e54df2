//! SOS trigger coordination
//!
//! Shake, voice and the on-screen button can all raise an SOS. The types here
//! sit between those triggers and the alert:
//!
//! - `TriggerGate` suppresses repeat activations from any source during a
//!   cooldown window
//! - `HoldDetector` turns a press/release pair into a long-press trigger
//! - `AlertCountdown` gives the user a few seconds to cancel before dispatch
//!
//! Like the detector, none of these own timers. Callers pass the current time
//! in milliseconds.

use crate::config::SosConfig;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// What raised an SOS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Shake,
    Voice,
    Button,
}

impl TriggerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerSource::Shake => "shake",
            TriggerSource::Voice => "voice",
            TriggerSource::Button => "button",
        }
    }
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accepted SOS trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SosActivation {
    pub source: TriggerSource,
    pub activated_at_ms: i64,
}

/// Application-level latch shared by all trigger sources
#[derive(Debug, Clone)]
pub struct TriggerGate {
    cooldown_ms: u64,
    last_activation: Option<SosActivation>,
    suppressed: u64,
}

impl Default for TriggerGate {
    fn default() -> Self {
        Self::from_config(&SosConfig::default())
    }
}

impl TriggerGate {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms,
            last_activation: None,
            suppressed: 0,
        }
    }

    pub fn from_config(config: &SosConfig) -> Self {
        Self::new(config.cooldown_ms)
    }

    /// Offer a trigger. Returns the activation when it is accepted, `None`
    /// while a previous activation is still cooling down.
    pub fn trigger(&mut self, source: TriggerSource, now_ms: i64) -> Option<SosActivation> {
        if self.is_cooling_down(now_ms) {
            self.suppressed += 1;
            debug!("Suppressed {} trigger at {}ms (cooldown)", source, now_ms);
            return None;
        }

        let activation = SosActivation {
            source,
            activated_at_ms: now_ms,
        };
        self.last_activation = Some(activation);
        info!("SOS activated by {} at {}ms", source, now_ms);
        Some(activation)
    }

    pub fn is_cooling_down(&self, now_ms: i64) -> bool {
        match self.last_activation {
            Some(last) => {
                let elapsed = now_ms.saturating_sub(last.activated_at_ms).max(0) as u64;
                elapsed < self.cooldown_ms
            }
            None => false,
        }
    }

    pub fn last_activation(&self) -> Option<SosActivation> {
        self.last_activation
    }

    /// Triggers rejected during cooldown since construction
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }

    /// Clear the latch, e.g. after the user marks themselves safe
    pub fn reset(&mut self) {
        self.last_activation = None;
    }
}

/// Long-press detection for the SOS button
#[derive(Debug, Clone)]
pub struct HoldDetector {
    hold_ms: u64,
    pressed_at_ms: Option<i64>,
    fired: bool,
}

impl Default for HoldDetector {
    fn default() -> Self {
        Self::from_config(&SosConfig::default())
    }
}

impl HoldDetector {
    pub fn new(hold_ms: u64) -> Self {
        Self {
            hold_ms,
            pressed_at_ms: None,
            fired: false,
        }
    }

    pub fn from_config(config: &SosConfig) -> Self {
        Self::new(config.hold_ms)
    }

    /// Begin a press. A press already in progress keeps its start time.
    pub fn press(&mut self, now_ms: i64) {
        if self.pressed_at_ms.is_none() {
            self.pressed_at_ms = Some(now_ms);
            self.fired = false;
        }
    }

    /// End the press. Returns true if this release completes a hold that
    /// `poll` had not already reported.
    pub fn release(&mut self, now_ms: i64) -> bool {
        let completed = self.poll(now_ms);
        self.pressed_at_ms = None;
        self.fired = false;
        completed
    }

    /// True exactly once per press, as soon as the hold time has elapsed
    pub fn poll(&mut self, now_ms: i64) -> bool {
        if self.fired {
            return false;
        }
        let hold = i64::try_from(self.hold_ms).unwrap_or(i64::MAX);
        match self.pressed_at_ms {
            Some(start) if now_ms.saturating_sub(start) >= hold => {
                self.fired = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed_at_ms.is_some()
    }

    /// Fraction of the hold completed, for progress rings
    pub fn progress(&self, now_ms: i64) -> f64 {
        match self.pressed_at_ms {
            Some(_) if self.hold_ms == 0 => 1.0,
            Some(start) => {
                let held = now_ms.saturating_sub(start).max(0) as f64;
                (held / self.hold_ms as f64).min(1.0)
            }
            None => 0.0,
        }
    }
}

/// Countdown phase reported by `AlertCountdown::poll`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum CountdownState {
    Idle,
    Counting { remaining_secs: u32 },
    /// The countdown ran out; the alert should be sent now
    Elapsed,
    Cancelled,
}

/// Cancelable delay between a trigger and alert dispatch
#[derive(Debug, Clone)]
pub struct AlertCountdown {
    duration_secs: u32,
    started_at_ms: Option<i64>,
    cancelled: bool,
    elapsed_reported: bool,
}

impl Default for AlertCountdown {
    fn default() -> Self {
        Self::from_config(&SosConfig::default())
    }
}

impl AlertCountdown {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            started_at_ms: None,
            cancelled: false,
            elapsed_reported: false,
        }
    }

    pub fn from_config(config: &SosConfig) -> Self {
        Self::new(config.countdown_secs)
    }

    /// Start (or restart) the countdown
    pub fn start(&mut self, now_ms: i64) {
        self.started_at_ms = Some(now_ms);
        self.cancelled = false;
        self.elapsed_reported = false;
    }

    pub fn cancel(&mut self) {
        if self.started_at_ms.is_some() {
            info!("SOS countdown cancelled");
            self.cancelled = true;
        }
    }

    /// Whole seconds left, rounded up so the display reads 5, 4, ... 1
    pub fn remaining_secs(&self, now_ms: i64) -> u32 {
        let Some(start) = self.started_at_ms else {
            return self.duration_secs;
        };
        let total_ms = self.duration_secs as i64 * 1000;
        let left_ms = total_ms - now_ms.saturating_sub(start).max(0);
        if left_ms <= 0 {
            0
        } else {
            ((left_ms + 999) / 1000) as u32
        }
    }

    /// Report the current phase. `Elapsed` is returned once; afterwards the
    /// countdown is back to `Idle` until restarted.
    pub fn poll(&mut self, now_ms: i64) -> CountdownState {
        if self.cancelled {
            return CountdownState::Cancelled;
        }
        if self.started_at_ms.is_none() || self.elapsed_reported {
            return CountdownState::Idle;
        }

        match self.remaining_secs(now_ms) {
            0 => {
                self.elapsed_reported = true;
                CountdownState::Elapsed
            }
            remaining_secs => CountdownState::Counting { remaining_secs },
        }
    }
}
