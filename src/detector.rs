//! Shake gesture detection
//!
//! A `ShakeDetector` consumes motion samples one at a time and emits a
//! `ShakeEvent` when the device has been shaken deliberately: a configured
//! number of de-bounced jolts, each arriving before the gesture times out.
//!
//! The detector is passive. It owns its state, keeps no timers, and measures
//! elapsed time only by comparing sample timestamps.

use crate::config::{ShakeConfig, TimeoutPolicy};
use crate::types::{DetectorPhase, DetectorState, MotionReading, MotionSample, ShakeEvent};
use log::{debug, info};

/// Stateful shake detector, one per active listener
#[derive(Debug, Clone)]
pub struct ShakeDetector {
    config: ShakeConfig,
    state: DetectorState,
    fired: u64,
}

impl Default for ShakeDetector {
    fn default() -> Self {
        Self::new(ShakeConfig::default())
    }
}

impl ShakeDetector {
    /// Create a detector with the given configuration
    pub fn new(config: ShakeConfig) -> Self {
        Self {
            config,
            state: DetectorState::default(),
            fired: 0,
        }
    }

    pub fn config(&self) -> &ShakeConfig {
        &self.config
    }

    pub fn state(&self) -> &DetectorState {
        &self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Jolts counted toward the current gesture
    pub fn shake_count(&self) -> u32 {
        self.state.shake_count
    }

    /// Number of shakes fired since construction
    pub fn fired_count(&self) -> u64 {
        self.fired
    }

    pub fn phase(&self) -> DetectorPhase {
        if self.state.shake_count == 0 {
            DetectorPhase::Idle
        } else {
            DetectorPhase::Accumulating
        }
    }

    /// Enable or disable detection. Disabling discards all state.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.reset();
        }
        self.config.enabled = enabled;
    }

    /// Return the detector state to its initial values
    pub fn reset(&mut self) {
        self.state = DetectorState::default();
    }

    /// Process a raw reading. Readings with a missing or non-finite axis are
    /// discarded without touching state.
    pub fn on_reading(&mut self, reading: &MotionReading) -> Option<ShakeEvent> {
        match reading.to_sample() {
            Some(sample) => self.on_sample(&sample),
            None => {
                debug!(
                    "Discarding incomplete motion reading at {}",
                    reading.timestamp_ms
                );
                None
            }
        }
    }

    /// Process one sample; returns the event when this sample completes a shake
    pub fn on_sample(&mut self, sample: &MotionSample) -> Option<ShakeEvent> {
        if !self.config.enabled {
            return None;
        }

        let now = sample.timestamp_ms;

        if self.config.timeout_policy == TimeoutPolicy::SampleOrJoltGap
            && self.state.shake_count > 0
            && self.exceeds(self.state.last_shake_time_ms, now, self.config.timeout_ms)
        {
            debug!("Dropping stalled gesture at {}ms", now);
            self.state.clear_gesture();
        }

        let mut event = None;

        if let Some(previous) = self.state.last_sample {
            let magnitude = sample.delta_magnitude(&previous);

            if magnitude > self.config.threshold {
                event = self.register_jolt(now, magnitude);
            }
        }

        if self.exceeds(self.state.last_sample_time_ms, now, self.config.timeout_ms) {
            self.state.clear_gesture();
        }

        self.state.last_sample = Some(*sample);
        self.state.last_sample_time_ms = Some(now);

        event
    }

    fn register_jolt(&mut self, now: i64, magnitude: f64) -> Option<ShakeEvent> {
        let debounced = match self.state.last_shake_time_ms {
            None => true,
            Some(_) => self.exceeds(self.state.last_shake_time_ms, now, self.config.debounce_ms),
        };

        if !debounced {
            return None;
        }

        self.state.shake_count += 1;
        self.state.last_shake_time_ms = Some(now);
        self.state.jolts.push(magnitude);
        if self.state.gesture_started_ms.is_none() {
            self.state.gesture_started_ms = Some(now);
        }

        debug!(
            "Jolt {}/{} at {}ms (magnitude {:.2})",
            self.state.shake_count, self.config.jolts_required, now, magnitude
        );

        if self.state.shake_count < self.config.jolts_required {
            return None;
        }

        self.fired += 1;
        let event = ShakeEvent {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence: self.fired,
            detected_at_ms: now,
            gesture_started_at_ms: self.state.gesture_started_ms.unwrap_or(now),
            jolt_magnitudes: std::mem::take(&mut self.state.jolts),
        };
        self.state.clear_gesture();

        info!(
            "Shake #{} detected at {}ms ({} jolts over {}ms)",
            event.sequence,
            now,
            event.jolt_magnitudes.len(),
            event.gesture_duration_ms()
        );

        Some(event)
    }

    /// True when `since` is known and strictly more than `limit_ms` before `now`.
    /// Timestamps that go backwards never count as elapsed time, and limits
    /// beyond `i64::MAX` are never exceeded.
    fn exceeds(&self, since: Option<i64>, now: i64, limit_ms: u64) -> bool {
        let limit = i64::try_from(limit_ms).unwrap_or(i64::MAX);
        match since {
            Some(then) => now.saturating_sub(then) > limit,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Sample at rest, gravity on z
    fn rest(t: i64) -> MotionSample {
        MotionSample::new(t, 0.0, 0.0, 9.8)
    }

    /// Sample displaced from rest by `delta` along x
    fn jolted(t: i64, delta: f64) -> MotionSample {
        MotionSample::new(t, delta, 0.0, 9.8)
    }

    fn feed(detector: &mut ShakeDetector, samples: &[MotionSample]) -> Vec<ShakeEvent> {
        samples.iter().filter_map(|s| detector.on_sample(s)).collect()
    }

    /// Alternates rest and displaced samples so every sample after the first
    /// differs from its predecessor by `delta`
    fn alternating(times: &[i64], delta: f64) -> Vec<MotionSample> {
        times
            .iter()
            .enumerate()
            .map(|(i, &t)| if i % 2 == 0 { rest(t) } else { jolted(t, delta) })
            .collect()
    }

    #[test]
    fn test_three_spaced_jolts_fire_once() {
        let mut detector = ShakeDetector::default();

        // Baseline then deltas of 20 at t=0, 600, 1200
        let samples = vec![rest(-100), jolted(0, 20.0), rest(600), jolted(1200, 20.0)];
        let mut fired_at = Vec::new();
        for sample in &samples {
            if detector.on_sample(sample).is_some() {
                fired_at.push(sample.timestamp_ms);
            }
        }

        assert_eq!(fired_at, vec![1200]);
        assert_eq!(detector.shake_count(), 0);
        assert_eq!(detector.fired_count(), 1);
    }

    #[test]
    fn test_event_reports_gesture() {
        let mut detector = ShakeDetector::default();
        let events = feed(
            &mut detector,
            &[rest(-100), jolted(0, 20.0), rest(600), jolted(1200, 25.0)],
        );

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.sequence, 1);
        assert_eq!(event.gesture_started_at_ms, 0);
        assert_eq!(event.detected_at_ms, 1200);
        assert_eq!(event.jolt_magnitudes.len(), 3);
        assert!((event.jolt_magnitudes[0] - 20.0).abs() < 1e-9);
        assert!((event.jolt_magnitudes[2] - 25.0).abs() < 1e-9);
        assert!(uuid::Uuid::parse_str(&event.event_id).is_ok());
    }

    #[test]
    fn test_jolts_inside_debounce_count_once() {
        let mut detector = ShakeDetector::default();
        feed(&mut detector, &[rest(-100), jolted(0, 20.0), rest(300)]);

        assert_eq!(detector.shake_count(), 1);
        assert_eq!(detector.state().last_shake_time_ms, Some(0));
    }

    #[test]
    fn test_debounced_jolt_does_not_extend_window() {
        let mut detector = ShakeDetector::default();
        // Jolts at 0 (counted), 300 (ignored), 550 (counted: 550ms after 0)
        feed(
            &mut detector,
            &[rest(-100), jolted(0, 20.0), rest(300), jolted(550, 20.0)],
        );

        assert_eq!(detector.shake_count(), 2);
        assert_eq!(detector.state().last_shake_time_ms, Some(550));
    }

    #[test]
    fn test_debounce_boundary_is_exclusive() {
        let mut detector = ShakeDetector::default();
        feed(
            &mut detector,
            &[rest(-100), jolted(0, 20.0), rest(500), jolted(1001, 20.0)],
        );

        // 500ms after the first jolt is still inside the window
        assert_eq!(detector.shake_count(), 2);
    }

    #[test]
    fn test_sample_gap_resets_count() {
        let mut detector = ShakeDetector::default();
        feed(&mut detector, &[rest(-100), jolted(0, 20.0), rest(600)]);
        assert_eq!(detector.shake_count(), 2);

        // More than 1000ms since the previous sample
        assert!(detector.on_sample(&rest(2500)).is_none());
        assert_eq!(detector.shake_count(), 0);
        assert_eq!(detector.phase(), DetectorPhase::Idle);

        // Three fresh jolts are needed again
        assert!(detector.on_sample(&jolted(3100, 20.0)).is_none());
        assert!(detector.on_sample(&rest(3700)).is_none());
        assert!(detector.on_sample(&jolted(4300, 20.0)).is_some());
    }

    #[test]
    fn test_sample_gap_late_jolt_counts_before_reset() {
        let mut detector = ShakeDetector::default();
        feed(&mut detector, &[rest(-100), jolted(0, 20.0), rest(600)]);

        // Jolt accounting runs before the gap check, so a late third jolt
        // still completes the gesture
        assert!(detector.on_sample(&jolted(2500, 20.0)).is_some());
        assert_eq!(detector.shake_count(), 0);
    }

    #[test]
    fn test_sample_gap_late_jolt_is_wiped() {
        let mut detector = ShakeDetector::default();
        feed(&mut detector, &[rest(-100), jolted(0, 20.0)]);
        assert_eq!(detector.shake_count(), 1);

        // Counted, then cleared by the 1500ms gap since the previous sample
        assert!(detector.on_sample(&rest(1500)).is_none());
        assert_eq!(detector.shake_count(), 0);
    }

    #[test]
    fn test_jolt_gap_policy_late_jolt_starts_over() {
        let config = ShakeConfig::default().with_timeout_policy(TimeoutPolicy::SampleOrJoltGap);
        let mut detector = ShakeDetector::new(config);
        feed(&mut detector, &[rest(-100), jolted(0, 20.0), rest(600)]);

        assert!(detector.on_sample(&jolted(2500, 20.0)).is_none());
        assert_eq!(detector.shake_count(), 0);
    }

    #[test]
    fn test_repeats_after_firing() {
        let mut detector = ShakeDetector::default();
        let times: Vec<i64> = (0..7).map(|i| i * 600).collect();
        let events = feed(&mut detector, &alternating(&times, 20.0));

        // Jolts at 600..3600: fires at the 3rd and 6th
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].detected_at_ms, 1800);
        assert_eq!(events[1].detected_at_ms, 3600);
        assert_eq!(events[1].sequence, 2);
        assert_eq!(events[1].gesture_started_at_ms, 2400);
    }

    #[test]
    fn test_below_threshold_never_counts() {
        let mut detector = ShakeDetector::default();
        let times: Vec<i64> = (0..20).map(|i| i * 600).collect();
        let events = feed(&mut detector, &alternating(&times, 15.0));

        assert!(events.is_empty());
        assert_eq!(detector.shake_count(), 0);
    }

    #[test]
    fn test_first_sample_never_counts() {
        let mut detector = ShakeDetector::default();
        assert!(detector.on_sample(&jolted(0, 100.0)).is_none());
        assert_eq!(detector.shake_count(), 0);
        assert!(detector.state().last_sample.is_some());
    }

    #[test]
    fn test_disable_discards_state() {
        let mut detector = ShakeDetector::default();
        feed(&mut detector, &[rest(-100), jolted(0, 20.0), rest(600)]);
        assert_eq!(detector.shake_count(), 2);

        detector.set_enabled(false);
        assert_eq!(detector.state(), &DetectorState::default());
        assert!(detector.on_sample(&jolted(1200, 20.0)).is_none());
        assert_eq!(detector.state(), &DetectorState::default());

        detector.set_enabled(true);
        // First sample after re-enabling is only a baseline
        let events = feed(
            &mut detector,
            &[rest(1300), jolted(1400, 20.0), rest(2000)],
        );
        assert!(events.is_empty());
        assert_eq!(detector.shake_count(), 2);
        assert!(detector.on_sample(&jolted(2600, 20.0)).is_some());
    }

    #[test]
    fn test_disabled_by_config() {
        let mut detector = ShakeDetector::new(ShakeConfig::default().with_enabled(false));
        let times: Vec<i64> = (0..6).map(|i| i * 600).collect();
        assert!(feed(&mut detector, &alternating(&times, 40.0)).is_empty());
        assert!(detector.state().last_sample.is_none());
    }

    #[test]
    fn test_incomplete_reading_leaves_state() {
        let mut detector = ShakeDetector::default();
        detector.on_sample(&rest(0));
        let before = detector.state().clone();

        let reading = MotionReading {
            timestamp_ms: 600,
            x: Some(50.0),
            y: None,
            z: Some(9.8),
        };
        assert!(detector.on_reading(&reading).is_none());
        assert_eq!(detector.state(), &before);
    }

    #[test]
    fn test_reading_path_matches_sample_path() {
        let mut detector = ShakeDetector::default();
        let readings = vec![
            MotionReading::new(0, 0.0, 0.0, 9.8),
            MotionReading::new(600, 0.0, 20.0, 9.8),
            MotionReading::new(1200, 0.0, 0.0, 9.8),
            MotionReading::new(1800, 0.0, 20.0, 9.8),
        ];
        let events: Vec<_> = readings.iter().filter_map(|r| detector.on_reading(r)).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_orientation_independent() {
        for axis in 0..3 {
            let mut detector = ShakeDetector::default();
            let displaced = |t: i64| {
                let mut s = rest(t);
                match axis {
                    0 => s.x += 16.0,
                    1 => s.y += 16.0,
                    _ => s.z += 16.0,
                }
                s
            };
            let samples = vec![rest(0), displaced(600), rest(1200), displaced(1800)];
            assert_eq!(feed(&mut detector, &samples).len(), 1, "axis {}", axis);
        }
    }

    #[test]
    fn test_sample_gap_policy_keeps_stale_count_alive() {
        let mut detector = ShakeDetector::default();
        let mut samples = vec![rest(0), jolted(100, 20.0)];
        // Sub-threshold trickle every 200ms for 3 seconds
        for i in 1..=15 {
            samples.push(jolted(100 + i * 200, 20.0 + (i % 2) as f64));
        }
        feed(&mut detector, &samples);

        assert_eq!(detector.shake_count(), 1);
    }

    #[test]
    fn test_jolt_gap_policy_drops_stale_count() {
        let config = ShakeConfig::default().with_timeout_policy(TimeoutPolicy::SampleOrJoltGap);
        let mut detector = ShakeDetector::new(config);
        let mut samples = vec![rest(0), jolted(100, 20.0)];
        for i in 1..=15 {
            samples.push(jolted(100 + i * 200, 20.0 + (i % 2) as f64));
        }
        feed(&mut detector, &samples);

        assert_eq!(detector.shake_count(), 0);
        assert_eq!(detector.phase(), DetectorPhase::Idle);
    }

    #[test]
    fn test_jolt_gap_policy_fires_on_tight_gesture() {
        let config = ShakeConfig::default().with_timeout_policy(TimeoutPolicy::SampleOrJoltGap);
        let mut detector = ShakeDetector::new(config);
        let events = feed(
            &mut detector,
            &[rest(-100), jolted(0, 20.0), rest(600), jolted(1200, 20.0)],
        );
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_jolt_gap_policy_restarts_gesture_with_late_jolt() {
        let config = ShakeConfig::default().with_timeout_policy(TimeoutPolicy::SampleOrJoltGap);
        let mut detector = ShakeDetector::new(config);
        // Jolts 900ms apart, sub-threshold samples in between keep the sample gap short
        let samples = vec![
            rest(0),
            jolted(100, 20.0),
            jolted(600, 21.0),
            rest(1000),
            rest(1500),
            jolted(2200, 20.0),
        ];
        feed(&mut detector, &samples);

        // Jolt at 1000 counted (900ms after 100); at 2200 the previous jolt
        // is 1200ms old so the gesture restarts with this jolt
        assert_eq!(detector.shake_count(), 1);
        assert_eq!(detector.state().gesture_started_ms, Some(2200));
    }

    #[test]
    fn test_backwards_timestamps_do_not_count() {
        let mut detector = ShakeDetector::default();
        feed(&mut detector, &[rest(1000), jolted(1600, 20.0)]);
        assert_eq!(detector.shake_count(), 1);

        // Clock jumped back: jolt is inside the de-bounce window, no reset
        assert!(detector.on_sample(&rest(200)).is_none());
        assert_eq!(detector.shake_count(), 1);
    }

    #[test]
    fn test_unbounded_timeout_never_resets() {
        for policy in [TimeoutPolicy::SampleGap, TimeoutPolicy::SampleOrJoltGap] {
            let config = ShakeConfig::default()
                .with_timeout_ms(u64::MAX)
                .with_timeout_policy(policy);
            let mut detector = ShakeDetector::new(config);

            let samples = vec![
                rest(-100),
                jolted(0, 20.0),
                rest(60_000),
                jolted(120_000, 20.0),
            ];
            let events = feed(&mut detector, &samples);
            assert_eq!(events.len(), 1, "{:?}", policy);
            assert_eq!(events[0].detected_at_ms, 120_000);
        }
    }

    #[test]
    fn test_unbounded_debounce_counts_only_first_jolt() {
        let mut config = ShakeConfig::default();
        config.debounce_ms = u64::MAX;
        let mut detector = ShakeDetector::new(config);

        let events = feed(&mut detector, &alternating(&[-100, 0, 600, 1200, 1800], 20.0));
        assert!(events.is_empty());
        assert_eq!(detector.shake_count(), 1);
    }

    #[test]
    fn test_custom_jolts_required() {
        let mut config = ShakeConfig::default();
        config.jolts_required = 2;
        let mut detector = ShakeDetector::new(config);
        let events = feed(&mut detector, &[rest(0), jolted(600, 20.0), rest(1200)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].jolt_magnitudes.len(), 2);
    }

    #[test]
    fn test_independent_detectors_do_not_share_state() {
        let mut a = ShakeDetector::default();
        let mut b = ShakeDetector::default();
        feed(&mut a, &[rest(0), jolted(600, 20.0), rest(1200)]);

        assert_eq!(a.shake_count(), 2);
        assert_eq!(b.shake_count(), 0);
        assert!(b.on_sample(&rest(1300)).is_none());
        assert_eq!(b.shake_count(), 0);
    }
}
