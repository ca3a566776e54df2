//! Shake listener lifecycle
//!
//! Binds a `ShakeDetector` to a `MotionSource`. Every subscription gets a
//! fresh detector that is moved into the source's delivery handler, so
//! detector state lives exactly as long as the subscription and disabling
//! discards it.

use crate::config::ShakeConfig;
use crate::detector::ShakeDetector;
use crate::error::ShakeError;
use crate::sensor::{MotionSource, Subscription};
use crate::types::ShakeEvent;
use log::{info, warn};
use std::sync::Arc;

/// Callback invoked synchronously from sample processing when a shake fires
pub type ShakeCallback = Arc<dyn Fn(&ShakeEvent) + Send + Sync + 'static>;

/// Owns a motion subscription and the detector fed by it
pub struct ShakeListener<S: MotionSource> {
    source: S,
    config: ShakeConfig,
    on_shake: ShakeCallback,
    available: bool,
    subscription: Option<Subscription>,
}

impl<S: MotionSource> ShakeListener<S> {
    /// Create a listener, subscribing immediately when enabled.
    ///
    /// Sensor support is checked once here. A failed subscription leaves the
    /// listener inert; call `resubscribe` to try again.
    pub fn new<F>(source: S, config: ShakeConfig, on_shake: F) -> Result<Self, ShakeError>
    where
        F: Fn(&ShakeEvent) + Send + Sync + 'static,
    {
        config.validate()?;

        let available = source.is_supported();
        if !available {
            warn!("Motion source '{}' is not supported here", source.name());
        }

        let mut listener = Self {
            source,
            config,
            on_shake: Arc::new(on_shake),
            available,
            subscription: None,
        };

        if listener.config.enabled && listener.available {
            if let Err(e) = listener.subscribe() {
                warn!("Shake listener inactive: {}", e);
            }
        }

        Ok(listener)
    }

    /// Result of the construction-time capability check
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Whether readings are currently flowing to a detector
    pub fn is_active(&self) -> bool {
        self.subscription.as_ref().is_some_and(|s| s.is_active())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &ShakeConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Enable or disable detection.
    ///
    /// Enabling subscribes with a fresh detector; disabling unsubscribes and
    /// drops all accumulated state. Single-use sources such as `ReaderSource`
    /// cannot be re-enabled once disabled: the second subscribe returns
    /// `SensorError::StreamConsumed`.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), ShakeError> {
        self.config.enabled = enabled;

        if !enabled {
            self.unsubscribe();
            return Ok(());
        }

        if self.subscription.is_some() {
            return Ok(());
        }
        if !self.available {
            return Err(ShakeError::Unsupported);
        }
        self.subscribe()
    }

    /// Explicit retry after a failed subscription, e.g. once the user granted
    /// motion permission. Restarts with a fresh detector.
    pub fn resubscribe(&mut self) -> Result<(), ShakeError> {
        if !self.available {
            return Err(ShakeError::Unsupported);
        }
        self.unsubscribe();
        if !self.config.enabled {
            return Ok(());
        }
        self.subscribe()
    }

    /// Replace the configuration, restarting detection if enabled
    pub fn update_config(&mut self, config: ShakeConfig) -> Result<(), ShakeError> {
        config.validate()?;
        self.unsubscribe();
        self.config = config;

        if self.config.enabled && self.available {
            self.subscribe()
        } else {
            Ok(())
        }
    }

    /// Block until a finite source has delivered all of its readings
    pub fn wait(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.wait();
        }
    }

    fn subscribe(&mut self) -> Result<(), ShakeError> {
        let mut detector = ShakeDetector::new(self.config.clone());
        let on_shake = Arc::clone(&self.on_shake);

        let subscription = self.source.subscribe(Box::new(move |reading| {
            if let Some(event) = detector.on_reading(&reading) {
                on_shake(&event);
            }
        }))?;

        info!(
            "Shake detection started on '{}' (threshold {}, timeout {}ms)",
            self.source.name(),
            self.config.threshold,
            self.config.timeout_ms
        );
        self.subscription = Some(subscription);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            info!("Shake detection stopped on '{}'", self.source.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorError;
    use crate::sensor::{ChannelSource, ReaderSource, SampleHandler, UnsupportedSource};
    use crate::types::MotionReading;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Mutex};
    use std::time::Duration;

    fn event_channel() -> (
        impl Fn(&ShakeEvent) + Send + Sync + 'static,
        mpsc::Receiver<ShakeEvent>,
    ) {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let callback = move |event: &ShakeEvent| {
            let _ = tx.lock().unwrap().send(event.clone());
        };
        (callback, rx)
    }

    fn rest(t: i64) -> MotionReading {
        MotionReading::new(t, 0.0, 0.0, 9.8)
    }

    fn jolted(t: i64) -> MotionReading {
        MotionReading::new(t, 20.0, 0.0, 9.8)
    }

    /// Source whose subscribe always fails, counting attempts
    struct DeniedSource {
        attempts: Arc<AtomicUsize>,
    }

    impl MotionSource for DeniedSource {
        fn name(&self) -> &'static str {
            "denied"
        }

        fn is_supported(&self) -> bool {
            true
        }

        fn subscribe(&self, _on_sample: SampleHandler) -> Result<Subscription, SensorError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(SensorError::Disconnected("denied"))
        }
    }

    #[test]
    fn test_fires_from_channel_source() {
        let (source, sender) = ChannelSource::new();
        let (callback, events) = event_channel();
        let listener = ShakeListener::new(source, ShakeConfig::default(), callback).unwrap();
        assert!(listener.is_active());

        for reading in [rest(0), jolted(600), rest(1200), jolted(1800)] {
            sender.send(reading).unwrap();
        }

        let event = events.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event.detected_at_ms, 1800);
        assert_eq!(event.sequence, 1);
    }

    #[test]
    fn test_disable_mid_gesture_discards_state() {
        let (source, sender) = ChannelSource::new();
        let (callback, events) = event_channel();
        let mut listener = ShakeListener::new(source, ShakeConfig::default(), callback).unwrap();

        for reading in [rest(0), jolted(600), rest(1200)] {
            sender.send(reading).unwrap();
        }

        listener.set_enabled(false).unwrap();
        assert!(!listener.is_active());
        assert!(!listener.is_enabled());

        listener.set_enabled(true).unwrap();
        for reading in [jolted(5000), rest(5600), jolted(6200), rest(6800)] {
            sender.send(reading).unwrap();
        }

        // A leaked count would have fired on the first jolt after re-enabling
        let event = events.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event.gesture_started_at_ms, 5600);
        assert_eq!(event.detected_at_ms, 6800);
    }

    #[test]
    fn test_disabled_listener_does_not_subscribe() {
        let (source, _sender) = ChannelSource::new();
        let config = ShakeConfig::default().with_enabled(false);
        let listener = ShakeListener::new(source, config, |_| {}).unwrap();

        assert!(listener.is_available());
        assert!(!listener.is_active());
    }

    #[test]
    fn test_unsupported_source_stays_inert() {
        let mut listener =
            ShakeListener::new(UnsupportedSource, ShakeConfig::default(), |_| {}).unwrap();

        assert!(!listener.is_available());
        assert!(!listener.is_active());
        assert!(matches!(
            listener.set_enabled(true),
            Err(ShakeError::Unsupported)
        ));
    }

    #[test]
    fn test_failed_subscription_is_not_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let source = DeniedSource {
            attempts: Arc::clone(&attempts),
        };
        let mut listener = ShakeListener::new(source, ShakeConfig::default(), |_| {}).unwrap();

        assert!(!listener.is_active());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);

        assert!(listener.resubscribe().is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let (source, _sender) = ChannelSource::new();
        let config = ShakeConfig::default().with_threshold(0.0);
        assert!(ShakeListener::new(source, config, |_| {}).is_err());
    }

    #[test]
    fn test_update_config_restarts_detection() {
        let (source, sender) = ChannelSource::new();
        let (callback, events) = event_channel();
        let mut listener = ShakeListener::new(source, ShakeConfig::default(), callback).unwrap();

        listener
            .update_config(ShakeConfig::default().with_threshold(30.0))
            .unwrap();
        assert!(listener.is_active());
        assert_eq!(listener.config().threshold, 30.0);

        // 20 is below the new threshold
        for reading in [rest(0), jolted(600), rest(1200), jolted(1800)] {
            sender.send(reading).unwrap();
        }
        let big = |t| MotionReading::new(t, 40.0, 0.0, 9.8);
        for reading in [rest(2400), big(3000), rest(3600), big(4200)] {
            sender.send(reading).unwrap();
        }

        let event = events.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event.gesture_started_at_ms, 3000);
        assert_eq!(event.detected_at_ms, 4200);
    }

    #[test]
    fn test_reader_source_end_to_end() {
        let mut input = String::new();
        for i in 0..7 {
            let x = if i % 2 == 0 { 0.0 } else { 20.0 };
            input.push_str(&format!(
                "{{\"timestamp_ms\": {}, \"x\": {}, \"y\": 0, \"z\": 9.8}}\n",
                i * 600,
                x
            ));
        }

        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        let mut listener = ShakeListener::new(
            ReaderSource::new(Cursor::new(input.into_bytes())),
            ShakeConfig::default(),
            move |event| sink.lock().unwrap().push(event.detected_at_ms),
        )
        .unwrap();

        listener.wait();
        assert!(!listener.is_active());
        assert_eq!(*fired.lock().unwrap(), vec![1800, 3600]);
    }

    #[test]
    fn test_reader_source_cannot_be_re_enabled() {
        let input = "{\"timestamp_ms\": 0, \"x\": 0, \"y\": 0, \"z\": 9.8}\n";
        let (callback, _events) = event_channel();
        let mut listener = ShakeListener::new(
            ReaderSource::new(Cursor::new(input.as_bytes().to_vec())),
            ShakeConfig::default(),
            callback,
        )
        .unwrap();

        listener.set_enabled(false).unwrap();
        let result = listener.set_enabled(true);
        assert!(matches!(
            result,
            Err(ShakeError::Sensor(SensorError::StreamConsumed("reader")))
        ));
        assert!(!listener.is_active());
    }
}
