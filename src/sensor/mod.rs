//! Motion sensor sources
//!
//! A `MotionSource` is the single capability interface between the detector
//! and whatever platform produces accelerometer readings. The host picks one
//! implementation at startup; detection code never branches on the platform.
//!
//! Delivery is push based. Each subscription owns one delivery thread that
//! calls the handler sequentially, so a handler never runs concurrently with
//! itself.

mod channel;
mod reader;

pub use channel::{ChannelSource, MotionSender};
pub use reader::ReaderSource;

use crate::error::SensorError;
use crate::types::MotionReading;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Callback receiving each reading from a source
pub type SampleHandler = Box<dyn FnMut(MotionReading) + Send + 'static>;

/// Platform capability for delivering motion readings
pub trait MotionSource {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Whether this platform can produce readings at all
    fn is_supported(&self) -> bool;

    /// Start delivering readings to `on_sample` until the returned handle is
    /// unsubscribed or dropped
    fn subscribe(&self, on_sample: SampleHandler) -> Result<Subscription, SensorError>;
}

/// Source for platforms without a motion sensor
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSource;

impl MotionSource for UnsupportedSource {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn is_supported(&self) -> bool {
        false
    }

    fn subscribe(&self, _on_sample: SampleHandler) -> Result<Subscription, SensorError> {
        Err(SensorError::Unsupported(self.name()))
    }
}

/// Handle for an active subscription; dropping it unsubscribes
pub struct Subscription {
    source: &'static str,
    active: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    join_on_stop: bool,
}

impl Subscription {
    /// Run `body` on a named delivery thread. `body` must return promptly once
    /// the flag it is given turns false. When `join_on_stop` is set,
    /// unsubscribing waits for the thread to exit.
    pub(crate) fn spawn<F>(
        source: &'static str,
        join_on_stop: bool,
        body: F,
    ) -> Result<Self, SensorError>
    where
        F: FnOnce(Arc<AtomicBool>) + Send + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);

        let worker = thread::Builder::new()
            .name(format!("motion-{}", source))
            .spawn(move || body(flag))
            .map_err(|e| SensorError::Spawn(e.to_string()))?;

        Ok(Self {
            source,
            active,
            worker: Some(worker),
            join_on_stop,
        })
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    /// True while readings can still be delivered
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
            && self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stop delivery
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    /// Block until the source runs out of readings
    pub fn wait(mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("{} delivery thread panicked", self.source);
            }
        }
        self.active.store(false, Ordering::SeqCst);
    }

    fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if self.join_on_stop {
            if let Some(worker) = self.worker.take() {
                if worker.join().is_err() {
                    log::error!("{} delivery thread panicked", self.source);
                }
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("source", &self.source)
            .field("active", &self.is_active())
            .finish()
    }
}
