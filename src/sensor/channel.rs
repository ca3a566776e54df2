//! Host-fed motion source
//!
//! The host's native sensor callback pushes readings through a
//! `MotionSender`; a subscription drains them on its own delivery thread.

use super::{MotionSource, SampleHandler, Subscription};
use crate::error::SensorError;
use crate::types::{MotionReading, MotionSample};
use log::debug;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// How often an idle delivery thread checks whether it was unsubscribed
const POLL_INTERVAL: Duration = Duration::from_millis(20);

const NAME: &str = "channel";

/// Producer half handed to the platform sensor callback
#[derive(Debug, Clone)]
pub struct MotionSender {
    tx: Sender<MotionReading>,
}

impl MotionSender {
    pub fn send(&self, reading: MotionReading) -> Result<(), SensorError> {
        self.tx
            .send(reading)
            .map_err(|_| SensorError::Disconnected(NAME))
    }

    pub fn send_sample(&self, sample: MotionSample) -> Result<(), SensorError> {
        self.send(sample.into())
    }
}

/// Motion source fed by the host through a channel
#[derive(Debug)]
pub struct ChannelSource {
    /// Empty while a subscription holds the receiver
    receiver: Arc<Mutex<Option<Receiver<MotionReading>>>>,
}

impl ChannelSource {
    pub fn new() -> (Self, MotionSender) {
        let (tx, rx) = mpsc::channel();
        let source = Self {
            receiver: Arc::new(Mutex::new(Some(rx))),
        };
        (source, MotionSender { tx })
    }
}

/// Receiver taken out of its source for one subscription. Dropping the claim
/// puts the receiver back so a later subscribe can take it.
struct ReceiverClaim {
    slot: Arc<Mutex<Option<Receiver<MotionReading>>>>,
    rx: Option<Receiver<MotionReading>>,
}

impl Drop for ReceiverClaim {
    fn drop(&mut self) {
        if let Some(rx) = self.rx.take() {
            *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(rx);
        }
    }
}

impl MotionSource for ChannelSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn subscribe(&self, mut on_sample: SampleHandler) -> Result<Subscription, SensorError> {
        let rx = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(SensorError::AlreadySubscribed(NAME))?;
        let claim = ReceiverClaim {
            slot: Arc::clone(&self.receiver),
            rx: Some(rx),
        };

        // Readings queued while nobody was subscribed are stale
        let mut dropped = 0usize;
        if let Some(rx) = claim.rx.as_ref() {
            loop {
                match rx.try_recv() {
                    Ok(_) => dropped += 1,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return Err(SensorError::Disconnected(NAME)),
                }
            }
        }
        if dropped > 0 {
            debug!("Dropped {} readings queued before subscribe", dropped);
        }

        Subscription::spawn(NAME, true, move |active| {
            let claim = claim;
            let Some(rx) = claim.rx.as_ref() else {
                return;
            };

            while active.load(Ordering::SeqCst) {
                match rx.recv_timeout(POLL_INTERVAL) {
                    Ok(reading) => {
                        if active.load(Ordering::SeqCst) {
                            on_sample(reading);
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => {
                        debug!("Motion feed closed");
                        break;
                    }
                }
            }
        })
    }
}
