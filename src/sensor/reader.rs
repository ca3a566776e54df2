//! NDJSON motion source
//!
//! Reads motion.sample.v1 records line by line from any buffered reader:
//! stdin, a pipe from a browser bridge, or a recorded file.

use super::{MotionSource, SampleHandler, Subscription};
use crate::error::SensorError;
use crate::schema::MotionEventAdapter;
use log::{debug, warn};
use std::io::{self, BufRead, BufReader};
use std::sync::atomic::Ordering;
use std::sync::Mutex;

const NAME: &str = "reader";

type BoxedReader = Box<dyn BufRead + Send + 'static>;

/// Single-use source over a stream of NDJSON motion records
pub struct ReaderSource {
    reader: Mutex<Option<BoxedReader>>,
}

impl ReaderSource {
    pub fn new<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        Self {
            reader: Mutex::new(Some(Box::new(reader))),
        }
    }

    /// Source reading from the process's standard input
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()))
    }

    fn take_reader(&self) -> Option<BoxedReader> {
        match self.reader.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl MotionSource for ReaderSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_supported(&self) -> bool {
        true
    }

    /// The stream cannot be interrupted mid-read, so unsubscribing takes
    /// effect at the next line boundary.
    fn subscribe(&self, mut on_sample: SampleHandler) -> Result<Subscription, SensorError> {
        let reader = self
            .take_reader()
            .ok_or(SensorError::StreamConsumed(NAME))?;

        Subscription::spawn(NAME, false, move |active| {
            let mut skipped = 0usize;

            for (line_num, line) in reader.lines().enumerate() {
                if !active.load(Ordering::SeqCst) {
                    break;
                }

                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Motion stream read failed: {}", e);
                        break;
                    }
                };

                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match MotionEventAdapter::parse_line(trimmed) {
                    Ok(reading) => on_sample(reading),
                    Err(e) => {
                        skipped += 1;
                        warn!("Skipping line {}: {}", line_num + 1, e);
                    }
                }
            }

            debug!("Motion stream ended ({} lines skipped)", skipped);
        })
    }
}
