//! Adapter between motion.sample.v1 records and detector inputs
//!
//! Handles batch parsing (NDJSON or a JSON array), per-line parsing for
//! streaming sources, batch validation, and replaying a recording through a
//! detector.

use crate::detector::ShakeDetector;
use crate::error::ShakeError;
use crate::schema::motion_event::*;
use crate::types::{MotionReading, ShakeEvent};

/// Adapter for converting motion records to readings
pub struct MotionEventAdapter;

impl MotionEventAdapter {
    /// Parse a JSON string containing an array of motion records
    pub fn parse_array(json: &str) -> Result<Vec<RawMotionEvent>, ShakeError> {
        let events: Vec<RawMotionEvent> = serde_json::from_str(json)?;
        Ok(events)
    }

    /// Parse NDJSON (newline-delimited JSON) containing motion records
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawMotionEvent>, ShakeError> {
        let mut events = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawMotionEvent>(trimmed) {
                Ok(event) => events.push(event),
                Err(e) => {
                    return Err(ShakeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(events)
    }

    /// Parse one streamed line into a reading.
    ///
    /// Only the schema version is checked: readings with missing axes are
    /// passed through so the detector can discard them.
    pub fn parse_line(line: &str) -> Result<MotionReading, ShakeError> {
        let event: RawMotionEvent = serde_json::from_str(line)?;
        event
            .check_version()
            .map_err(|e| ShakeError::ParseError(e.to_string()))?;
        Ok(event.reading())
    }

    /// Convert records to readings, rejecting any with a foreign schema version
    pub fn to_readings(events: &[RawMotionEvent]) -> Result<Vec<MotionReading>, ShakeError> {
        events
            .iter()
            .map(|event| {
                event
                    .check_version()
                    .map(|_| event.reading())
                    .map_err(|e| ShakeError::ParseError(format!("Invalid record: {}", e)))
            })
            .collect()
    }

    /// Validate a batch of records, including timestamp ordering
    pub fn validate_events(events: &[RawMotionEvent]) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        let mut previous: Option<i64> = None;

        for (idx, event) in events.iter().enumerate() {
            let mut error = event.validate().err();

            if error.is_none() {
                if let Some(prev) = previous {
                    if event.timestamp_ms < prev {
                        error = Some(ValidationError::TimestampRegression {
                            previous: prev,
                            current: event.timestamp_ms,
                        });
                    }
                }
            }

            if error.is_none() {
                previous = Some(event.timestamp_ms);
            }

            if error.is_some() {
                results.push(ValidationResult {
                    index: idx,
                    timestamp_ms: event.timestamp_ms,
                    result: error,
                });
            }
        }

        results
    }

    /// Run readings through a detector, collecting every shake it fires
    pub fn replay(detector: &mut ShakeDetector, readings: &[MotionReading]) -> ReplaySummary {
        let mut summary = ReplaySummary::default();

        for reading in readings {
            summary.readings += 1;
            if reading.to_sample().is_none() {
                summary.discarded += 1;
            }
            if let Some(event) = detector.on_reading(reading) {
                summary.events.push(event);
            }
        }

        summary
    }
}

/// Result of record validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub timestamp_ms: i64,
    pub result: Option<ValidationError>,
}

/// Outcome of replaying a recording
#[derive(Debug, Default)]
pub struct ReplaySummary {
    /// Readings fed to the detector
    pub readings: usize,
    /// Readings dropped for missing or non-finite axes
    pub discarded: usize,
    pub events: Vec<ShakeEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording() -> String {
        let mut lines = Vec::new();
        for i in 0..7 {
            let x = if i % 2 == 0 { 0.0 } else { 20.0 };
            lines.push(format!(
                r#"{{"timestamp_ms": {}, "x": {}, "y": 0.0, "z": 9.8}}"#,
                i * 600,
                x
            ));
        }
        lines.join("\n")
    }

    #[test]
    fn test_parse_ndjson() {
        let events = MotionEventAdapter::parse_ndjson(&recording()).unwrap();
        assert_eq!(events.len(), 7);
        assert_eq!(events[6].timestamp_ms, 3600);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let input = "{\"timestamp_ms\": 0, \"x\": 0, \"y\": 0, \"z\": 0}\n\nnot json";
        let err = MotionEventAdapter::parse_ndjson(input).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_parse_array() {
        let json = r#"[{"timestamp_ms": 0, "x": 0, "y": 0, "z": 9.8},
                       {"timestamp_ms": 50, "x": 1, "y": 0, "z": 9.8}]"#;
        let events = MotionEventAdapter::parse_array(json).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_parse_line_passes_incomplete_reading() {
        let reading =
            MotionEventAdapter::parse_line(r#"{"timestamp_ms": 5, "x": 1.0, "z": 2.0}"#).unwrap();
        assert_eq!(reading.y, None);
    }

    #[test]
    fn test_parse_line_rejects_foreign_version() {
        let line = r#"{"schema_version": "other.v2", "timestamp_ms": 5, "x": 1, "y": 1, "z": 1}"#;
        assert!(MotionEventAdapter::parse_line(line).is_err());
    }

    #[test]
    fn test_validate_events() {
        let mut events = MotionEventAdapter::parse_ndjson(&recording()).unwrap();
        events[2].x = None;
        events[4].timestamp_ms = 100;

        let results = MotionEventAdapter::validate_events(&events);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].index, 2);
        assert_eq!(results[0].result, Some(ValidationError::MissingAxis('x')));
        assert_eq!(results[1].index, 4);
        assert_eq!(
            results[1].result,
            Some(ValidationError::TimestampRegression {
                previous: 1800,
                current: 100
            })
        );
    }

    #[test]
    fn test_replay() {
        let events = MotionEventAdapter::parse_ndjson(&recording()).unwrap();
        let readings = MotionEventAdapter::to_readings(&events).unwrap();
        let mut detector = ShakeDetector::default();

        let summary = MotionEventAdapter::replay(&mut detector, &readings);
        assert_eq!(summary.readings, 7);
        assert_eq!(summary.discarded, 0);
        assert_eq!(summary.events.len(), 2);
        assert_eq!(summary.events[0].detected_at_ms, 1800);
    }

    #[test]
    fn test_replay_counts_discarded() {
        let mut events = MotionEventAdapter::parse_ndjson(&recording()).unwrap();
        events[3].z = None;
        let readings = MotionEventAdapter::to_readings(&events).unwrap();
        let mut detector = ShakeDetector::default();

        let summary = MotionEventAdapter::replay(&mut detector, &readings);
        assert_eq!(summary.discarded, 1);
        // Dropping 1800 leaves a 1200ms gap that abandons the first gesture,
        // and the second one never reaches three jolts
        assert!(summary.events.is_empty());
        assert_eq!(detector.shake_count(), 2);
    }
}
