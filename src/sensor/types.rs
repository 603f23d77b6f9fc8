//! Reading types for the gait sensor pipeline.
//!
//! A [`Reading`] is one tagged, timestamped sample from either the
//! linear-acceleration or the angular-rate sensor. Its serialized form is the
//! record wire format: `{"type": "accel"|"gyro", "x", "y", "z", "time"}`.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Which motion sensor produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    /// Linear acceleration
    #[serde(rename = "accel")]
    Accelerometer,
    /// Angular rate
    #[serde(rename = "gyro")]
    Gyroscope,
}

impl SensorKind {
    /// Short name used in the record wire format.
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accel",
            SensorKind::Gyroscope => "gyro",
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorKind::Accelerometer => write!(f, "accelerometer"),
            SensorKind::Gyroscope => write!(f, "gyroscope"),
        }
    }
}

/// An untagged three-axis sample as delivered by a sensor source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RawSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A tagged, timestamped sensor reading.
///
/// Readings are immutable once produced by the merger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Source sensor
    #[serde(rename = "type")]
    pub kind: SensorKind,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Wall-clock capture time in epoch milliseconds
    #[serde(rename = "time")]
    pub captured_at_ms: i64,
}

impl Reading {
    /// Tag a raw sample and stamp it with the current wall-clock time.
    pub fn capture(kind: SensorKind, sample: RawSample) -> Self {
        Self::at(kind, sample, Utc::now().timestamp_millis())
    }

    /// Tag a raw sample with an explicit epoch-millisecond timestamp.
    pub fn at(kind: SensorKind, sample: RawSample, captured_at_ms: i64) -> Self {
        Self {
            kind,
            x: sample.x,
            y: sample.y,
            z: sample.z,
            captured_at_ms,
        }
    }
}

/// Ordered accumulation of readings for one recording session.
///
/// Order is arrival order across both streams, never re-sorted by timestamp.
pub type SampleLog = Vec<Reading>;

/// Per-kind reading counts for a sample log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    pub accel: usize,
    pub gyro: usize,
}

impl KindCounts {
    pub fn of(readings: &[Reading]) -> Self {
        readings.iter().fold(Self::default(), |mut counts, r| {
            match r.kind {
                SensorKind::Accelerometer => counts.accel += 1,
                SensorKind::Gyroscope => counts.gyro += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.accel + self.gyro
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_wire_format() {
        let reading = Reading::at(
            SensorKind::Gyroscope,
            RawSample::new(0.5, -1.25, 2.0),
            1_700_000_000_123,
        );
        let json = serde_json::to_value(&reading).unwrap();

        assert_eq!(json["type"], "gyro");
        assert_eq!(json["x"], 0.5);
        assert_eq!(json["y"], -1.25);
        assert_eq!(json["z"], 2.0);
        assert_eq!(json["time"], 1_700_000_000_123_i64);
    }

    #[test]
    fn test_reading_parses_record_entries() {
        let json = r#"{"type":"accel","x":0.01,"y":-0.98,"z":0.12,"time":1712345678901}"#;
        let reading: Reading = serde_json::from_str(json).unwrap();

        assert_eq!(reading.kind, SensorKind::Accelerometer);
        assert_eq!(reading.captured_at_ms, 1712345678901);
    }

    #[test]
    fn test_kind_counts() {
        let sample = RawSample::new(0.0, 0.0, 1.0);
        let log = vec![
            Reading::capture(SensorKind::Accelerometer, sample),
            Reading::capture(SensorKind::Gyroscope, sample),
            Reading::capture(SensorKind::Accelerometer, sample),
        ];
        let counts = KindCounts::of(&log);

        assert_eq!(counts.accel, 2);
        assert_eq!(counts.gyro, 1);
        assert_eq!(counts.total(), 3);
    }
}
