//! Gait Sensor Agent - gait signature capture for identity verification.
//!
//! This library records a walking pattern from two motion sensors
//! (linear acceleration and angular rate), stores it as a flat JSON record,
//! and submits the record to a remote classifier that answers with an
//! authorization verdict and a confidence.
//!
//! # Guarantees
//!
//! - **One writer**: Both sensor streams append through a single guarded
//!   mutation point, in arrival order
//! - **Exact snapshots**: Stop unsubscribes both streams before the log is
//!   taken, so a record holds exactly the readings delivered while recording
//! - **No partial records**: Records are written atomically or not at all
//! - **Retransmittable**: A failed upload never touches the stored record
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Gait Sensor Agent                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐                                             │
//! │  │Accelerometer│──┐  ┌─────────────┐   ┌─────────────┐       │
//! │  └─────────────┘  ├─▶│   Sample    │──▶│  Recording  │       │
//! │  ┌─────────────┐  │  │   Merger    │   │ Controller  │       │
//! │  │  Gyroscope  │──┘  └─────────────┘   └──────┬──────┘       │
//! │  └─────────────┘                              ▼ stop         │
//! │  ┌─────────────┐     ┌─────────────┐   ┌─────────────┐       │
//! │  │   Archive   │────▶│   Record    │◀──│  Pipeline   │       │
//! │  │   Browser   │     │   Store     │   └──────┬──────┘       │
//! │  └──────┬──────┘     └─────────────┘          ▼              │
//! │         └───────────────────────────▶┌─────────────┐         │
//! │                                      │Transmission │──▶ HTTP │
//! │                                      │   Client    │         │
//! │                                      └─────────────┘         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gait_sensor_agent::{sensor, RecordStore, RecordingController};
//!
//! let (accel, accel_feed) = sensor::FeedSensor::new(sensor::SensorKind::Accelerometer);
//! let (gyro, gyro_feed) = sensor::FeedSensor::new(sensor::SensorKind::Gyroscope);
//! let mut controller = RecordingController::new(accel, gyro, RecordStore::new("records"));
//!
//! controller.start().expect("sensors unavailable");
//! accel_feed.push_xyz(0.02, -0.98, 0.11);
//! gyro_feed.push_xyz(0.40, 0.05, -0.12);
//!
//! let record = controller.stop().expect("stop failed");
//! ```

pub mod archive;
pub mod audit;
pub mod config;
pub mod pipeline;
pub mod recording;
pub mod sensor;
pub mod store;
pub mod transmit;

// Re-export key types at crate root for convenience
pub use archive::{ArchiveBrowser, RecordView};
pub use audit::{AuditLog, AuditStats, SharedAuditLog};
pub use config::{Config, ConfigError};
pub use pipeline::{SessionOutcome, VerificationPipeline};
pub use recording::{RecordingController, RecordingError, RecordingState, SampleMerger};
pub use sensor::{Reading, SampleLog, SensorError, SensorKind, SensorSource};
pub use store::{PersistedRecord, RecordId, RecordStore, StoreError};
pub use transmit::{
    Outcome, PredictionResult, TransmissionClient, TransmissionConfig, Transport, TransportError,
};

#[cfg(feature = "http")]
pub use transmit::HttpTransport;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Notice shown before a recording starts.
pub const CAPTURE_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                 GAIT SENSOR AGENT - CAPTURE NOTICE               ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This agent records your walking pattern for identity checks.    ║
║                                                                  ║
║  ✓ WHAT WE CAPTURE:                                              ║
║    • Linear acceleration (x, y, z) about 10 times per second     ║
║    • Angular rate (x, y, z) about 10 times per second            ║
║    • The time each reading was taken                             ║
║                                                                  ║
║  ✓ WHERE IT GOES:                                                ║
║    • A local JSON file per walk, kept until you delete it        ║
║    • The verification endpoint you configured, and nowhere else  ║
║                                                                  ║
║  List or delete stored walks anytime with:                       ║
║    gait-sensor list                                              ║
║    gait-sensor delete <id>                                       ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_notice_contents() {
        assert!(CAPTURE_NOTICE.contains("CAPTURE NOTICE"));
        assert!(CAPTURE_NOTICE.contains("Angular rate"));
        assert!(CAPTURE_NOTICE.contains("gait-sensor delete"));
    }
}
