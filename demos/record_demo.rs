//! Demonstration of a full gait recording session.
//!
//! This example shows how to:
//! 1. Wire host-driven sensor feeds into a recording controller
//! 2. Push a few seconds of synthetic walking readings
//! 3. Stop, persist, and (optionally) submit the record
//! 4. Browse the archive afterwards
//!
//! Run with: cargo run --example record_demo [ENDPOINT]
//!
//! Without an endpoint the record is only stored. Records land in a
//! temporary directory that is printed at the end.

use std::f64::consts::PI;
use std::thread;
use std::time::Duration;

use gait_sensor_agent::{
    audit::create_shared_log,
    sensor::{FeedSensor, SensorKind},
    ArchiveBrowser, RecordStore, RecordingController, VerificationPipeline, CAPTURE_NOTICE,
};

fn main() {
    println!("Gait Sensor Agent - Record Demo");
    println!("===============================");
    println!("{CAPTURE_NOTICE}");

    let endpoint = std::env::args().nth(1);
    let records_dir = std::env::temp_dir().join("gait-sensor-demo");
    let store = RecordStore::new(&records_dir);

    let (accel, accel_feed) = FeedSensor::new(SensorKind::Accelerometer);
    let (gyro, gyro_feed) = FeedSensor::new(SensorKind::Gyroscope);

    let mut controller = RecordingController::new(accel, gyro, store.clone());
    if let Err(e) = controller.set_label(Some("demo")) {
        eprintln!("Error: {e}");
        return;
    }

    let audit = create_shared_log();
    let mut pipeline = VerificationPipeline::new(controller, audit.clone());

    #[cfg(feature = "http")]
    if let Some(ref url) = endpoint {
        let config = gait_sensor_agent::TransmissionConfig::new(url.clone());
        match gait_sensor_agent::TransmissionClient::http(config) {
            Ok(client) => pipeline = pipeline.with_client(client),
            Err(e) => eprintln!("Warning: HTTP client unavailable: {e}"),
        }
    }
    #[cfg(not(feature = "http"))]
    if endpoint.is_some() {
        eprintln!("Warning: built without the http feature; record will only be stored");
    }

    if let Err(e) = pipeline.start() {
        eprintln!("Error starting recording: {e}");
        return;
    }

    println!("Feeding 3 seconds of synthetic walking at 10 Hz...");
    for step in 0..30 {
        let t = step as f64 / 10.0;
        let phase = 2.0 * PI * 1.8 * t;
        accel_feed.push_xyz(0.1 * phase.cos(), -1.0 + 0.3 * phase.sin(), 0.05 * phase.sin());
        gyro_feed.push_xyz(0.6 * phase.sin(), 0.1 * phase.cos(), -0.2 * phase.sin());

        if step % 10 == 9 {
            let counts = pipeline.controller().sample_counts();
            println!(
                "  {} readings ({} accel, {} gyro)",
                counts.total(),
                counts.accel,
                counts.gyro
            );
        }
        thread::sleep(Duration::from_millis(100));
    }

    println!();
    println!("Stopping recording...");
    match pipeline.stop() {
        Ok(Some(outcome)) => {
            println!("Saved {} with {} readings", outcome.record.id, outcome.record.len());
            match outcome.prediction {
                Some(prediction) => println!("Verdict: {prediction}"),
                None => println!("No endpoint given; skipped verification"),
            }
        }
        Ok(None) => println!("Recording was not active"),
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    }

    println!();
    println!("=== Archive ({records_dir:?}) ===");
    let browser = ArchiveBrowser::new(store);
    match browser.list() {
        Ok(ids) => {
            for id in ids {
                println!("  {id}");
            }
        }
        Err(e) => eprintln!("Error listing records: {e}"),
    }

    println!();
    println!("{}", audit.summary());
}
