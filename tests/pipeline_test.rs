//! End-to-end tests for record → persist → transmit

use gait_sensor_agent::audit::create_shared_log;
use gait_sensor_agent::sensor::{FeedSensor, SensorFeed, SensorKind};
use gait_sensor_agent::transmit::{TransportResponse, Upload};
use gait_sensor_agent::{
    ArchiveBrowser, Outcome, RecordStore, RecordingController, RecordingError, TransmissionClient,
    TransmissionConfig, Transport, TransportError, VerificationPipeline,
};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

type FeedController = RecordingController<FeedSensor, FeedSensor>;

fn controller(store: &RecordStore) -> (FeedController, SensorFeed, SensorFeed) {
    let (accel, accel_feed) = FeedSensor::new(SensorKind::Accelerometer);
    let (gyro, gyro_feed) = FeedSensor::new(SensorKind::Gyroscope);
    (
        RecordingController::new(accel, gyro, store.clone()),
        accel_feed,
        gyro_feed,
    )
}

/// Answers every upload with a fixed response and remembers what it saw.
struct CannedTransport {
    status: u16,
    body: String,
    seen: Mutex<Vec<Upload>>,
}

impl CannedTransport {
    fn new(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.to_string(),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn uploads(&self) -> Vec<Upload> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for CannedTransport {
    fn post_file(&self, upload: &Upload) -> Result<TransportResponse, TransportError> {
        self.seen.lock().unwrap().push(upload.clone());
        Ok(TransportResponse::new(self.status, self.body.clone()))
    }
}

struct StalledTransport;

impl Transport for StalledTransport {
    fn post_file(&self, _upload: &Upload) -> Result<TransportResponse, TransportError> {
        thread::sleep(Duration::from_secs(2));
        Ok(TransportResponse::new(200, r#"{"result":"Authorized","confidence":1.0}"#))
    }
}

struct RefusingTransport;

impl Transport for RefusingTransport {
    fn post_file(&self, _upload: &Upload) -> Result<TransportResponse, TransportError> {
        Err(TransportError::Network("connection refused".to_string()))
    }
}

fn client(transport: Arc<dyn Transport>) -> TransmissionClient {
    TransmissionClient::new(
        transport,
        TransmissionConfig::new("http://verifier.local:5000/predict"),
    )
}

#[test]
fn test_recording_persists_every_reading() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let (mut controller, accel, gyro) = controller(&store);

    controller.start().unwrap();
    for i in 0..12 {
        accel.push_xyz(i as f64, -9.8, 0.1);
    }
    for i in 0..8 {
        gyro.push_xyz(0.0, i as f64, 0.2);
    }
    let record = controller.stop().unwrap().unwrap();

    assert_eq!(record.len(), 20);
    let counts = record.counts();
    assert_eq!((counts.accel, counts.gyro), (12, 8));

    let raw: serde_json::Value =
        serde_json::from_str(&store.read(&record.id).unwrap()).unwrap();
    let entries = raw.as_array().unwrap();
    assert_eq!(entries.len(), 20);
    assert_eq!(entries[0]["type"], "accel");
    assert_eq!(entries[19]["type"], "gyro");
    assert!(entries[0]["time"].is_i64());
}

#[test]
fn test_interleaved_streams_keep_arrival_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let (mut controller, accel, gyro) = controller(&store);

    controller.start().unwrap();
    for i in 0..5 {
        accel.push_xyz(i as f64, 0.0, 0.0);
        gyro.push_xyz(i as f64, 0.0, 0.0);
    }
    let record = controller.stop().unwrap().unwrap();

    let kinds: Vec<SensorKind> = record.readings.iter().map(|r| r.kind).collect();
    for (i, kind) in kinds.iter().enumerate() {
        let expected = if i % 2 == 0 {
            SensorKind::Accelerometer
        } else {
            SensorKind::Gyroscope
        };
        assert_eq!(*kind, expected);
    }
    for pair in record.readings.windows(2) {
        assert!(pair[0].captured_at_ms <= pair[1].captured_at_ms);
    }
}

#[test]
fn test_empty_recording_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let (mut controller, _accel, _gyro) = controller(&store);

    controller.start().unwrap();
    assert_eq!(controller.stop(), Err(RecordingError::EmptySample));
    assert!(store.list().unwrap().is_empty());
    assert!(!controller.is_recording());
}

#[test]
fn test_start_twice_is_one_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let (mut controller, accel, gyro) = controller(&store);

    controller.start().unwrap();
    let first = controller.state();
    accel.push_xyz(1.0, 2.0, 3.0);
    controller.start().unwrap();
    assert_eq!(controller.state(), first);
    gyro.push_xyz(4.0, 5.0, 6.0);

    let record = controller.stop().unwrap().unwrap();
    assert_eq!(record.len(), 2);
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn test_readings_after_stop_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let (mut controller, accel, gyro) = controller(&store);

    controller.start().unwrap();
    accel.push_xyz(1.0, 1.0, 1.0);
    let record = controller.stop().unwrap().unwrap();

    assert!(!accel.push_xyz(2.0, 2.0, 2.0));
    assert!(!gyro.push_xyz(2.0, 2.0, 2.0));
    assert!(!accel.is_subscribed());
    assert_eq!(store.load(&record.id).unwrap().len(), 1);
}

#[test]
fn test_unavailable_sensor_blocks_start() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let (mut controller, accel, gyro) = controller(&store);
    gyro.set_available(false);

    assert_eq!(
        controller.start(),
        Err(RecordingError::SensorUnavailable(SensorKind::Gyroscope))
    );
    assert!(!controller.is_recording());
    assert!(!accel.is_subscribed());
    assert_eq!(controller.stop(), Ok(None));
}

#[test]
fn test_persisted_record_reads_back_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let (mut controller, accel, gyro) = controller(&store);

    controller.start().unwrap();
    accel.push_xyz(0.123_456_789, -9.806_65, 1e-7);
    gyro.push_xyz(-0.1, 0.2, -0.3);
    let record = controller.stop().unwrap().unwrap();

    let loaded = store.load(&record.id).unwrap();
    assert_eq!(loaded, record);
    assert_eq!(loaded.readings[0].x, 0.123_456_789);
    assert_eq!(loaded.readings[0].z, 1e-7);
}

#[test]
fn test_authorized_response() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let (controller, accel, _gyro) = controller(&store);
    let transport = CannedTransport::new(200, r#"{"result":"Authorized","confidence":0.92}"#);
    let audit = create_shared_log();
    let mut pipeline =
        VerificationPipeline::new(controller, audit.clone()).with_client(client(transport.clone()));

    pipeline.start().unwrap();
    accel.push_xyz(0.0, -1.0, 0.0);
    let outcome = pipeline.stop().unwrap().unwrap();

    let prediction = outcome.prediction.unwrap();
    assert_eq!(prediction.outcome, Outcome::Authorized);
    assert!((prediction.confidence - 0.92).abs() < 1e-9);

    let uploads = transport.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].field_name, "file");
    assert_eq!(uploads[0].file_name, outcome.record.id.file_name());
    assert_eq!(
        uploads[0].content,
        store.read(&outcome.record.id).unwrap().into_bytes()
    );

    let stats = audit.stats();
    assert_eq!(stats.submissions, 1);
    assert_eq!(stats.authorized, 1);
}

#[test]
fn test_denied_response() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let (controller, accel, _gyro) = controller(&store);
    let transport = CannedTransport::new(200, r#"{"result":"Denied","confidence":0.31}"#);
    let mut pipeline =
        VerificationPipeline::new(controller, create_shared_log()).with_client(client(transport));

    pipeline.start().unwrap();
    accel.push_xyz(0.0, -1.0, 0.0);
    let prediction = pipeline.stop().unwrap().unwrap().prediction.unwrap();

    assert_eq!(prediction.outcome, Outcome::Denied);
    assert!((prediction.confidence - 0.31).abs() < 1e-9);
}

#[test]
fn test_unreachable_endpoint_keeps_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let (controller, accel, _gyro) = controller(&store);
    let mut pipeline = VerificationPipeline::new(controller, create_shared_log())
        .with_client(client(Arc::new(RefusingTransport)));

    pipeline.start().unwrap();
    accel.push_xyz(0.0, -1.0, 0.0);
    let outcome = pipeline.stop().unwrap().unwrap();

    let prediction = outcome.prediction.unwrap();
    assert_eq!(prediction.outcome, Outcome::Error);
    assert_eq!(prediction.confidence, 0.0);
    assert!(prediction.message.unwrap().contains("connection refused"));
    assert_eq!(store.load(&outcome.record.id).unwrap(), outcome.record);
}

#[test]
fn test_stalled_endpoint_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let (controller, accel, _gyro) = controller(&store);
    let client = TransmissionClient::new(
        Arc::new(StalledTransport),
        TransmissionConfig::new("http://verifier.local:5000/predict")
            .with_timeout(Duration::from_millis(100)),
    );
    let mut pipeline = VerificationPipeline::new(controller, create_shared_log()).with_client(client);

    pipeline.start().unwrap();
    accel.push_xyz(0.0, -1.0, 0.0);
    let started = std::time::Instant::now();
    let outcome = pipeline.stop().unwrap().unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    let prediction = outcome.prediction.unwrap();
    assert_eq!(prediction.outcome, Outcome::Error);
    assert_eq!(prediction.confidence, 0.0);
    assert_eq!(store.list().unwrap(), vec![outcome.record.id]);
}

#[test]
fn test_failed_record_can_be_resubmitted() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let (controller, accel, gyro) = controller(&store);
    let mut pipeline = VerificationPipeline::new(controller, create_shared_log())
        .with_client(client(Arc::new(RefusingTransport)));

    pipeline.start().unwrap();
    accel.push_xyz(0.0, -1.0, 0.0);
    gyro.push_xyz(0.5, 0.0, 0.0);
    let outcome = pipeline.stop().unwrap().unwrap();
    assert!(outcome.prediction.unwrap().is_error());

    let transport = CannedTransport::new(200, r#"{"result":"Authorized","confidence":0.8}"#);
    let browser = ArchiveBrowser::new(store.clone()).with_client(client(transport.clone()));

    let prediction = browser.resubmit(&outcome.record.id).unwrap();
    assert!(prediction.is_authorized());
    assert_eq!(transport.uploads()[0].file_name, outcome.record.id.file_name());

    browser.delete(&outcome.record.id).unwrap();
    assert!(browser.list().unwrap().is_empty());
}

#[test]
fn test_sessions_produce_distinct_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let (mut controller, accel, _gyro) = controller(&store);

    let mut ids = Vec::new();
    for _ in 0..3 {
        controller.start().unwrap();
        accel.push_xyz(0.0, -1.0, 0.0);
        ids.push(controller.stop().unwrap().unwrap().id);
    }

    assert_eq!(store.list().unwrap(), ids);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}
