//! Recording state machine.
//!
//! ```text
//!   Idle ──start()──▶ Recording ──stop()──▶ Idle
//! ```
//!
//! `start()` while Recording and `stop()` while Idle are no-ops. `stop()`
//! unsubscribes both streams before taking the snapshot, so the persisted
//! record holds exactly the readings delivered while Recording.

use crate::recording::merger::SampleMerger;
use crate::sensor::source::{SensorError, SensorSource, SubscriptionHandle};
use crate::sensor::types::{KindCounts, SensorKind};
use crate::store::{normalize_label, PersistedRecord, RecordStore, StoreError};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default sensor update interval.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(100);

/// Bookkeeping for an active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSession {
    /// Unique session ID for log correlation.
    pub session_id: Uuid,
    /// When recording started.
    pub started_at: Instant,
    accel: SubscriptionHandle,
    gyro: SubscriptionHandle,
}

/// Current state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    /// Not currently recording.
    #[default]
    Idle,
    /// Both streams are subscribed and feeding the log.
    Recording(ActiveSession),
}

/// Owns the two sensor streams, the sample log, and the record store.
pub struct RecordingController<A: SensorSource, G: SensorSource> {
    accel: A,
    gyro: G,
    store: RecordStore,
    merger: SampleMerger,
    update_interval: Duration,
    label: Option<String>,
    state: RecordingState,
}

impl<A: SensorSource, G: SensorSource> RecordingController<A, G> {
    /// Create a controller. `accel` must be an accelerometer source and
    /// `gyro` a gyroscope source; `start` refuses to run otherwise.
    pub fn new(accel: A, gyro: G, store: RecordStore) -> Self {
        Self {
            accel,
            gyro,
            store,
            merger: SampleMerger::new(),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            label: None,
            state: RecordingState::Idle,
        }
    }

    /// Builder-style update interval.
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Tag subsequent records with an enrollment label.
    ///
    /// The label is validated here so a bad label cannot fail a stop.
    pub fn set_label(&mut self, label: Option<&str>) -> Result<(), RecordingError> {
        self.label = label.map(normalize_label).transpose()?;
        Ok(())
    }

    /// Pre-flight capability check for both streams.
    ///
    /// Readings are tagged by slot, so each source must report the kind of
    /// its slot.
    pub fn check_sensors(&self) -> Result<(), RecordingError> {
        for (expected, found) in [
            (SensorKind::Accelerometer, self.accel.kind()),
            (SensorKind::Gyroscope, self.gyro.kind()),
        ] {
            if expected != found {
                return Err(RecordingError::WrongSensor { expected, found });
            }
        }

        for (kind, available) in [
            (SensorKind::Accelerometer, self.accel.is_available()),
            (SensorKind::Gyroscope, self.gyro.is_available()),
        ] {
            if !available {
                return Err(RecordingError::SensorUnavailable(kind));
            }
        }
        Ok(())
    }

    /// Begin a recording session.
    ///
    /// A no-op if already Recording. Fails without leaving Idle if either
    /// sensor is unavailable or refuses the subscription.
    pub fn start(&mut self) -> Result<(), RecordingError> {
        if let RecordingState::Recording(session) = self.state {
            tracing::debug!(session = %session.session_id, "start ignored: already recording");
            return Ok(());
        }

        self.check_sensors()?;

        self.merger.reset();
        self.accel.set_update_interval(self.update_interval);
        self.gyro.set_update_interval(self.update_interval);

        let accel = self
            .accel
            .subscribe(self.merger.callback_for(SensorKind::Accelerometer))?;
        let gyro = match self
            .gyro
            .subscribe(self.merger.callback_for(SensorKind::Gyroscope))
        {
            Ok(handle) => handle,
            Err(e) => {
                self.accel.unsubscribe(accel);
                self.merger.reset();
                return Err(e.into());
            }
        };

        let session = ActiveSession {
            session_id: Uuid::new_v4(),
            started_at: Instant::now(),
            accel,
            gyro,
        };
        self.state = RecordingState::Recording(session);

        tracing::info!(
            session = %session.session_id,
            interval_ms = self.update_interval.as_millis() as u64,
            "recording started"
        );
        Ok(())
    }

    /// End the session and persist its readings.
    ///
    /// Returns `Ok(None)` if already Idle, `Err(EmptySample)` if nothing was
    /// captured (no record is written), and the new record otherwise.
    pub fn stop(&mut self) -> Result<Option<PersistedRecord>, RecordingError> {
        let session = match std::mem::take(&mut self.state) {
            RecordingState::Idle => {
                tracing::debug!("stop ignored: not recording");
                return Ok(None);
            }
            RecordingState::Recording(session) => session,
        };

        // Unsubscribe first so nothing can append after the snapshot.
        self.accel.unsubscribe(session.accel);
        self.gyro.unsubscribe(session.gyro);
        let snapshot = self.merger.take();

        let elapsed = session.started_at.elapsed();
        if snapshot.is_empty() {
            tracing::warn!(session = %session.session_id, "recording stopped with no readings");
            return Err(RecordingError::EmptySample);
        }

        let counts = KindCounts::of(&snapshot);
        tracing::info!(
            session = %session.session_id,
            accel = counts.accel,
            gyro = counts.gyro,
            elapsed_secs = elapsed.as_secs(),
            "recording stopped"
        );

        let record = self
            .store
            .persist_labeled(snapshot, self.label.as_deref())?;
        Ok(Some(record))
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecordingState::Recording(_))
    }

    /// Whole seconds since start; 0 while Idle.
    pub fn duration_secs(&self) -> u64 {
        match self.state {
            RecordingState::Recording(session) => session.started_at.elapsed().as_secs(),
            RecordingState::Idle => 0,
        }
    }

    /// Live number of readings in the current session.
    pub fn sample_count(&self) -> usize {
        match self.state {
            RecordingState::Recording(_) => self.merger.len(),
            RecordingState::Idle => 0,
        }
    }

    /// Live per-kind counts for the current session.
    pub fn sample_counts(&self) -> KindCounts {
        match self.state {
            RecordingState::Recording(_) => self.merger.counts(),
            RecordingState::Idle => KindCounts::default(),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }
}

impl<A: SensorSource, G: SensorSource> Drop for RecordingController<A, G> {
    fn drop(&mut self) {
        if let RecordingState::Recording(session) = std::mem::take(&mut self.state) {
            self.accel.unsubscribe(session.accel);
            self.gyro.unsubscribe(session.gyro);
            tracing::warn!(session = %session.session_id, "recording discarded on drop");
        }
    }
}

/// Errors from the recording lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingError {
    /// A sensor failed the pre-flight capability check
    SensorUnavailable(SensorKind),
    /// A source was wired into the other sensor's slot
    WrongSensor {
        expected: SensorKind,
        found: SensorKind,
    },
    /// A sensor refused to start delivering samples
    Sensor(SensorError),
    /// Recording stopped with zero readings; nothing was persisted
    EmptySample,
    /// Writing the record failed
    Store(StoreError),
}

impl std::fmt::Display for RecordingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingError::SensorUnavailable(kind) => {
                write!(f, "Sensor unavailable: {kind} is missing on this device")
            }
            RecordingError::WrongSensor { expected, found } => {
                write!(f, "Sensor mismatch: expected {expected}, got {found}")
            }
            RecordingError::Sensor(e) => write!(f, "Sensor error: {e}"),
            RecordingError::EmptySample => write!(f, "No motion data was captured"),
            RecordingError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RecordingError {}

impl From<SensorError> for RecordingError {
    fn from(e: SensorError) -> Self {
        match e {
            SensorError::Unavailable(kind) => RecordingError::SensorUnavailable(kind),
            other => RecordingError::Sensor(other),
        }
    }
}

impl From<StoreError> for RecordingError {
    fn from(e: StoreError) -> Self {
        RecordingError::Store(e)
    }
}
