//! Stop → persist → transmit.
//!
//! Persistence completes before transmission is attempted, and a failed
//! transmission never touches the persisted record.

use crate::audit::SharedAuditLog;
use crate::recording::{RecordingController, RecordingError};
use crate::sensor::source::SensorSource;
use crate::store::PersistedRecord;
use crate::transmit::{PredictionResult, TransmissionClient};

/// What a completed session produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub record: PersistedRecord,
    /// `None` when no transmission client is attached
    pub prediction: Option<PredictionResult>,
}

/// Drives a recording controller and hands finished records to the verifier.
pub struct VerificationPipeline<A: SensorSource, G: SensorSource> {
    controller: RecordingController<A, G>,
    client: Option<TransmissionClient>,
    audit: SharedAuditLog,
}

impl<A: SensorSource, G: SensorSource> VerificationPipeline<A, G> {
    pub fn new(controller: RecordingController<A, G>, audit: SharedAuditLog) -> Self {
        Self {
            controller,
            client: None,
            audit,
        }
    }

    /// Submit each finished record through `client`.
    pub fn with_client(mut self, client: TransmissionClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn start(&mut self) -> Result<(), RecordingError> {
        let was_recording = self.controller.is_recording();
        self.controller.start()?;
        if !was_recording {
            self.audit.record_session_started();
        }
        Ok(())
    }

    /// Stop recording, persist, then submit.
    ///
    /// Returns `Ok(None)` if nothing was recording.
    pub fn stop(&mut self) -> Result<Option<SessionOutcome>, RecordingError> {
        let record = match self.controller.stop() {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(RecordingError::EmptySample) => {
                self.audit.record_empty_session();
                return Err(RecordingError::EmptySample);
            }
            Err(e) => return Err(e),
        };
        self.audit.record_persisted(record.counts());

        let prediction = self.client.as_ref().map(|client| {
            let prediction = client.submit(&record);
            self.audit.record_submission(&prediction);
            prediction
        });

        Ok(Some(SessionOutcome { record, prediction }))
    }

    pub fn controller(&self) -> &RecordingController<A, G> {
        &self.controller
    }

    pub fn audit(&self) -> &SharedAuditLog {
        &self.audit
    }
}
