//! Uploads persisted records and interprets the verdict.
//!
//! `submit` never returns an error: every failure becomes an `Error` outcome
//! with zero confidence, and nothing is retried. The record on disk is left
//! untouched, so a failed upload can be resubmitted later.

use crate::store::{PersistedRecord, RecordId};
use crate::transmit::response::{interpret, PredictionResult};
use crate::transmit::transport::{
    Transport, TransportError, TransportResponse, Upload, DEFAULT_FIELD_NAME, RECORD_CONTENT_TYPE,
};
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Default wait for a verification response.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Transmission settings. The endpoint is always caller-supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct TransmissionConfig {
    /// Verification endpoint URL
    pub endpoint: String,
    /// How long to wait before resolving to `Error`
    pub timeout: Duration,
    /// Identity the verdict is checked against, if any
    pub claimed_user: Option<String>,
    /// Multipart field carrying the record
    pub field_name: String,
}

impl TransmissionConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
            claimed_user: None,
            field_name: DEFAULT_FIELD_NAME.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_claimed_user(mut self, user: Option<String>) -> Self {
        self.claimed_user = user;
        self
    }
}

/// Client for the remote verification endpoint.
#[derive(Clone)]
pub struct TransmissionClient {
    transport: Arc<dyn Transport>,
    config: TransmissionConfig,
}

impl TransmissionClient {
    /// Create a client over any transport.
    pub fn new(transport: Arc<dyn Transport>, config: TransmissionConfig) -> Self {
        Self { transport, config }
    }

    /// Create a client backed by [`crate::transmit::HttpTransport`].
    #[cfg(feature = "http")]
    pub fn http(config: TransmissionConfig) -> Result<Self, TransportError> {
        let transport = crate::transmit::http::HttpTransport::new()?;
        Ok(Self::new(Arc::new(transport), config))
    }

    pub fn config(&self) -> &TransmissionConfig {
        &self.config
    }

    /// Upload a freshly persisted record.
    pub fn submit(&self, record: &PersistedRecord) -> PredictionResult {
        match record.to_json() {
            Ok(content) => self.submit_content(&record.id, content.into_bytes()),
            Err(e) => PredictionResult::error(e.to_string()),
        }
    }

    /// Upload raw record content stored under `id`.
    pub fn submit_content(&self, id: &RecordId, content: Vec<u8>) -> PredictionResult {
        let upload = Upload {
            endpoint: self.config.endpoint.clone(),
            field_name: self.config.field_name.clone(),
            file_name: id.file_name(),
            content_type: RECORD_CONTENT_TYPE.to_string(),
            content,
            timeout: self.config.timeout,
        };

        tracing::info!(record = %id, endpoint = %upload.endpoint, "submitting record");
        let result = self
            .dispatch(upload)
            .and_then(|response| interpret(&response, self.config.claimed_user.as_deref()));

        match result {
            Ok(prediction) => {
                tracing::info!(
                    record = %id,
                    outcome = %prediction.outcome,
                    confidence = prediction.confidence,
                    "verification complete"
                );
                prediction
            }
            Err(e) => {
                tracing::warn!(record = %id, error = %e, "verification failed");
                PredictionResult::from_transport_error(&e)
            }
        }
    }

    /// Run the transport on a worker thread and wait at most `timeout`.
    ///
    /// A transport that overruns is abandoned; its late result is discarded.
    fn dispatch(&self, upload: Upload) -> Result<TransportResponse, TransportError> {
        if self.config.endpoint.trim().is_empty() {
            return Err(TransportError::Config(
                "no verification endpoint configured".to_string(),
            ));
        }
        if self.config.timeout.is_zero() {
            return Err(TransportError::Config(
                "response timeout must be greater than zero".to_string(),
            ));
        }

        let (tx, rx) = bounded(1);
        let transport = self.transport.clone();
        thread::Builder::new()
            .name("transmit".to_string())
            .spawn(move || {
                let _ = tx.send(transport.post_file(&upload));
            })
            .map_err(|e| TransportError::Network(format!("cannot spawn transmit worker: {e}")))?;

        match rx.recv_timeout(self.config.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(TransportError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Network(
                "transport worker exited without a response".to_string(),
            )),
        }
    }
}
