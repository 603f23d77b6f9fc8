//! Browsing and re-submitting previously persisted records.

use crate::sensor::types::{KindCounts, Reading};
use crate::store::{RecordId, RecordStore, StoreError};
use crate::transmit::{PredictionResult, TransmissionClient};

/// A stored record opened for viewing.
#[derive(Debug, Clone)]
pub struct RecordView {
    pub id: RecordId,
    /// Raw file content as stored
    pub content: String,
    /// Parsed readings, or the parse error if the file is damaged
    pub readings: Result<Vec<Reading>, StoreError>,
}

impl RecordView {
    pub fn counts(&self) -> Option<KindCounts> {
        self.readings.as_ref().ok().map(|r| KindCounts::of(r))
    }

    /// Pretty-printed content, falling back to the raw text.
    pub fn pretty(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.content)
            .and_then(|v| serde_json::to_string_pretty(&v))
            .unwrap_or_else(|_| self.content.clone())
    }
}

/// Lists, views, re-submits and deletes stored records.
pub struct ArchiveBrowser {
    store: RecordStore,
    client: Option<TransmissionClient>,
}

impl ArchiveBrowser {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            client: None,
        }
    }

    /// Attach a client for re-submission.
    pub fn with_client(mut self, client: TransmissionClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn list(&self) -> Result<Vec<RecordId>, StoreError> {
        self.store.list()
    }

    pub fn view(&self, id: &RecordId) -> Result<RecordView, StoreError> {
        let content = self.store.read(id)?;
        let readings = serde_json::from_str::<Vec<Reading>>(&content)
            .map_err(|e| StoreError::Parse(e.to_string()));
        Ok(RecordView {
            id: id.clone(),
            content,
            readings,
        })
    }

    /// Upload a stored record again under its existing id.
    ///
    /// The stored bytes are sent unchanged. Fails only if the record cannot
    /// be read; transmission failures come back as an `Error` outcome.
    pub fn resubmit(&self, id: &RecordId) -> Result<PredictionResult, StoreError> {
        let content = self.store.read(id)?;
        Ok(match self.client {
            Some(ref client) => client.submit_content(id, content.into_bytes()),
            None => PredictionResult::error("no verification endpoint configured"),
        })
    }

    pub fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        self.store.delete(id)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::types::{RawSample, SensorKind};
    use crate::transmit::{
        Outcome, TransmissionConfig, Transport, TransportError, TransportResponse, Upload,
    };
    use std::sync::{Arc, Mutex};

    struct RecordingTransport {
        uploads: Mutex<Vec<Upload>>,
    }

    impl Transport for RecordingTransport {
        fn post_file(&self, upload: &Upload) -> Result<TransportResponse, TransportError> {
            self.uploads.lock().unwrap().push(upload.clone());
            Ok(TransportResponse::new(
                200,
                r#"{"result":"Denied","confidence":0.4}"#,
            ))
        }
    }

    fn seeded_store(dir: &std::path::Path) -> (RecordStore, RecordId) {
        let store = RecordStore::new(dir);
        let record = store
            .persist(vec![Reading::at(
                SensorKind::Gyroscope,
                RawSample::new(0.1, 0.2, 0.3),
                42,
            )])
            .unwrap();
        (store, record.id)
    }

    #[test]
    fn test_view_parses_content() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id) = seeded_store(dir.path());
        let browser = ArchiveBrowser::new(store);

        let view = browser.view(&id).unwrap();
        assert_eq!(view.counts(), Some(KindCounts { accel: 0, gyro: 1 }));
        assert!(view.pretty().contains("\"gyro\""));
    }

    #[test]
    fn test_view_of_damaged_file_still_shows_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("walk_5.json"), "[{\"type\":").unwrap();
        let browser = ArchiveBrowser::new(RecordStore::new(dir.path()));

        let view = browser.view(&RecordId::parse("walk_5").unwrap()).unwrap();
        assert!(view.readings.is_err());
        assert_eq!(view.pretty(), "[{\"type\":");
    }

    #[test]
    fn test_resubmit_reuses_id_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id) = seeded_store(dir.path());
        let stored = store.read(&id).unwrap();

        let transport = Arc::new(RecordingTransport {
            uploads: Mutex::new(Vec::new()),
        });
        let client =
            TransmissionClient::new(transport.clone(), TransmissionConfig::new("http://x/predict"));
        let browser = ArchiveBrowser::new(store).with_client(client);

        let result = browser.resubmit(&id).unwrap();
        assert_eq!(result.outcome, Outcome::Denied);

        let uploads = transport.uploads.lock().unwrap();
        assert_eq!(uploads[0].file_name, id.file_name());
        assert_eq!(uploads[0].content, stored.into_bytes());
        assert_eq!(browser.list().unwrap(), vec![id]);
    }

    #[test]
    fn test_resubmit_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let browser = ArchiveBrowser::new(RecordStore::new(dir.path()));
        let id = RecordId::parse("walk_77").unwrap();

        assert_eq!(browser.resubmit(&id), Err(StoreError::NotFound(id)));
    }

    #[test]
    fn test_resubmit_without_client_is_error_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id) = seeded_store(dir.path());
        let browser = ArchiveBrowser::new(store);

        assert!(browser.resubmit(&id).unwrap().is_error());
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id) = seeded_store(dir.path());
        let browser = ArchiveBrowser::new(store);

        browser.delete(&id).unwrap();
        assert!(browser.list().unwrap().is_empty());
        assert!(matches!(browser.view(&id), Err(StoreError::NotFound(_))));
    }
}
