//! Durable storage for completed recordings.
//!
//! Each record is a flat JSON file named `<id>.json` inside one records
//! directory, where `<id>` is `walk_<epoch_ms>` or `walk_<label>_<epoch_ms>`.
//! Writes go to a hidden temporary file first and are hard-linked into place
//! under a fresh id, so a failed write never leaves a listable record behind
//! and an existing record is never overwritten.

use crate::sensor::types::{KindCounts, Reading, SampleLog};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

const ID_PREFIX: &str = "walk_";
const FILE_EXTENSION: &str = ".json";
const MAX_MINT_ATTEMPTS: usize = 1_000;

/// Most recent creation timestamp handed out in this process.
static LAST_MINTED_MS: AtomicI64 = AtomicI64::new(0);

/// Filename-safe identifier of a persisted record.
///
/// Ordering is by creation time, then label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId {
    created_at_ms: i64,
    label: Option<String>,
}

impl RecordId {
    /// Mint a fresh id whose timestamp is strictly greater than any id
    /// previously minted in this process.
    pub fn mint(label: Option<&str>) -> Result<Self, StoreError> {
        let label = label.map(normalize_label).transpose()?;
        let now = Utc::now().timestamp_millis();

        let mut last = LAST_MINTED_MS.load(Ordering::SeqCst);
        let created_at_ms = loop {
            let candidate = now.max(last + 1);
            match LAST_MINTED_MS.compare_exchange(
                last,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break candidate,
                Err(actual) => last = actual,
            }
        };

        Ok(Self {
            created_at_ms,
            label,
        })
    }

    /// Parse an id, with or without the `.json` extension.
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        let invalid = || StoreError::InvalidId(s.to_string());

        let stem = s.strip_suffix(FILE_EXTENSION).unwrap_or(s);
        let rest = stem.strip_prefix(ID_PREFIX).ok_or_else(invalid)?;

        let (label, digits) = match rest.rsplit_once('_') {
            Some((label, digits)) => (Some(label), digits),
            None => (None, rest),
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        // One spelling per timestamp, so a parsed id always maps back to its file.
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(invalid());
        }
        let created_at_ms: i64 = digits.parse().map_err(|_| invalid())?;

        let label = match label {
            Some(l) if !l.is_empty() && l.bytes().all(|b| b.is_ascii_lowercase()) => {
                Some(l.to_string())
            }
            Some(_) => return Err(invalid()),
            None => None,
        };

        Ok(Self {
            created_at_ms,
            label,
        })
    }

    /// Creation time in epoch milliseconds.
    pub fn created_at_ms(&self) -> i64 {
        self.created_at_ms
    }

    /// Enrollment label, if the record was captured for a named user.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// File name of the record inside the records directory.
    pub fn file_name(&self) -> String {
        format!("{self}{FILE_EXTENSION}")
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{ID_PREFIX}{label}_{}", self.created_at_ms),
            None => write!(f, "{ID_PREFIX}{}", self.created_at_ms),
        }
    }
}

impl std::str::FromStr for RecordId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RecordId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Labels are lowercase ASCII letters so a user name can be recovered from
/// the file name by dropping digits and underscores.
pub fn normalize_label(label: &str) -> Result<String, StoreError> {
    let normalized = label.trim().to_ascii_lowercase();
    if normalized.is_empty() || !normalized.bytes().all(|b| b.is_ascii_lowercase()) {
        return Err(StoreError::InvalidId(format!(
            "label '{label}' must contain only ASCII letters"
        )));
    }
    Ok(normalized)
}

/// A completed recording as written to storage. Never mutated after write.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRecord {
    pub id: RecordId,
    pub readings: SampleLog,
}

impl PersistedRecord {
    /// Serialize the readings in the record wire format.
    pub fn to_json(&self) -> Result<String, StoreError> {
        serde_json::to_string(&self.readings).map_err(|e| StoreError::Parse(e.to_string()))
    }

    /// Parse record content in the wire format.
    pub fn from_json(id: RecordId, content: &str) -> Result<Self, StoreError> {
        let readings: Vec<Reading> =
            serde_json::from_str(content).map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(Self { id, readings })
    }

    pub fn counts(&self) -> KindCounts {
        KindCounts::of(&self.readings)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Directory-backed record store.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path a record with this id lives at.
    pub fn path_of(&self, id: &RecordId) -> PathBuf {
        self.root.join(id.file_name())
    }

    /// Write a sample log as a new record.
    pub fn persist(&self, readings: SampleLog) -> Result<PersistedRecord, StoreError> {
        self.persist_labeled(readings, None)
    }

    /// Write a sample log as a new record tagged with an enrollment label.
    pub fn persist_labeled(
        &self,
        readings: SampleLog,
        label: Option<&str>,
    ) -> Result<PersistedRecord, StoreError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            StoreError::Persistence(format!("cannot create {:?}: {e}", self.root))
        })?;

        let content =
            serde_json::to_vec(&readings).map_err(|e| StoreError::Persistence(e.to_string()))?;

        let tmp = self.root.join(format!(".{}.tmp", Uuid::new_v4()));
        if let Err(e) = write_synced(&tmp, &content) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::Persistence(format!(
                "failed to write {tmp:?}: {e}"
            )));
        }

        let id = self.publish(&tmp, label);
        let _ = fs::remove_file(&tmp);
        let id = id?;

        tracing::info!(record = %id, readings = readings.len(), "record persisted");
        Ok(PersistedRecord { id, readings })
    }

    /// Link a fully written temp file into place under a fresh id.
    ///
    /// `hard_link` fails if the target exists, so a record written by another
    /// process between minting and linking is never replaced.
    fn publish(&self, tmp: &Path, label: Option<&str>) -> Result<RecordId, StoreError> {
        for _ in 0..MAX_MINT_ATTEMPTS {
            let id = RecordId::mint(label)?;
            let path = self.path_of(&id);
            match fs::hard_link(tmp, &path) {
                Ok(()) => return Ok(id),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StoreError::Persistence(format!(
                        "failed to write {path:?}: {e}"
                    )))
                }
            }
        }
        Err(StoreError::Persistence(
            "could not allocate an unused record id".to_string(),
        ))
    }

    /// All record ids in the store, oldest first. Re-scans on every call.
    pub fn list(&self) -> Result<Vec<RecordId>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Persistence(format!(
                    "cannot list {:?}: {e}",
                    self.root
                )))
            }
        };

        let mut ids: Vec<RecordId> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|e| {
                let name = e.file_name();
                let name = name.to_str()?;
                if !name.ends_with(FILE_EXTENSION) {
                    return None;
                }
                RecordId::parse(name).ok()
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Raw content of a record.
    pub fn read(&self, id: &RecordId) -> Result<String, StoreError> {
        fs::read_to_string(self.path_of(id)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(id.clone()),
            _ => StoreError::Persistence(format!("failed to read {id}: {e}")),
        })
    }

    /// Read and parse a record.
    pub fn load(&self, id: &RecordId) -> Result<PersistedRecord, StoreError> {
        let content = self.read(id)?;
        PersistedRecord::from_json(id.clone(), &content)
    }

    /// Remove a record.
    pub fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        fs::remove_file(self.path_of(id)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(id.clone()),
            _ => StoreError::Persistence(format!("failed to delete {id}: {e}")),
        })?;
        tracing::info!(record = %id, "record deleted");
        Ok(())
    }
}

fn write_synced(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}

/// Record store errors.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// I/O failure while writing, reading, or listing
    Persistence(String),
    /// No record with this id exists
    NotFound(RecordId),
    /// The string is not a valid record id or label
    InvalidId(String),
    /// The record content is not valid record JSON
    Parse(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Persistence(msg) => write!(f, "Persistence failure: {msg}"),
            StoreError::NotFound(id) => write!(f, "Record not found: {id}"),
            StoreError::InvalidId(s) => write!(f, "Invalid record id: {s}"),
            StoreError::Parse(msg) => write!(f, "Malformed record: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}
