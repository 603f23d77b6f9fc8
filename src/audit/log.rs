//! Cumulative audit log of captured and transmitted data.
//!
//! Counters are lock-free so sensor callbacks and the CLI loop can record
//! concurrently. Totals survive restarts when a persistence path is set.

use crate::sensor::types::KindCounts;
use crate::transmit::response::{Outcome, PredictionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Audit counters for this agent.
#[derive(Debug)]
pub struct AuditLog {
    /// Accelerometer readings persisted
    accel_readings: AtomicU64,
    /// Gyroscope readings persisted
    gyro_readings: AtomicU64,
    /// Recording sessions started
    sessions_started: AtomicU64,
    /// Sessions stopped with nothing captured
    empty_sessions: AtomicU64,
    /// Records written to storage
    records_persisted: AtomicU64,
    /// Records uploaded for verification
    submissions: AtomicU64,
    authorized: AtomicU64,
    denied: AtomicU64,
    errors: AtomicU64,
    /// Process start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl AuditLog {
    /// Create a new audit log.
    pub fn new() -> Self {
        Self {
            accel_readings: AtomicU64::new(0),
            gyro_readings: AtomicU64::new(0),
            sessions_started: AtomicU64::new(0),
            empty_sessions: AtomicU64::new(0),
            records_persisted: AtomicU64::new(0),
            submissions: AtomicU64::new(0),
            authorized: AtomicU64::new(0),
            denied: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create an audit log backed by a JSON file, loading prior totals.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous audit stats: {e}");
        }

        log
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty_session(&self) {
        self.empty_sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a persisted record and its reading counts.
    pub fn record_persisted(&self, counts: KindCounts) {
        self.records_persisted.fetch_add(1, Ordering::Relaxed);
        self.accel_readings
            .fetch_add(counts.accel as u64, Ordering::Relaxed);
        self.gyro_readings
            .fetch_add(counts.gyro as u64, Ordering::Relaxed);
    }

    /// Record one transmission attempt and its outcome.
    pub fn record_submission(&self, result: &PredictionResult) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
        let counter = match result.outcome {
            Outcome::Authorized => &self.authorized,
            Outcome::Denied => &self.denied,
            Outcome::Error => &self.errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> AuditStats {
        AuditStats {
            accel_readings: self.accel_readings.load(Ordering::Relaxed),
            gyro_readings: self.gyro_readings.load(Ordering::Relaxed),
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            empty_sessions: self.empty_sessions.load(Ordering::Relaxed),
            records_persisted: self.records_persisted.load(Ordering::Relaxed),
            submissions: self.submissions.load(Ordering::Relaxed),
            authorized: self.authorized.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            session_start: self.session_start,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Audit Statistics:\n\
             - Recording sessions started: {}\n\
             - Empty sessions discarded: {}\n\
             - Records persisted: {}\n\
             - Accelerometer readings stored: {}\n\
             - Gyroscope readings stored: {}\n\
             - Verification submissions: {} ({} authorized, {} denied, {} failed)",
            stats.sessions_started,
            stats.empty_sessions,
            stats.records_persisted,
            stats.accel_readings,
            stats.gyro_readings,
            stats.submissions,
            stats.authorized,
            stats.denied,
            stats.errors
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                accel_readings: stats.accel_readings,
                gyro_readings: stats.gyro_readings,
                sessions_started: stats.sessions_started,
                empty_sessions: stats.empty_sessions,
                records_persisted: stats.records_persisted,
                submissions: stats.submissions,
                authorized: stats.authorized,
                denied: stats.denied,
                errors: stats.errors,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.accel_readings
                    .store(persisted.accel_readings, Ordering::Relaxed);
                self.gyro_readings
                    .store(persisted.gyro_readings, Ordering::Relaxed);
                self.sessions_started
                    .store(persisted.sessions_started, Ordering::Relaxed);
                self.empty_sessions
                    .store(persisted.empty_sessions, Ordering::Relaxed);
                self.records_persisted
                    .store(persisted.records_persisted, Ordering::Relaxed);
                self.submissions
                    .store(persisted.submissions, Ordering::Relaxed);
                self.authorized
                    .store(persisted.authorized, Ordering::Relaxed);
                self.denied.store(persisted.denied, Ordering::Relaxed);
                self.errors.store(persisted.errors, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of audit statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditStats {
    pub accel_readings: u64,
    pub gyro_readings: u64,
    pub sessions_started: u64,
    pub empty_sessions: u64,
    pub records_persisted: u64,
    pub submissions: u64,
    pub authorized: u64,
    pub denied: u64,
    pub errors: u64,
    pub session_start: DateTime<Utc>,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    accel_readings: u64,
    gyro_readings: u64,
    sessions_started: u64,
    empty_sessions: u64,
    records_persisted: u64,
    submissions: u64,
    authorized: u64,
    denied: u64,
    errors: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared audit log.
pub type SharedAuditLog = Arc<AuditLog>;

/// Create a new shared audit log.
pub fn create_shared_log() -> SharedAuditLog {
    Arc::new(AuditLog::new())
}

/// Create a new shared audit log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedAuditLog {
    Arc::new(AuditLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_persisted_readings() {
        let log = AuditLog::new();
        log.record_session_started();
        log.record_persisted(KindCounts { accel: 12, gyro: 8 });

        let stats = log.stats();
        assert_eq!(stats.sessions_started, 1);
        assert_eq!(stats.records_persisted, 1);
        assert_eq!(stats.accel_readings, 12);
        assert_eq!(stats.gyro_readings, 8);
    }

    #[test]
    fn test_counts_outcomes() {
        let log = AuditLog::new();
        log.record_submission(&PredictionResult::error("offline"));
        log.record_submission(&PredictionResult {
            outcome: Outcome::Authorized,
            confidence: 0.9,
            predicted_user: None,
            message: None,
            raw_payload: None,
        });

        let stats = log.stats();
        assert_eq!(stats.submissions, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.authorized, 1);
        assert_eq!(stats.denied, 0);
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");

        let log = AuditLog::with_persistence(path.clone());
        log.record_empty_session();
        log.record_persisted(KindCounts { accel: 3, gyro: 4 });
        log.save().unwrap();

        let reloaded = AuditLog::with_persistence(path);
        let stats = reloaded.stats();
        assert_eq!(stats.empty_sessions, 1);
        assert_eq!(stats.gyro_readings, 4);
    }

    #[test]
    fn test_summary_format() {
        let summary = AuditLog::new().summary();
        assert!(summary.contains("Records persisted"));
        assert!(summary.contains("Verification submissions"));
    }
}
