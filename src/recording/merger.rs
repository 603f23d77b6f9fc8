//! Merges the two sensor streams into one ordered sample log.
//!
//! Every callback from either stream goes through a single mutex-guarded
//! append, so concurrent deliveries never interleave partial writes. Order in
//! the log is the order the appends acquired the lock; readings are not
//! re-sorted or deduplicated.

use crate::sensor::source::SampleCallback;
use crate::sensor::types::{KindCounts, RawSample, Reading, SampleLog, SensorKind};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct LogState {
    readings: SampleLog,
    /// Bumped on every reset so callbacks from an earlier session are ignored.
    generation: u64,
}

/// Single mutation point for the active session's sample log.
#[derive(Debug, Clone, Default)]
pub struct SampleMerger {
    state: Arc<Mutex<LogState>>,
}

impl SampleMerger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Clear the log for a new session.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.readings.clear();
        state.generation += 1;
    }

    /// Build the callback a sensor source should deliver `kind` samples to.
    ///
    /// The callback is bound to the current session: after the next
    /// [`SampleMerger::reset`] or [`SampleMerger::take`] it becomes inert.
    pub fn callback_for(&self, kind: SensorKind) -> SampleCallback {
        let state = self.state.clone();
        let generation = self.lock().generation;

        Box::new(move |sample| append(&state, generation, kind, sample))
    }

    /// Take the accumulated log, leaving an empty one behind.
    pub fn take(&self) -> SampleLog {
        let mut state = self.lock();
        state.generation += 1;
        std::mem::take(&mut state.readings)
    }

    /// Number of readings accumulated so far.
    pub fn len(&self) -> usize {
        self.lock().readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> KindCounts {
        KindCounts::of(&self.lock().readings)
    }
}

/// The only place readings enter the log. Samples from a stale session are
/// dropped.
fn append(state: &Mutex<LogState>, generation: u64, kind: SensorKind, sample: RawSample) {
    let mut state = state
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if state.generation == generation {
        state.readings.push(Reading::capture(kind, sample));
    }
}
