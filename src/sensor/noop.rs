//! Placeholder source for platforms without motion hardware.
//!
//! This exists so a pipeline can be wired up on any target; the pre-flight
//! capability check rejects it before any recording starts.

use crate::sensor::source::{SampleCallback, SensorError, SensorSource, SubscriptionHandle};
use crate::sensor::types::SensorKind;
use std::time::Duration;

/// A sensor that is never available and never emits samples.
#[derive(Debug, Clone)]
pub struct NoopSensor {
    kind: SensorKind,
}

impl NoopSensor {
    pub fn new(kind: SensorKind) -> Self {
        Self { kind }
    }
}

impl SensorSource for NoopSensor {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        false
    }

    fn set_update_interval(&mut self, _interval: Duration) {}

    fn subscribe(&mut self, _callback: SampleCallback) -> Result<SubscriptionHandle, SensorError> {
        Err(SensorError::Unavailable(self.kind))
    }

    fn unsubscribe(&mut self, _handle: SubscriptionHandle) {}
}
