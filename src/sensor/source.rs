//! The sensor capability contract the recording core depends on.

use crate::sensor::types::{RawSample, SensorKind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Callback invoked once per delivered sample.
pub type SampleCallback = Box<dyn Fn(RawSample) + Send + Sync + 'static>;

/// Opaque handle identifying one active subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    /// Mint a process-unique handle.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A motion sensor that emits discrete readings at a configured rate.
///
/// Implementations must not invoke a callback after `unsubscribe` for its
/// handle has returned.
pub trait SensorSource: Send {
    /// Which sensor this source wraps.
    fn kind(&self) -> SensorKind;

    /// Whether the underlying hardware is present and usable.
    fn is_available(&self) -> bool;

    /// Requested delivery interval. Sources may jitter around it.
    fn set_update_interval(&mut self, interval: Duration);

    /// Begin delivering samples to `callback`.
    fn subscribe(&mut self, callback: SampleCallback) -> Result<SubscriptionHandle, SensorError>;

    /// Stop delivering samples for `handle`. Unknown handles are ignored.
    fn unsubscribe(&mut self, handle: SubscriptionHandle);
}

impl<S: SensorSource + ?Sized> SensorSource for Box<S> {
    fn kind(&self) -> SensorKind {
        (**self).kind()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn set_update_interval(&mut self, interval: Duration) {
        (**self).set_update_interval(interval)
    }

    fn subscribe(&mut self, callback: SampleCallback) -> Result<SubscriptionHandle, SensorError> {
        (**self).subscribe(callback)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        (**self).unsubscribe(handle)
    }
}

/// Errors raised by sensor sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor hardware is missing or unusable
    Unavailable(SensorKind),
    /// The source already has an active subscriber
    AlreadySubscribed(SensorKind),
    /// The source could not start delivering samples
    StartFailed(String),
}

impl std::fmt::Display for SensorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorError::Unavailable(kind) => write!(f, "{kind} is not available"),
            SensorError::AlreadySubscribed(kind) => {
                write!(f, "{kind} already has an active subscription")
            }
            SensorError::StartFailed(msg) => write!(f, "Sensor failed to start: {msg}"),
        }
    }
}

impl std::error::Error for SensorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique() {
        let a = SubscriptionHandle::next();
        let b = SubscriptionHandle::next();
        assert_ne!(a, b);
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_error_display() {
        let err = SensorError::Unavailable(SensorKind::Gyroscope);
        assert_eq!(err.to_string(), "gyroscope is not available");
    }
}
