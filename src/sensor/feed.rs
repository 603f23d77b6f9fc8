//! Host-driven sensor source.
//!
//! A [`FeedSensor`] does not own any hardware. Whoever holds the paired
//! [`SensorFeed`] (a platform binding, a replay tool, a test) pushes samples
//! into it from their own event loop, and the samples are delivered to the
//! current subscriber, if any.

use crate::sensor::source::{SampleCallback, SensorError, SensorSource, SubscriptionHandle};
use crate::sensor::types::{RawSample, SensorKind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Subscriber {
    handle: SubscriptionHandle,
    callback: SampleCallback,
}

struct Shared {
    kind: SensorKind,
    available: AtomicBool,
    interval_ms: AtomicU64,
    subscriber: Mutex<Option<Subscriber>>,
}

/// Sensor source fed by an external producer.
pub struct FeedSensor {
    shared: Arc<Shared>,
}

/// Producer side of a [`FeedSensor`]. Cheap to clone and `Send`.
#[derive(Clone)]
pub struct SensorFeed {
    shared: Arc<Shared>,
}

impl FeedSensor {
    /// Create a feed-driven source and its producer handle.
    pub fn new(kind: SensorKind) -> (Self, SensorFeed) {
        let shared = Arc::new(Shared {
            kind,
            available: AtomicBool::new(true),
            interval_ms: AtomicU64::new(100),
            subscriber: Mutex::new(None),
        });
        (
            Self {
                shared: shared.clone(),
            },
            SensorFeed { shared },
        )
    }
}

impl SensorSource for FeedSensor {
    fn kind(&self) -> SensorKind {
        self.shared.kind
    }

    fn is_available(&self) -> bool {
        self.shared.available.load(Ordering::SeqCst)
    }

    fn set_update_interval(&mut self, interval: Duration) {
        self.shared
            .interval_ms
            .store(interval.as_millis() as u64, Ordering::SeqCst);
    }

    fn subscribe(&mut self, callback: SampleCallback) -> Result<SubscriptionHandle, SensorError> {
        if !self.is_available() {
            return Err(SensorError::Unavailable(self.shared.kind));
        }

        let mut slot = self
            .shared
            .subscriber
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_some() {
            return Err(SensorError::AlreadySubscribed(self.shared.kind));
        }

        let handle = SubscriptionHandle::next();
        *slot = Some(Subscriber { handle, callback });
        Ok(handle)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        // Taking the lock waits out any push that is mid-delivery.
        let mut slot = self
            .shared
            .subscriber
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.as_ref().map(|s| s.handle) == Some(handle) {
            *slot = None;
        }
    }
}

impl SensorFeed {
    /// Deliver one sample. Returns `true` if a subscriber received it.
    pub fn push(&self, sample: RawSample) -> bool {
        let slot = self
            .shared
            .subscriber
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match slot.as_ref() {
            Some(subscriber) => {
                (subscriber.callback)(sample);
                true
            }
            None => false,
        }
    }

    /// Convenience wrapper around [`SensorFeed::push`].
    pub fn push_xyz(&self, x: f64, y: f64, z: f64) -> bool {
        self.push(RawSample::new(x, y, z))
    }

    /// Mark the underlying sensor as present or missing.
    pub fn set_available(&self, available: bool) {
        self.shared.available.store(available, Ordering::SeqCst);
    }

    /// Whether a subscriber is currently attached.
    pub fn is_subscribed(&self) -> bool {
        self.shared
            .subscriber
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// The interval most recently requested by the subscriber side.
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.shared.interval_ms.load(Ordering::SeqCst))
    }
}
