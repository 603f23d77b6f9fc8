//! Motion sensor sources for the gait pipeline.
//!
//! The recording core only depends on the [`SensorSource`] contract. This
//! module provides the reading types plus three sources: a host-driven feed,
//! a simulated walker, and a noop source for hardware-less targets.

pub mod feed;
pub mod noop;
pub mod simulated;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use feed::{FeedSensor, SensorFeed};
pub use noop::NoopSensor;
pub use simulated::SimulatedSensor;
pub use source::{SampleCallback, SensorError, SensorSource, SubscriptionHandle};
pub use types::{KindCounts, RawSample, Reading, SampleLog, SensorKind};
