//! Recording core: sample merging and the start/stop state machine.

pub mod controller;
pub mod merger;

// Re-export commonly used types
pub use controller::{
    ActiveSession, RecordingController, RecordingError, RecordingState, DEFAULT_UPDATE_INTERVAL,
};
pub use merger::SampleMerger;
