//! Audit module for the gait sensor agent.
//!
//! Tracks what the agent has captured and sent, so a user can see at any
//! time how many readings were recorded and where they went.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, create_shared_log_with_persistence, AuditLog, AuditStats, SharedAuditLog};
