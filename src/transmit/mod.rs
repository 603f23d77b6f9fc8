//! Transmission of persisted records to the remote verification endpoint.
//!
//! The network is an injectable [`Transport`]; the `http` feature provides a
//! reqwest-backed implementation.

pub mod client;
pub mod response;
pub mod transport;

#[cfg(feature = "http")]
pub mod http;

// Re-export commonly used types
pub use client::{TransmissionClient, TransmissionConfig, DEFAULT_TIMEOUT};
pub use response::{interpret, Outcome, PredictionResult};
pub use transport::{Transport, TransportError, TransportResponse, Upload};

#[cfg(feature = "http")]
pub use http::{HttpClient, HttpTransport};
