//! The network seam between the transmission client and the wire.

use std::time::Duration;

/// Multipart form field the verification service reads the record from.
pub const DEFAULT_FIELD_NAME: &str = "file";

/// Content type of uploaded records.
pub const RECORD_CONTENT_TYPE: &str = "application/json";

/// One file upload to the verification endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    /// Full URL of the endpoint
    pub endpoint: String,
    /// Name of the multipart file field
    pub field_name: String,
    /// File name reported for the attachment
    pub file_name: String,
    /// MIME type of the attachment
    pub content_type: String,
    /// Attachment bytes
    pub content: Vec<u8>,
    /// Per-request timeout hint for the transport
    pub timeout: Duration,
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a single multipart POST carrying one file.
///
/// Implementations block until a response arrives or the request fails.
pub trait Transport: Send + Sync {
    fn post_file(&self, upload: &Upload) -> Result<TransportResponse, TransportError>;
}

/// Transmission failures. All of these collapse to an `Error` outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No endpoint configured or the request could not be built
    Config(String),
    /// Connection or I/O failure
    Network(String),
    /// No response within the allotted time
    Timeout,
    /// Non-success status without a structured error body
    Server { status: u16, message: String },
    /// Body is not a structurally valid verification response
    InvalidResponse(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Config(msg) => write!(f, "Transmission config error: {msg}"),
            TransportError::Network(msg) => write!(f, "Could not reach verification service: {msg}"),
            TransportError::Timeout => write!(f, "Verification service did not respond in time"),
            TransportError::Server { status, message } => {
                write!(f, "Verification service error ({status}): {message}")
            }
            TransportError::InvalidResponse(msg) => {
                write!(f, "Invalid verification response: {msg}")
            }
        }
    }
}

impl std::error::Error for TransportError {}
