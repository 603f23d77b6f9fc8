//! reqwest-backed transport for the verification endpoint.

use crate::transmit::transport::{Transport, TransportError, TransportResponse, Upload};
use std::time::Duration;

/// Fallback client-wide timeout when a request carries none.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Async multipart uploader.
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .user_agent(concat!("gait-sensor-agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// POST one file as multipart form data.
    pub async fn post_file(&self, upload: &Upload) -> Result<TransportResponse, TransportError> {
        let part = reqwest::multipart::Part::bytes(upload.content.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)
            .map_err(|e| TransportError::Config(format!("Invalid content type: {e}")))?;
        let form = reqwest::multipart::Form::new().part(upload.field_name.clone(), part);

        let response = self
            .client
            .post(&upload.endpoint)
            .timeout(upload.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;

        tracing::debug!(status, bytes = body.len(), "verification response received");
        Ok(TransportResponse { status, body })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_builder() {
        TransportError::Config(e.to_string())
    } else {
        TransportError::Network(e.to_string())
    }
}

/// Blocking transport for use in synchronous contexts.
///
/// Must not be created or dropped from inside an async runtime.
pub struct HttpTransport {
    inner: HttpClient,
    runtime: tokio::runtime::Runtime,
}

impl HttpTransport {
    /// Create a new blocking HTTP transport.
    pub fn new() -> Result<Self, TransportError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TransportError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: HttpClient::new()?,
            runtime,
        })
    }
}

impl Transport for HttpTransport {
    fn post_file(&self, upload: &Upload) -> Result<TransportResponse, TransportError> {
        self.runtime.block_on(self.inner.post_file(upload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmit::transport::{DEFAULT_FIELD_NAME, RECORD_CONTENT_TYPE};

    #[test]
    fn test_unreachable_endpoint_is_network_error() {
        let transport = HttpTransport::new().unwrap();
        let upload = Upload {
            // Port 9 (discard) on loopback is almost never listening.
            endpoint: "http://127.0.0.1:9/predict".to_string(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
            file_name: "walk_1.json".to_string(),
            content_type: RECORD_CONTENT_TYPE.to_string(),
            content: b"[]".to_vec(),
            timeout: Duration::from_secs(2),
        };

        let err = transport.post_file(&upload).unwrap_err();
        assert!(matches!(
            err,
            TransportError::Network(_) | TransportError::Timeout
        ));
    }

    #[test]
    fn test_bad_url_is_rejected() {
        let transport = HttpTransport::new().unwrap();
        let upload = Upload {
            endpoint: "not a url".to_string(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
            file_name: "walk_1.json".to_string(),
            content_type: RECORD_CONTENT_TYPE.to_string(),
            content: Vec::new(),
            timeout: Duration::from_secs(1),
        };

        assert!(transport.post_file(&upload).is_err());
    }
}
