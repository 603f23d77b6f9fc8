//! Interpretation of verification service responses.
//!
//! The service answers with one of:
//!
//! - `{"result": "Authorized"|"Denied", "confidence": 0.92}`
//! - `{"predicted_user": "alice", "confidence": 0.87}`
//! - `{"error": "No file uploaded"}` (usually with a 4xx/5xx status)

use crate::transmit::transport::{TransportError, TransportResponse};
use serde::{Deserialize, Serialize};

/// Verification verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Authorized,
    Denied,
    Error,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Authorized => write!(f, "Authorized"),
            Outcome::Denied => write!(f, "Denied"),
            Outcome::Error => write!(f, "Error"),
        }
    }
}

/// Result of one transmission attempt. Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub outcome: Outcome,
    /// Confidence in [0, 1]; always 0 for `Error`
    pub confidence: f64,
    /// User the classifier recognised, when the service reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_user: Option<String>,
    /// Human-readable failure description for `Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response body as received, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_payload: Option<String>,
}

impl PredictionResult {
    /// An `Error` outcome with zero confidence.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Error,
            confidence: 0.0,
            predicted_user: None,
            message: Some(message.into()),
            raw_payload: None,
        }
    }

    pub fn from_transport_error(err: &TransportError) -> Self {
        Self::error(err.to_string())
    }

    pub fn is_authorized(&self) -> bool {
        self.outcome == Outcome::Authorized
    }

    pub fn is_error(&self) -> bool {
        self.outcome == Outcome::Error
    }

    fn with_raw(mut self, raw: &str) -> Self {
        self.raw_payload = Some(raw.to_string());
        self
    }
}

impl std::fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.outcome {
            Outcome::Error => write!(
                f,
                "Error: {}",
                self.message.as_deref().unwrap_or("verification failed")
            ),
            outcome => {
                write!(f, "{outcome} (confidence {:.2}%)", self.confidence * 100.0)?;
                if let Some(ref user) = self.predicted_user {
                    write!(f, ", predicted user: {user}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerificationResponse {
    result: Option<String>,
    predicted_user: Option<String>,
    confidence: Option<f64>,
    error: Option<String>,
}

/// Longest slice of a non-JSON error body carried into messages.
const MAX_ERROR_BODY: usize = 200;

/// Map a raw response to a prediction.
///
/// `claimed_user` is the identity being verified; a `predicted_user` answer
/// is `Authorized` only if it matches (case-insensitive). With no claimed
/// user, any recognised user counts as `Authorized`.
pub fn interpret(
    response: &TransportResponse,
    claimed_user: Option<&str>,
) -> Result<PredictionResult, TransportError> {
    let parsed = serde_json::from_str::<VerificationResponse>(&response.body);

    let body = match parsed {
        Ok(VerificationResponse {
            error: Some(message),
            ..
        }) => {
            return Ok(PredictionResult::error(format!(
                "Verification service reported: {message}"
            ))
            .with_raw(&response.body));
        }
        _ if !response.is_success() => {
            let message: String = response.body.chars().take(MAX_ERROR_BODY).collect();
            return Err(TransportError::Server {
                status: response.status,
                message,
            });
        }
        Err(e) => return Err(TransportError::InvalidResponse(e.to_string())),
        Ok(body) => body,
    };

    if let Some(ref result) = body.result {
        if result.eq_ignore_ascii_case("error") {
            return Ok(
                PredictionResult::error("Verification service returned an error result")
                    .with_raw(&response.body),
            );
        }
    }

    let confidence = body
        .confidence
        .ok_or_else(|| TransportError::InvalidResponse("missing confidence".to_string()))?;
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(TransportError::InvalidResponse(format!(
            "confidence {confidence} outside [0, 1]"
        )));
    }

    let outcome = match (body.result.as_deref(), body.predicted_user.as_deref()) {
        (Some(result), _) if result.eq_ignore_ascii_case("authorized") => Outcome::Authorized,
        (Some(result), _) if result.eq_ignore_ascii_case("denied") => Outcome::Denied,
        (Some(result), _) => {
            return Err(TransportError::InvalidResponse(format!(
                "unknown result '{result}'"
            )))
        }
        (None, Some(user)) => match claimed_user {
            Some(claimed) if !claimed.eq_ignore_ascii_case(user) => Outcome::Denied,
            _ => Outcome::Authorized,
        },
        (None, None) => {
            return Err(TransportError::InvalidResponse(
                "neither result nor predicted_user present".to_string(),
            ))
        }
    };

    Ok(PredictionResult {
        outcome,
        confidence,
        predicted_user: body.predicted_user,
        message: None,
        raw_payload: Some(response.body.clone()),
    })
}
