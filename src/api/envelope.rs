//! Parsing for the backend's response envelope.
//!
//! Responses are usually JSON shaped as `{status, data?, message?}`, but some
//! endpoints prepend stray text before the JSON body and one endpoint reports
//! success through literal status strings rather than a stable code. All of
//! that handling lives here so call sites never string-match on raw bodies.

use serde::Deserialize;
use thiserror::Error;

/// Literal status string the backend uses for an idempotent duplicate
/// check-in/check-out.
pub const STATUS_ALREADY_PROCESSED: &str = "success-Already CheckIN or CheckOut";

/// Literal status string the backend uses when the row update went through.
pub const STATUS_ROW_UPDATED: &str = "success-Record or Row updated ='1'";

/// The usual JSON response envelope.
#[derive(Clone, Debug, Deserialize)]
pub struct Envelope {
    pub status: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Envelope {
    /// Plain success status.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Any of the success statuses, including the literal quirks.
    pub fn is_any_success(&self) -> bool {
        self.is_success()
            || self.status == STATUS_ALREADY_PROCESSED
            || self.status == STATUS_ROW_UPDATED
    }
}

/// Failure to extract an envelope from a response body.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("response is not valid JSON")]
    NotJson,
}

/// Parse a response body into an [`Envelope`].
///
/// Tries a strict parse first. When that fails, retries from the first `{`
/// in the body: several endpoints emit warning text ahead of the JSON.
pub fn parse_server_envelope(text: &str) -> Result<Envelope, EnvelopeError> {
    if let Ok(env) = serde_json::from_str::<Envelope>(text.trim()) {
        return Ok(env);
    }
    if let Some(idx) = text.find('{') {
        if let Ok(env) = serde_json::from_str::<Envelope>(text[idx..].trim()) {
            return Ok(env);
        }
    }
    Err(EnvelopeError::NotJson)
}
