//! Error types for the backend layer.

use thiserror::Error;

use crate::response::ErrorKind;

/// Errors that can occur while talking to an inference backend.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The selected backend is missing something it needs (usually credentials).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Connection, TLS or other transport failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// Classify the error for the response envelope.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::Configuration(_) => ErrorKind::ConfigurationError,
            _ => ErrorKind::InferenceError,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(timeout_secs)
        } else {
            LlmError::Transport(err.to_string())
        }
    }
}
