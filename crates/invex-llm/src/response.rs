//! Normalized backend response.

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Classification of a failed model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The backend could not be used as configured (e.g. missing credentials).
    ConfigurationError,
    /// Network, HTTP, timeout or malformed-body failure.
    InferenceError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ConfigurationError => write!(f, "ConfigurationError"),
            ErrorKind::InferenceError => write!(f, "InferenceError"),
        }
    }
}

/// Outcome of one model call, with every backend's payload reduced to text.
///
/// Serializes as `{"text": ...}` or `{"error": ..., "detail": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelResponse {
    /// Generated text.
    Text { text: String },
    /// The call failed.
    Error { error: ErrorKind, detail: String },
}

impl ModelResponse {
    /// Successful response.
    pub fn text(text: impl Into<String>) -> Self {
        ModelResponse::Text { text: text.into() }
    }

    /// Failed response.
    pub fn error(error: ErrorKind, detail: impl Into<String>) -> Self {
        ModelResponse::Error {
            error,
            detail: detail.into(),
        }
    }

    /// Generated text, if the call succeeded.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ModelResponse::Text { text } => Some(text),
            ModelResponse::Error { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ModelResponse::Error { .. })
    }
}

impl From<LlmError> for ModelResponse {
    fn from(err: LlmError) -> Self {
        ModelResponse::error(err.kind(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_serializes_flat() {
        let json = serde_json::to_value(ModelResponse::text("hello")).unwrap();
        assert_eq!(json, serde_json::json!({ "text": "hello" }));
    }

    #[test]
    fn test_error_serializes_with_kind_and_detail() {
        let response: ModelResponse = LlmError::Timeout(60).into();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "error": "InferenceError",
                "detail": "request timed out after 60s"
            })
        );
        assert!(response.is_error());
        assert_eq!(response.as_text(), None);
    }

    #[test]
    fn test_configuration_error_kind() {
        let response: ModelResponse = LlmError::Configuration("no token".into()).into();
        match response {
            ModelResponse::Error { error, .. } => assert_eq!(error, ErrorKind::ConfigurationError),
            ModelResponse::Text { .. } => panic!("expected an error"),
        }
    }
}
