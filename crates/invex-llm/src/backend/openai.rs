//! OpenAI-compatible chat completions backend.

use serde_json::{json, Value};

use super::{post_json, LlmBackend};
use crate::error::LlmError;
use crate::settings::{BackendKind, LlmSettings};
use crate::{ModelRequest, Result};

/// Backend for `POST {base}/chat/completions`.
///
/// Works with any server speaking the OpenAI chat completions protocol.
pub struct OpenAiBackend {
    settings: LlmSettings,
}

impl OpenAiBackend {
    pub fn new(settings: LlmSettings) -> Self {
        Self { settings }
    }
}

impl LlmBackend for OpenAiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::OpenAi
    }

    fn generate(&self, request: &ModelRequest) -> Result<String> {
        let key = self
            .settings
            .api_key()
            .ok_or_else(|| LlmError::Configuration("OPENAI_API_KEY is not set".to_string()))?;

        let body = json!({
            "model": self.settings.model_id(),
            "messages": [{ "role": "user", "content": request.prompt }],
            "temperature": request.params.temperature,
            "max_tokens": request.params.max_new_tokens,
        });

        let endpoint = format!("{}/chat/completions", self.settings.base_url());
        let raw = post_json(&self.settings, &endpoint, Some(key), &body)?;
        normalize(&raw)
    }
}

/// Pull the first choice's text out of a completions body.
pub(crate) fn normalize(body: &str) -> Result<String> {
    let data: Value = serde_json::from_str(body)
        .map_err(|e| LlmError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let choice = data
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .ok_or_else(|| LlmError::MalformedResponse("no choices in response".to_string()))?;

    choice
        .pointer("/message/content")
        .or_else(|| choice.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LlmError::MalformedResponse("choice has no text content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_chat_message() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"{}"}}]}"#;
        assert_eq!(normalize(body).unwrap(), "{}");
    }

    #[test]
    fn test_normalize_legacy_text_choice() {
        let body = r#"{"choices":[{"text":"hello"}]}"#;
        assert_eq!(normalize(body).unwrap(), "hello");
    }

    #[test]
    fn test_normalize_rejects_missing_choices() {
        assert!(matches!(
            normalize(r#"{"choices":[]}"#),
            Err(LlmError::MalformedResponse(_))
        ));
        assert!(matches!(
            normalize("<html>bad gateway</html>"),
            Err(LlmError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let backend = OpenAiBackend::new(LlmSettings::for_backend(BackendKind::OpenAi));
        let err = backend
            .generate(&ModelRequest::new("prompt", BackendKind::OpenAi))
            .unwrap_err();
        assert!(matches!(err, LlmError::Configuration(_)));
    }
}
