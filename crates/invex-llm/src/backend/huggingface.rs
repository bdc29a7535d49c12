//! Hugging Face Inference API backend.

use serde_json::{json, Value};
use tracing::debug;

use super::{post_json, LlmBackend};
use crate::error::LlmError;
use crate::settings::{BackendKind, LlmSettings};
use crate::{ModelRequest, Result};

/// Backend for `POST {base}/{model}` on the Hugging Face Inference API.
pub struct HuggingFaceBackend {
    settings: LlmSettings,
}

impl HuggingFaceBackend {
    pub fn new(settings: LlmSettings) -> Self {
        Self { settings }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.settings.base_url(), self.settings.model_id())
    }
}

impl LlmBackend for HuggingFaceBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::HuggingFace
    }

    fn generate(&self, request: &ModelRequest) -> Result<String> {
        let token = self.settings.api_key().ok_or_else(|| {
            LlmError::Configuration("HUGGINGFACE_API_TOKEN is not set".to_string())
        })?;

        let body = json!({
            "inputs": request.prompt,
            "parameters": {
                "max_new_tokens": request.params.max_new_tokens,
                "temperature": request.params.temperature,
                "return_full_text": false,
            },
            "options": { "wait_for_model": true },
        });

        let endpoint = self.endpoint();
        debug!("Calling Hugging Face model {}", self.settings.model_id());

        let raw = post_json(&self.settings, &endpoint, Some(token), &body)?;
        Ok(normalize(&raw))
    }
}

/// Reduce an Inference API body to text.
///
/// Accepts `[{"generated_text": ..}]`, `{"generated_text": ..}`, any other JSON
/// (re-serialized) or a non-JSON body (returned as is).
pub(crate) fn normalize(body: &str) -> String {
    let Ok(data) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };

    let generated = match &data {
        Value::Array(items) => items.first().and_then(|first| first.get("generated_text")),
        Value::Object(map) => map.get("generated_text"),
        _ => None,
    };

    match generated.and_then(Value::as_str) {
        Some(text) => text.to_string(),
        None => data.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{closed_port, serve_once};
    use super::*;
    use crate::{ErrorKind, ModelResponse};
    use pretty_assertions::assert_eq;

    fn backend(base_url: String, token: Option<&str>) -> HuggingFaceBackend {
        let mut settings = LlmSettings::for_backend(BackendKind::HuggingFace);
        settings.base_url = Some(base_url);
        settings.api_key = token.map(str::to_string);
        settings.timeout_secs = 5;
        HuggingFaceBackend::new(settings)
    }

    #[test]
    fn test_normalize_generation_list() {
        assert_eq!(normalize(r#"[{"generated_text":"{\"a\":1}"}]"#), r#"{"a":1}"#);
    }

    #[test]
    fn test_normalize_single_object() {
        assert_eq!(normalize(r#"{"generated_text":"done"}"#), "done");
    }

    #[test]
    fn test_normalize_other_json_is_reserialized() {
        assert_eq!(normalize(r#"{"summary": "x"}"#), r#"{"summary":"x"}"#);
        assert_eq!(normalize("[]"), "[]");
    }

    #[test]
    fn test_normalize_plain_text() {
        assert_eq!(normalize("plain words"), "plain words");
    }

    #[test]
    fn test_missing_token_fails_before_network() {
        // Nothing listens here; a network attempt would surface as InferenceError.
        let response = backend(closed_port(), None).submit(&ModelRequest::new(
            "prompt",
            BackendKind::HuggingFace,
        ));

        match response {
            ModelResponse::Error { error, detail } => {
                assert_eq!(error, ErrorKind::ConfigurationError);
                assert!(detail.contains("HUGGINGFACE_API_TOKEN"));
            }
            ModelResponse::Text { .. } => panic!("expected configuration error"),
        }
    }

    #[test]
    fn test_generate_against_local_server() {
        let base = serve_once(200, r#"[{"generated_text":"{\"invoice_number\":\"INV-7\"}"}]"#);
        let response = backend(base, Some("hf_test"))
            .submit(&ModelRequest::new("prompt", BackendKind::HuggingFace));

        assert_eq!(response, ModelResponse::text(r#"{"invoice_number":"INV-7"}"#));
    }

    #[test]
    fn test_unreachable_backend_is_inference_error() {
        let response = backend(closed_port(), Some("hf_test"))
            .submit(&ModelRequest::new("prompt", BackendKind::HuggingFace));

        match response {
            ModelResponse::Error { error, .. } => assert_eq!(error, ErrorKind::InferenceError),
            ModelResponse::Text { .. } => panic!("expected inference error"),
        }
    }
}
