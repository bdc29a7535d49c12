//! Local Ollama backend.

use serde_json::{json, Value};

use super::{post_json, LlmBackend};
use crate::error::LlmError;
use crate::settings::{BackendKind, LlmSettings};
use crate::{ModelRequest, Result};

/// Backend for `POST {base}/api/generate` on an Ollama server. Needs no credentials.
pub struct OllamaBackend {
    settings: LlmSettings,
}

impl OllamaBackend {
    pub fn new(settings: LlmSettings) -> Self {
        Self { settings }
    }
}

impl LlmBackend for OllamaBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Ollama
    }

    fn generate(&self, request: &ModelRequest) -> Result<String> {
        let body = json!({
            "model": self.settings.model_id(),
            "prompt": request.prompt,
            "stream": false,
            "options": {
                "temperature": request.params.temperature,
                "num_predict": request.params.max_new_tokens,
            },
        });

        let endpoint = format!("{}/api/generate", self.settings.base_url());
        let raw = post_json(&self.settings, &endpoint, None, &body)?;
        normalize(&raw)
    }
}

pub(crate) fn normalize(body: &str) -> Result<String> {
    let data: Value = serde_json::from_str(body)
        .map_err(|e| LlmError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    data.get("response")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LlmError::MalformedResponse("missing 'response' field".to_string()))
}
