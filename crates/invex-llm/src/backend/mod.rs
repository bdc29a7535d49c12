//! Inference backend implementations.

pub mod huggingface;
pub mod ollama;
pub mod openai;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::settings::{BackendKind, LlmSettings};
use crate::{ModelRequest, ModelResponse, Result};

use huggingface::HuggingFaceBackend;
use ollama::OllamaBackend;
use openai::OpenAiBackend;

/// Longest slice of an error body kept in error details.
const MAX_ERROR_BODY: usize = 500;

/// Trait for language-model backends.
///
/// Implementations perform exactly one HTTP attempt per call and never retry.
pub trait LlmBackend: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Send the request and return the generated text.
    fn generate(&self, request: &ModelRequest) -> Result<String>;

    /// Send the request and fold any failure into the response envelope.
    fn submit(&self, request: &ModelRequest) -> ModelResponse {
        match self.generate(request) {
            Ok(text) => {
                debug!("{} returned {} characters", self.kind(), text.len());
                ModelResponse::text(text)
            }
            Err(e) => {
                warn!("{} backend failed: {}", self.kind(), e);
                ModelResponse::from(e)
            }
        }
    }
}

/// Build the backend selected in `settings`, or `None` when the model path is disabled.
pub fn create_backend(settings: &LlmSettings) -> Option<Box<dyn LlmBackend>> {
    match settings.backend {
        BackendKind::Disabled => None,
        BackendKind::HuggingFace => Some(Box::new(HuggingFaceBackend::new(settings.clone()))),
        BackendKind::OpenAi => Some(Box::new(OpenAiBackend::new(settings.clone()))),
        BackendKind::Ollama => Some(Box::new(OllamaBackend::new(settings.clone()))),
    }
}

/// POST a JSON body and return the raw response body of a 2xx reply.
pub(crate) fn post_json(
    settings: &LlmSettings,
    url: &str,
    bearer: Option<&str>,
    body: &Value,
) -> Result<String> {
    let client = Client::builder()
        .timeout(settings.timeout())
        .build()
        .map_err(|e| LlmError::Transport(e.to_string()))?;

    debug!("POST {} (timeout {}s)", url, settings.timeout().as_secs());

    let mut request = client.post(url).json(body);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }

    let timeout_secs = settings.timeout().as_secs();
    let response = request
        .send()
        .map_err(|e| LlmError::from_reqwest(e, timeout_secs))?;

    let status = response.status();
    let text = response
        .text()
        .map_err(|e| LlmError::from_reqwest(e, timeout_secs))?;

    if !status.is_success() {
        return Err(LlmError::Status {
            status: status.as_u16(),
            body: truncate(&text, MAX_ERROR_BODY),
        });
    }

    Ok(text)
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
