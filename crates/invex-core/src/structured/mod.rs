//! Structured extraction through a language model.

mod prompt;
mod recover;

pub use prompt::{build_prompt, truncate_chars, TARGET_FIELDS, TEXT_BEGIN, TEXT_END};
pub use recover::{recover_json, JsonRecovery};

use invex_llm::{LlmBackend, ModelRequest, ModelResponse};
use tracing::info;

use crate::models::config::InvexConfig;

/// Ask `backend` for the structured record of `text`.
///
/// Exactly one backend call is made; failures come back inside the response.
pub fn request_structured(
    backend: &dyn LlmBackend,
    text: &str,
    config: &InvexConfig,
) -> ModelResponse {
    let prompt = build_prompt(text, config.extraction.max_prompt_chars);
    let request =
        ModelRequest::new(prompt, backend.kind()).with_params(config.llm.generation_params());

    info!(
        "Requesting structured extraction from {} ({} prompt chars)",
        backend.kind(),
        request.prompt.chars().count()
    );
    backend.submit(&request)
}
