//! Request types sent to a backend.

use serde::{Deserialize, Serialize};

use crate::settings::BackendKind;

/// Generation parameters shared by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Upper bound on generated tokens.
    pub max_new_tokens: u32,
    /// Sampling temperature; 0 keeps output reproducible.
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 512,
            temperature: 0.0,
        }
    }
}

/// A single prompt addressed to one backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Complete instruction prompt, document text included.
    pub prompt: String,
    /// Generation parameters.
    pub params: GenerationParams,
    /// Backend the request is meant for.
    pub backend: BackendKind,
}

impl ModelRequest {
    /// Create a request with default generation parameters.
    pub fn new(prompt: impl Into<String>, backend: BackendKind) -> Self {
        Self {
            prompt: prompt.into(),
            params: GenerationParams::default(),
            backend,
        }
    }

    /// Override the generation parameters.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }
}
