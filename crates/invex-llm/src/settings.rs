//! Backend selection and transport settings.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::request::GenerationParams;

/// Which inference backend the pipeline talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Model path disabled; only the baseline record is produced.
    #[default]
    #[serde(rename = "none", alias = "disabled")]
    Disabled,
    /// Hugging Face Inference API.
    #[serde(rename = "huggingface", alias = "hf")]
    HuggingFace,
    /// OpenAI-compatible chat completions.
    #[serde(rename = "openai")]
    OpenAi,
    /// Local Ollama server.
    #[serde(rename = "ollama")]
    Ollama,
}

impl BackendKind {
    /// Environment variable holding this backend's credential, if it needs one.
    pub fn credential_env(&self) -> Option<&'static str> {
        match self {
            BackendKind::HuggingFace => Some("HUGGINGFACE_API_TOKEN"),
            BackendKind::OpenAi => Some("OPENAI_API_KEY"),
            BackendKind::Disabled | BackendKind::Ollama => None,
        }
    }

    /// Environment variable holding this backend's model identifier.
    pub fn model_env(&self) -> Option<&'static str> {
        match self {
            BackendKind::HuggingFace => Some("HF_MODEL"),
            BackendKind::OpenAi => Some("OPENAI_MODEL"),
            BackendKind::Ollama => Some("OLLAMA_MODEL"),
            BackendKind::Disabled => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            BackendKind::HuggingFace => "mistralai/Mistral-7B-Instruct-v0.2",
            BackendKind::OpenAi => "gpt-4o-mini",
            BackendKind::Ollama => "llama3",
            BackendKind::Disabled => "",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            BackendKind::HuggingFace => "https://api-inference.huggingface.co/models",
            BackendKind::OpenAi => "https://api.openai.com/v1",
            BackendKind::Ollama => "http://localhost:11434",
            BackendKind::Disabled => "",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Disabled => write!(f, "none"),
            BackendKind::HuggingFace => write!(f, "huggingface"),
            BackendKind::OpenAi => write!(f, "openai"),
            BackendKind::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "disabled" | "off" => Ok(BackendKind::Disabled),
            "huggingface" | "hf" => Ok(BackendKind::HuggingFace),
            "openai" => Ok(BackendKind::OpenAi),
            "ollama" => Ok(BackendKind::Ollama),
            other => Err(format!(
                "unknown backend '{}' (expected none, huggingface, openai or ollama)",
                other
            )),
        }
    }
}

/// Transport and generation settings for the selected backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Active backend.
    pub backend: BackendKind,

    /// Model identifier (backend default when unset).
    pub model: Option<String>,

    /// Credential for the backend. Never written to config files.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Override for the backend's base URL.
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum generated tokens.
    pub max_new_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Disabled,
            model: None,
            api_key: None,
            base_url: None,
            timeout_secs: 120,
            max_new_tokens: 512,
            temperature: 0.0,
        }
    }
}

impl LlmSettings {
    /// Settings for the given backend with everything else defaulted.
    pub fn for_backend(backend: BackendKind) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    pub fn model_id(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.backend.default_model())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.backend.default_base_url())
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_new_tokens: self.max_new_tokens,
            temperature: self.temperature,
        }
    }

    /// Credential, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}
