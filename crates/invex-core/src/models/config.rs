//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use invex_llm::{BackendKind, LlmSettings};

use crate::error::InvexError;
use crate::structured::JsonRecovery;

/// Main configuration for the invex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvexConfig {
    /// Model backend configuration.
    pub llm: LlmSettings,

    /// Prompt and response handling.
    pub extraction: ExtractionConfig,

    /// OCR fallback configuration.
    pub ocr: OcrConfig,

    /// HTTP server configuration.
    pub server: ServerConfig,
}

/// Prompt construction and model-output recovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Document characters embedded in the prompt.
    pub max_prompt_chars: usize,

    /// How a JSON object is recovered from model output.
    pub json_recovery: JsonRecovery,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: 40_000,
            json_recovery: JsonRecovery::OuterBraces,
        }
    }
}

/// OCR fallback for pages without a text layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Run recognition on pages that have no text layer.
    pub enabled: bool,

    /// Directory containing `det.onnx`, `latin_rec.onnx` and `latin_dict.txt`.
    pub model_dir: PathBuf,

    /// Maximum pages sent to recognition per document (0 = unlimited).
    pub max_ocr_pages: usize,

    /// Maximum image dimension (longer side) passed to recognition.
    pub max_image_size: u32,

    /// Wall-clock recognition budget per document in seconds (0 = unlimited).
    pub time_budget_secs: u64,

    /// Keep `[UNK]` tokens in recognized text instead of replacing them with spaces.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_dir: PathBuf::from("models"),
            max_ocr_pages: 20,
            max_image_size: 2048,
            time_budget_secs: 120,
            keep_unk: false,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Scratch directory for uploaded documents.
    pub upload_dir: PathBuf,

    /// Largest accepted request body for `/extract`, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl InvexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file. Credentials are never written.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<(), InvexError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`. Blank values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), InvexError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(backend) = get("LLM_BACKEND") {
            self.llm.backend = BackendKind::from_str(&backend).map_err(InvexError::Config)?;
        }

        let backend = self.llm.backend;
        let model = get("LLM_MODEL").or_else(|| backend.model_env().and_then(|key| get(key)));
        if let Some(model) = model {
            self.llm.model = Some(model);
        }

        let api_key =
            get("LLM_API_KEY").or_else(|| backend.credential_env().and_then(|key| get(key)));
        if let Some(api_key) = api_key {
            self.llm.api_key = Some(api_key);
        }

        if let Some(base_url) = get("LLM_BASE_URL") {
            self.llm.base_url = Some(base_url);
        }
        if let Some(timeout) = get("LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_var("LLM_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(max_tokens) = get("LLM_MAX_TOKENS") {
            self.llm.max_new_tokens = parse_var("LLM_MAX_TOKENS", &max_tokens)?;
        }

        if let Some(dir) = get("OCR_MODEL_DIR") {
            self.ocr.model_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("UPLOAD_FOLDER") {
            self.server.upload_dir = PathBuf::from(dir);
        }
        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            self.server.port = parse_var("PORT", &port)?;
        }
        if let Some(limit) = get("MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", &limit)?;
        }

        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T, InvexError> {
    value
        .trim()
        .parse()
        .map_err(|_| InvexError::Config(format!("invalid value for {}: '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = InvexConfig::default();
        assert_eq!(config.llm.backend, BackendKind::Disabled);
        assert_eq!(config.llm.timeout_secs, 120);
        assert_eq!(config.extraction.max_prompt_chars, 40_000);
        assert_eq!(config.extraction.json_recovery, JsonRecovery::OuterBraces);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.server.max_upload_bytes, 52_428_800);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: InvexConfig =
            serde_json::from_str(r#"{"llm": {"backend": "ollama"}, "server": {"port": 8080}}"#)
                .unwrap();
        assert_eq!(config.llm.backend, BackendKind::Ollama);
        assert_eq!(config.llm.max_new_tokens, 512);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.ocr.enabled);
    }

    #[test]
    fn test_env_backend_specific_variables() {
        let mut config = InvexConfig::default();
        config
            .apply_env_with(env(&[
                ("LLM_BACKEND", "huggingface"),
                ("HUGGINGFACE_API_TOKEN", "hf_abc"),
                ("HF_MODEL", "org/model"),
                ("PORT", "7000"),
                ("MAX_UPLOAD_BYTES", "1048576"),
            ]))
            .unwrap();

        assert_eq!(config.llm.backend, BackendKind::HuggingFace);
        assert_eq!(config.llm.api_key.as_deref(), Some("hf_abc"));
        assert_eq!(config.llm.model_id(), "org/model");
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.max_upload_bytes, 1_048_576);
    }

    #[test]
    fn test_env_generic_variables_win() {
        let mut config = InvexConfig::default();
        config.llm.backend = BackendKind::OpenAi;
        config
            .apply_env_with(env(&[
                ("LLM_API_KEY", "generic"),
                ("OPENAI_API_KEY", "specific"),
                ("LLM_TIMEOUT_SECS", "30"),
            ]))
            .unwrap();

        assert_eq!(config.llm.api_key.as_deref(), Some("generic"));
        assert_eq!(config.llm.timeout_secs, 30);
    }

    #[test]
    fn test_env_blank_values_ignored() {
        let mut config = InvexConfig::default();
        config
            .apply_env_with(env(&[("LLM_BACKEND", "  "), ("UPLOAD_FOLDER", "")]))
            .unwrap();
        assert_eq!(config.llm.backend, BackendKind::Disabled);
        assert_eq!(config.server.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn test_env_invalid_values() {
        let mut config = InvexConfig::default();
        assert!(config.apply_env_with(env(&[("PORT", "http")])).is_err());
        assert!(config.apply_env_with(env(&[("MAX_UPLOAD_BYTES", "-5")])).is_err());
        assert!(config.apply_env_with(env(&[("LLM_BACKEND", "gemini")])).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = InvexConfig::default();
        config.llm.backend = BackendKind::OpenAi;
        config.llm.api_key = Some("sk-secret".to_string());
        config.ocr.max_ocr_pages = 3;
        config.save(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("sk-secret"));

        let loaded = InvexConfig::from_file(&path).unwrap();
        assert_eq!(loaded.llm.backend, BackendKind::OpenAi);
        assert_eq!(loaded.llm.api_key, None);
        assert_eq!(loaded.ocr.max_ocr_pages, 3);
    }
}
