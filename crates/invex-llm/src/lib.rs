//! Language-model backends for invex.
//!
//! This crate provides a single interface for sending one extraction prompt to
//! interchangeable inference services:
//! - the Hugging Face Inference API
//! - OpenAI-compatible chat completion endpoints
//! - a local Ollama server
//!
//! Every backend normalizes its own response shape into a [`ModelResponse`],
//! so callers never see provider-specific payloads.

mod backend;
mod error;
mod request;
mod response;
mod settings;

pub use backend::huggingface::HuggingFaceBackend;
pub use backend::ollama::OllamaBackend;
pub use backend::openai::OpenAiBackend;
pub use backend::{create_backend, LlmBackend};
pub use error::LlmError;
pub use request::{GenerationParams, ModelRequest};
pub use response::{ErrorKind, ModelResponse};
pub use settings::{BackendKind, LlmSettings};

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, LlmError>;
