//! Core library for invoice field extraction.
//!
//! This crate provides:
//! - PDF text acquisition with an OCR fallback for scanned pages
//! - Deterministic pattern-based extraction of the baseline invoice fields
//! - Prompt construction and JSON recovery for the language-model path
//! - The pipeline that reconciles both paths into one [`ExtractionResult`]

pub mod error;
pub mod invoice;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod structured;
pub mod upload;

pub use error::{DocumentReadError, InvexError, OcrError, Result};
pub use invoice::{extract_baseline, extract_line_items, BaselineExtractor};
pub use models::config::{ExtractionConfig, InvexConfig, OcrConfig, ServerConfig};
pub use models::record::{
    Amount, BaselineRecord, ExtractionResult, LineItem, ModelFailure, PipelineWarning,
    StructuredRecord, WarningKind,
};
pub use ocr::{load_recognizer, PageRecognizer};
#[cfg(feature = "onnx-ocr")]
pub use ocr::PureOcrEngine;
pub use pdf::{acquire_text, Document, PageText, PdfExtractor};
pub use pipeline::{reconcile, Pipeline};
pub use structured::{build_prompt, recover_json, request_structured, JsonRecovery};
pub use upload::ScratchUpload;

/// Re-export backend types.
pub use invex_llm::{
    create_backend, BackendKind, ErrorKind, LlmBackend, LlmSettings, ModelRequest, ModelResponse,
};
