//! Data models for extraction results and configuration.

pub mod config;
pub mod record;

pub use config::{ExtractionConfig, InvexConfig, OcrConfig, ServerConfig};
pub use record::{
    Amount, BaselineRecord, ExtractionResult, LineItem, ModelFailure, PipelineWarning,
    StructuredRecord, WarningKind,
};
