//! PDF processing: page text extraction and the OCR fallback.

mod acquire;
mod extractor;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use acquire::{acquire_text, PageText};
pub use extractor::PdfExtractor;

use std::path::Path;

use crate::error::DocumentReadError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, DocumentReadError>;

/// An input document: raw bytes plus the name it was submitted under.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a document from disk, named after the file.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
