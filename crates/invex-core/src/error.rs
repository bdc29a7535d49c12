//! Error types for the invex-core library.

use thiserror::Error;

/// Main error type for the invex library.
#[derive(Error, Debug)]
pub enum InvexError {
    /// The document could not be read at all.
    #[error("document error: {0}")]
    Document(#[from] DocumentReadError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Fatal errors while reading a document.
#[derive(Error, Debug)]
pub enum DocumentReadError {
    /// Zero-byte input.
    #[error("document is empty")]
    Empty,

    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and the empty password does not open it.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// The page has no image that can be decoded for recognition.
    #[error("page {0} has no decodable image")]
    NoImage(u32),
}

/// Errors related to OCR processing. Reported per page as warnings, never fatal.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Result type for the invex library.
pub type Result<T> = std::result::Result<T, InvexError>;
