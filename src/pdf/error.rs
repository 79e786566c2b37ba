//! PDF engine error types

use thiserror::Error;

/// Failure of a single engine operation
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input filename does not resolve inside the uploads zone
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Input could not be parsed as a PDF
    #[error("Invalid PDF '{name}': {reason}")]
    InvalidPdf { name: String, reason: String },

    /// Input parsed but has no pages
    #[error("PDF '{0}' contains no pages")]
    EmptyDocument(String),

    /// Requested page range lies outside the document
    #[error("Page range {start}-{end} selects no pages of a {total}-page document")]
    NoPagesSelected { start: u32, end: u32, total: u32 },

    /// Every page failed to rasterize
    #[error("No pages could be converted to images")]
    NoPagesConverted,

    /// lopdf failure while assembling or writing output
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    /// The blocking task running the operation panicked or was cancelled
    #[error("Processing task aborted: {0}")]
    Aborted(String),
}

/// Result type alias for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;
