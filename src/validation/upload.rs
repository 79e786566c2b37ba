//! Uploaded PDF screening

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::pdf;

/// Largest accepted upload (50 MiB)
pub const MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

/// Smallest accepted upload (1 KiB)
pub const MIN_FILE_SIZE: usize = 1024;

/// Facts established about an accepted upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidatedUpload {
    pub size: usize,
    pub pages: usize,
    pub encrypted: bool,
}

/// Check that an upload is a plausibly sized PDF with at least one page.
///
/// Checks run cheapest first: filename, extension, size, then a full parse.
/// Encrypted documents are accepted with a warning.
pub fn validate_pdf_upload(name: Option<&str>, bytes: &[u8]) -> Result<ValidatedUpload> {
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    if !name.to_ascii_lowercase().ends_with(".pdf") {
        return Err(AppError::InvalidInput("File must be a PDF".to_string()));
    }

    let size = bytes.len();
    if size > MAX_FILE_SIZE {
        return Err(AppError::InvalidInput(format!(
            "File too large. Maximum size: {}MB",
            MAX_FILE_SIZE / (1024 * 1024)
        )));
    }
    if size < MIN_FILE_SIZE {
        return Err(AppError::InvalidInput(format!(
            "File too small. Minimum size: {}B",
            MIN_FILE_SIZE
        )));
    }

    let (pages, encrypted) = pdf::inspect(bytes, name)
        .map_err(|e| AppError::InvalidInput(format!("Invalid PDF file: {}", e)))?;

    if pages == 0 {
        return Err(AppError::InvalidInput("PDF file contains no pages".to_string()));
    }

    if encrypted {
        tracing::warn!(file = %name, "Uploaded PDF is encrypted");
    }

    Ok(ValidatedUpload {
        size,
        pages,
        encrypted,
    })
}
