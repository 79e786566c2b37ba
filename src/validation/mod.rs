//! Request validation
//!
//! Pure checks run before any job is created: uploaded file screening and
//! operation parameter parsing.

mod params;
mod upload;

pub use params::{validate_operation_params, OperationParams, MAX_DPI, MIN_DPI};
pub use upload::{validate_pdf_upload, ValidatedUpload, MAX_FILE_SIZE, MIN_FILE_SIZE};
