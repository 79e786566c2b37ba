//! PDF operations over lopdf
//!
//! The engine reads inputs from the uploads zone of a [`FileStore`] and
//! writes uniquely named artifacts to the processed zone.
//!
//! [`FileStore`]: crate::storage::FileStore

mod compress;
mod document;
pub mod engine;
pub mod error;
mod metadata;
pub mod render;
pub mod types;

#[cfg(test)]
pub(crate) mod test_pdf;

pub use engine::PdfEngine;
pub use error::{EngineError, EngineResult};
pub use render::{encode_image, PageRasterizer, PlaceholderRasterizer};
pub use types::{
    compression_ratio, CompressionResult, ImageFormat, PageRange, PdfMetadata, Quality, DEFAULT_DPI,
    NOT_AVAILABLE,
};

/// Page count and encryption flag of PDF bytes, for upload validation
pub fn inspect(bytes: &[u8], name: &str) -> EngineResult<(usize, bool)> {
    let doc = document::load_mem(bytes, name)?;
    Ok((doc.get_pages().len(), document::is_encrypted(&doc)))
}
