//! Document metadata extraction

use lopdf::Document;

use super::document::{info_dictionary, is_encrypted, page_size, text_value};
use super::types::{PdfMetadata, NOT_AVAILABLE};

/// Read page count, first-page size, encryption flag and info fields.
pub(crate) fn read_metadata(doc: &Document, file_size: u64) -> PdfMetadata {
    let pages = doc.get_pages();
    let first_page_size = pages
        .values()
        .next()
        .and_then(|page_id| page_size(doc, *page_id));

    let info = info_dictionary(doc);
    let field = |key: &[u8]| -> String {
        info.and_then(|dict| dict.get(key).ok())
            .and_then(|value| text_value(doc, value))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    PdfMetadata {
        pages: pages.len(),
        file_size,
        title: field(b"Title"),
        author: field(b"Author"),
        subject: field(b"Subject"),
        creator: field(b"Creator"),
        producer: field(b"Producer"),
        creation_date: field(b"CreationDate"),
        modification_date: field(b"ModDate"),
        encrypted: is_encrypted(doc),
        page_width: first_page_size.map(|(width, _)| width),
        page_height: first_page_size.map(|(_, height)| height),
    }
}
