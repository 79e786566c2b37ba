//! lopdf helpers shared by the engine operations

use std::collections::BTreeSet;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};

use super::error::{EngineError, EngineResult};

/// Page attributes a page may inherit from its ancestors in the page tree
pub(crate) const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files
const MAX_TREE_DEPTH: usize = 64;

/// Load a PDF from disk, labelling parse failures with its filename
pub(crate) fn load(path: &Path, name: &str) -> EngineResult<Document> {
    Document::load(path).map_err(|e| EngineError::InvalidPdf {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Parse PDF bytes held in memory
pub(crate) fn load_mem(bytes: &[u8], name: &str) -> EngineResult<Document> {
    Document::load_mem(bytes).map_err(|e| EngineError::InvalidPdf {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Serialize a document to bytes
pub(crate) fn to_bytes(doc: &mut Document) -> EngineResult<Vec<u8>> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Whether the file on disk is encrypted.
///
/// lopdf decrypts on load and drops `/Encrypt` from the trailer, so a loaded
/// document only remembers this through its encryption state.
pub(crate) fn is_encrypted(doc: &Document) -> bool {
    doc.was_encrypted() || doc.is_encrypted()
}

/// Page object ids in page order, failing on an empty document
pub(crate) fn page_ids(doc: &Document, name: &str) -> EngineResult<Vec<ObjectId>> {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    if pages.is_empty() {
        return Err(EngineError::EmptyDocument(name.to_string()));
    }
    Ok(pages)
}

/// Look up `key` on a page, walking up the `Parent` chain if absent.
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }

    None
}

/// Copy of a page dictionary with every inheritable attribute made explicit
pub(crate) fn materialized_page(doc: &Document, page_id: ObjectId) -> EngineResult<Dictionary> {
    let mut page = doc.get_dictionary(page_id)?.clone();

    for key in INHERITABLE_ATTRIBUTES {
        if !page.has(key) {
            if let Some(value) = inherited_attribute(doc, page_id, key) {
                page.set(key.to_vec(), value);
            }
        }
    }

    Ok(page)
}

/// Ids of the objects `root` depends on, without following `Parent` links
/// or crossing into other page-tree nodes and catalogs.
pub(crate) fn page_dependencies(doc: &Document, root: &Object) -> BTreeSet<ObjectId> {
    let mut seen = BTreeSet::new();
    let mut pending = vec![root];

    while let Some(object) = pending.pop() {
        match object {
            Object::Reference(id) => {
                let Ok(target) = doc.get_object(*id) else {
                    continue;
                };
                if matches!(type_name(target), Some(b"Page") | Some(b"Pages") | Some(b"Catalog")) {
                    continue;
                }
                if seen.insert(*id) {
                    pending.push(target);
                }
            }
            Object::Array(items) => pending.extend(items.iter()),
            Object::Dictionary(dict) => pending.extend(
                dict.iter()
                    .filter(|(key, _)| key.as_slice() != b"Parent")
                    .map(|(_, value)| value),
            ),
            Object::Stream(stream) => pending.extend(stream.dict.iter().map(|(_, value)| value)),
            _ => {}
        }
    }

    seen
}

/// Width and height in points of a page's MediaBox
pub(crate) fn page_size(doc: &Document, page_id: ObjectId) -> Option<(f64, f64)> {
    let media_box = resolve(doc, &inherited_attribute(doc, page_id, b"MediaBox")?)?.clone();
    let values = media_box.as_array().ok()?;
    if values.len() != 4 {
        return None;
    }

    let coords: Vec<f64> = values
        .iter()
        .filter_map(|v| resolve(doc, v).and_then(number))
        .collect();
    if coords.len() != 4 {
        return None;
    }

    Some(((coords[2] - coords[0]).abs(), (coords[3] - coords[1]).abs()))
}

/// Follow a single indirect reference
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(*value as f64),
        _ => None,
    }
}

/// The `Type` name of a dictionary or stream object
pub(crate) fn type_name(object: &Object) -> Option<&[u8]> {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        Object::Stream(stream) => &stream.dict,
        _ => return None,
    };
    dict.get(b"Type").ok()?.as_name().ok()
}

/// Document information dictionary from the trailer, if any
pub(crate) fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Text value of an info-dictionary entry
pub(crate) fn text_value(doc: &Document, object: &Object) -> Option<String> {
    match resolve(doc, object)? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise UTF-8 or Latin-1)
pub(crate) fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
