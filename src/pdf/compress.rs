//! Document rewrite policies used by compression
//!
//! Every level merges byte-identical stream objects, prunes unreferenced
//! objects and flate-encodes unfiltered streams. On top of that:
//!
//! - `high`: nothing else
//! - `medium`: also merges identical dictionary and array objects
//! - `low`: `medium` plus removal of page thumbnails and catalog XMP metadata

use std::collections::HashMap;

use lopdf::{Document, Object, ObjectId};
use sha2::{Digest, Sha256};

use super::document::type_name;
use super::types::Quality;

/// Rewrite `doc` in place according to `quality`
pub(crate) fn apply(doc: &mut Document, quality: Quality) {
    if quality == Quality::Low {
        let stripped = strip_auxiliary_data(doc);
        tracing::debug!(stripped, "Removed thumbnails and XMP metadata");
    }

    let merged = deduplicate_streams(doc);
    tracing::debug!(merged, "Merged identical streams");

    if quality != Quality::High {
        let merged = deduplicate_dictionaries(doc);
        tracing::debug!(merged, "Merged identical dictionaries");
    }

    let pruned = doc.prune_objects();
    tracing::debug!(pruned = pruned.len(), "Pruned unreferenced objects");

    doc.renumber_objects();
    doc.compress();
}

/// Point every reference to a duplicate stream at its first occurrence and
/// drop the duplicates. Returns the number of streams removed.
pub(crate) fn deduplicate_streams(doc: &mut Document) -> usize {
    let replacements = find_duplicates(doc, |object| match object {
        Object::Stream(stream) => {
            let mut hasher = Sha256::new();
            hasher.update(format!("{:?}", stream.dict).as_bytes());
            hasher.update(&stream.content);
            Some(hasher.finalize().to_vec())
        }
        _ => None,
    });

    merge_duplicates(doc, replacements)
}

/// Same as [`deduplicate_streams`] for indirect dictionaries and arrays.
///
/// Page tree nodes and the catalog are never merged.
pub(crate) fn deduplicate_dictionaries(doc: &mut Document) -> usize {
    let replacements = find_duplicates(doc, |object| {
        if !matches!(object, Object::Dictionary(_) | Object::Array(_)) {
            return None;
        }
        if matches!(type_name(object), Some(b"Page") | Some(b"Pages") | Some(b"Catalog")) {
            return None;
        }
        Some(Sha256::digest(format!("{:?}", object).as_bytes()).to_vec())
    });

    merge_duplicates(doc, replacements)
}

/// Map each object whose digest was already seen to the first object with it
fn find_duplicates<F>(doc: &Document, digest: F) -> HashMap<ObjectId, ObjectId>
where
    F: Fn(&Object) -> Option<Vec<u8>>,
{
    let mut canonical: HashMap<Vec<u8>, ObjectId> = HashMap::new();
    let mut replacements = HashMap::new();

    for (id, object) in doc.objects.iter() {
        let Some(key) = digest(object) else {
            continue;
        };
        match canonical.get(&key) {
            Some(original) => {
                replacements.insert(*id, *original);
            }
            None => {
                canonical.insert(key, *id);
            }
        }
    }

    replacements
}

fn merge_duplicates(doc: &mut Document, replacements: HashMap<ObjectId, ObjectId>) -> usize {
    if replacements.is_empty() {
        return 0;
    }

    for object in doc.objects.values_mut() {
        replace_references(object, &replacements);
    }
    for (_, value) in doc.trailer.iter_mut() {
        replace_references(value, &replacements);
    }
    for duplicate in replacements.keys() {
        doc.objects.remove(duplicate);
    }

    replacements.len()
}

fn replace_references(object: &mut Object, replacements: &HashMap<ObjectId, ObjectId>) {
    match object {
        Object::Reference(id) => {
            if let Some(target) = replacements.get(id) {
                *id = *target;
            }
        }
        Object::Array(items) => {
            for item in items.iter_mut() {
                replace_references(item, replacements);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                replace_references(value, replacements);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                replace_references(value, replacements);
            }
        }
        _ => {}
    }
}

/// Remove `/Thumb` from every page and `/Metadata` from the catalog.
/// Returns the number of entries removed.
pub(crate) fn strip_auxiliary_data(doc: &mut Document) -> usize {
    let mut removed = 0;

    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    for page_id in pages {
        if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            removed += usize::from(page.remove(b"Thumb").is_some());
        }
    }

    if let Ok(root) = doc.trailer.get(b"Root").and_then(Object::as_reference) {
        if let Ok(catalog) = doc.get_object_mut(root).and_then(Object::as_dict_mut) {
            removed += usize::from(catalog.remove(b"Metadata").is_some());
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::{load_mem, page_ids, to_bytes};
    use crate::pdf::test_pdf;
    use lopdf::{dictionary, Stream};

    /// Two-page sample where each page also draws a byte-identical stream
    fn with_shared_streams() -> Document {
        let bytes = test_pdf::sample_pdf(2, None);
        let mut doc = load_mem(&bytes, "sample.pdf").unwrap();
        for page_id in page_ids(&doc, "sample.pdf").unwrap() {
            let shared = doc.add_object(Stream::new(dictionary! {}, b"0 0 m 10 10 l S".to_vec()));
            let page = doc.get_object_mut(page_id).and_then(Object::as_dict_mut).unwrap();
            let contents = page.get(b"Contents").unwrap().clone();
            page.set("Contents", vec![contents, shared.into()]);
        }
        doc
    }

    fn stream_count(doc: &Document) -> usize {
        doc.objects
            .values()
            .filter(|object| matches!(object, Object::Stream(_)))
            .count()
    }

    #[test]
    fn test_deduplicate_identical_streams() {
        let mut doc = with_shared_streams();
        let pages = page_ids(&doc, "sample.pdf").unwrap();

        let before = doc.objects.len();
        assert_eq!(deduplicate_streams(&mut doc), 1);
        assert_eq!(doc.objects.len(), before - 1);

        // Both pages now reference the same stream
        let second_streams: Vec<ObjectId> = pages
            .iter()
            .map(|id| {
                let page = doc.get_dictionary(*id).unwrap();
                let contents = page.get(b"Contents").unwrap().as_array().unwrap();
                contents[1].as_reference().unwrap()
            })
            .collect();
        assert_eq!(second_streams[0], second_streams[1]);

        // Output still loads with both pages
        let reloaded = load_mem(&to_bytes(&mut doc).unwrap(), "out.pdf").unwrap();
        assert_eq!(reloaded.get_pages().len(), 2);
    }

    #[test]
    fn test_deduplicate_identical_dictionaries() {
        let bytes = test_pdf::sample_pdf(1, None);
        let mut doc = load_mem(&bytes, "sample.pdf").unwrap();

        let first = doc.add_object(dictionary! { "Type" => "Font", "BaseFont" => "Courier" });
        let second = doc.add_object(dictionary! { "Type" => "Font", "BaseFont" => "Courier" });
        let holder = doc.add_object(Object::Array(vec![first.into(), second.into()]));

        assert_eq!(deduplicate_dictionaries(&mut doc), 1);
        assert!(doc.get_object(second).is_err());

        let refs = doc.get_object(holder).unwrap().as_array().unwrap();
        assert_eq!(refs[0].as_reference().unwrap(), first);
        assert_eq!(refs[1].as_reference().unwrap(), first);
        assert_eq!(page_ids(&doc, "sample.pdf").unwrap().len(), 1);
    }

    #[test]
    fn test_every_quality_merges_identical_streams() {
        for quality in Quality::ALL {
            let mut doc = with_shared_streams();
            assert_eq!(stream_count(&doc), 4);

            apply(&mut doc, quality);
            assert_eq!(stream_count(&doc), 3, "quality {}", quality.name());
        }
    }

    #[test]
    fn test_strip_auxiliary_data() {
        let bytes = test_pdf::sample_pdf(1, None);
        let mut doc = load_mem(&bytes, "sample.pdf").unwrap();
        let page_id = page_ids(&doc, "sample.pdf").unwrap()[0];

        let thumb = doc.add_object(Stream::new(dictionary! {}, vec![0u8; 64]));
        let xmp = doc.add_object(Stream::new(
            dictionary! { "Type" => "Metadata", "Subtype" => "XML" },
            b"<x:xmpmeta/>".to_vec(),
        ));
        doc.get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .unwrap()
            .set("Thumb", thumb);
        let root = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
        doc.get_object_mut(root)
            .and_then(Object::as_dict_mut)
            .unwrap()
            .set("Metadata", xmp);

        assert_eq!(strip_auxiliary_data(&mut doc), 2);
        assert!(!doc.get_dictionary(page_id).unwrap().has(b"Thumb"));

        let pruned = doc.prune_objects();
        assert!(pruned.contains(&thumb));
        assert!(pruned.contains(&xmp));
    }

    #[test]
    fn test_every_quality_keeps_pages() {
        for quality in Quality::ALL {
            let bytes = test_pdf::sample_pdf(3, Some("Quality"));
            let mut doc = load_mem(&bytes, "sample.pdf").unwrap();
            apply(&mut doc, quality);
            let reloaded = load_mem(&to_bytes(&mut doc).unwrap(), "out.pdf").unwrap();
            assert_eq!(reloaded.get_pages().len(), 3, "quality {}", quality.name());
        }
    }
}
