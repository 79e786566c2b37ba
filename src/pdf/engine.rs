//! PDF operation engine
//!
//! Stateless operations over the file store: every method reads inputs from
//! the uploads zone and writes freshly named outputs to the processed zone.
//! Methods are synchronous and CPU-bound; async callers should run them on
//! the blocking thread pool.

use std::path::PathBuf;
use std::sync::Arc;

use lopdf::{dictionary, Document, Object, ObjectId};

use super::compress;
use super::document::{self, load, materialized_page, page_ids, to_bytes};
use super::error::{EngineError, EngineResult};
use super::metadata::read_metadata;
use super::render::{encode_image, PageRasterizer, PlaceholderRasterizer};
use super::types::{
    compression_ratio, CompressionResult, ImageFormat, PageRange, PdfMetadata, Quality,
};
use crate::storage::{generate_filename, split_extension, FileStore, Zone};

/// Engine bound to a file store and a page rasterizer
#[derive(Clone)]
pub struct PdfEngine {
    store: FileStore,
    rasterizer: Arc<dyn PageRasterizer>,
}

impl PdfEngine {
    pub fn new(store: FileStore) -> Self {
        Self::with_rasterizer(store, Arc::new(PlaceholderRasterizer))
    }

    pub fn with_rasterizer(store: FileStore, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self { store, rasterizer }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    fn input_path(&self, name: &str) -> EngineResult<PathBuf> {
        self.store
            .resolve(Zone::Uploads, name)
            .ok_or_else(|| EngineError::FileNotFound(name.to_string()))
    }

    fn write_output(&self, stem: &str, ext: &str, bytes: &[u8]) -> EngineResult<String> {
        let filename = generate_filename(stem, ext);
        self.store.write_new(Zone::Processed, &filename, bytes)?;
        Ok(filename)
    }

    /// Concatenate every page of every input, in the given order, into one PDF.
    pub fn merge(&self, files: &[String]) -> EngineResult<String> {
        let _span = tracing::info_span!("pdf.merge", files = files.len()).entered();

        // Resolve every input before doing any work
        let paths = files
            .iter()
            .map(|name| self.input_path(name))
            .collect::<EngineResult<Vec<_>>>()?;

        let mut documents = Vec::with_capacity(files.len());
        for (name, path) in files.iter().zip(&paths) {
            documents.push((name.as_str(), load(path, name)?));
        }

        let mut merged = merge_documents(documents)?;
        let bytes = to_bytes(&mut merged)?;
        let output = self.write_output("merged", "pdf", &bytes)?;

        tracing::info!(
            inputs = files.len(),
            pages = merged.get_pages().len(),
            output = %output,
            "Merged PDFs"
        );
        Ok(output)
    }

    /// Write one single-page PDF per selected page, in ascending page order.
    pub fn split(&self, file: &str, range: Option<PageRange>) -> EngineResult<Vec<String>> {
        let _span = tracing::info_span!("pdf.split", file = %file).entered();

        let path = self.input_path(file)?;
        let doc = load(&path, file)?;
        let pages = page_ids(&doc, file)?;
        let total = pages.len() as u32;

        let range = range.unwrap_or_default();
        let selected = range.resolve(total).ok_or(EngineError::NoPagesSelected {
            start: range.start.unwrap_or(1),
            end: range.end.unwrap_or(total),
            total,
        })?;

        let (stem, _) = split_extension(file);
        let mut outputs = Vec::with_capacity(selected.clone().count());

        for page_number in selected {
            let mut single = single_page_document(&doc, pages[page_number as usize - 1])?;
            let bytes = to_bytes(&mut single)?;
            outputs.push(self.write_output(&format!("{}_page_{}", stem, page_number), "pdf", &bytes)?);
        }

        tracing::info!(file = %file, outputs = outputs.len(), "Split PDF");
        Ok(outputs)
    }

    /// Rasterize every page; pages that fail are skipped with a warning.
    pub fn convert_to_images(&self, file: &str, format: ImageFormat, dpi: u32) -> EngineResult<Vec<String>> {
        let _span = tracing::info_span!("pdf.convert_to_images", file = %file, format = format.name(), dpi).entered();

        let path = self.input_path(file)?;
        let doc = load(&path, file)?;
        let pages = page_ids(&doc, file)?;
        let (stem, _) = split_extension(file);
        let mut outputs = Vec::with_capacity(pages.len());

        for (index, page_id) in pages.into_iter().enumerate() {
            let page_number = index + 1;
            let converted = self
                .rasterizer
                .rasterize(&doc, page_id, dpi)
                .and_then(|image| encode_image(&image, format))
                .and_then(|bytes| {
                    self.write_output(&format!("{}_page_{}", stem, page_number), format.extension(), &bytes)
                });

            match converted {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    tracing::warn!(file = %file, page = page_number, error = %e, "Error converting page");
                }
            }
        }

        if outputs.is_empty() {
            return Err(EngineError::NoPagesConverted);
        }

        tracing::info!(file = %file, images = outputs.len(), "Converted PDF to images");
        Ok(outputs)
    }

    /// Page count, size, encryption flag and info fields of an uploaded PDF.
    pub fn extract_metadata(&self, file: &str) -> EngineResult<PdfMetadata> {
        let path = self.input_path(file)?;
        let file_size = std::fs::metadata(&path)?.len();
        let doc = load(&path, file)?;

        let metadata = read_metadata(&doc, file_size);
        tracing::info!(file = %file, pages = metadata.pages, "Extracted metadata");
        Ok(metadata)
    }

    /// Rewrite the document under the `quality` policy and report the size change.
    pub fn compress(&self, file: &str, quality: Quality) -> EngineResult<CompressionResult> {
        let _span = tracing::info_span!("pdf.compress", file = %file, quality = quality.name()).entered();

        let path = self.input_path(file)?;
        let original_size = std::fs::metadata(&path)?.len();
        let mut doc = load(&path, file)?;
        if document::is_encrypted(&doc) {
            tracing::warn!(file = %file, "Encrypted input will be written decrypted");
        }

        compress::apply(&mut doc, quality);
        let bytes = to_bytes(&mut doc)?;

        let (stem, _) = split_extension(file);
        let output_file = self.write_output(&format!("{}_compressed", stem), "pdf", &bytes)?;
        let compressed_size = bytes.len() as u64;
        let ratio = compression_ratio(original_size, compressed_size);

        tracing::info!(file = %file, output = %output_file, ratio = %format_args!("{:.1}%", ratio), "Compressed PDF");
        Ok(CompressionResult {
            output_file,
            original_size,
            compressed_size,
            compression_ratio: ratio,
        })
    }
}

/// Build one document holding every page of `documents`, in order.
///
/// Each input is renumbered into a disjoint id range. Page dictionaries get
/// their inherited attributes made explicit, then hang off a fresh page tree
/// and catalog; the inputs' own page-tree nodes and catalogs are dropped.
fn merge_documents(documents: Vec<(&str, Document)>) -> EngineResult<Document> {
    let mut merged = Document::with_version("1.5");
    let mut next_id = 1;
    let mut pages: Vec<(ObjectId, lopdf::Dictionary)> = Vec::new();

    for (name, mut doc) in documents {
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        for page_id in page_ids(&doc, name)? {
            pages.push((page_id, materialized_page(&doc, page_id)?));
        }

        for (id, object) in doc.objects {
            if !matches!(
                document::type_name(&object),
                Some(b"Page") | Some(b"Pages") | Some(b"Catalog")
            ) {
                merged.objects.insert(id, object);
            }
        }
    }

    merged.max_id = next_id;
    let pages_id = merged.new_object_id();

    let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();
    let count = pages.len() as i64;

    for (id, mut page) in pages {
        page.set("Parent", pages_id);
        merged.objects.insert(id, Object::Dictionary(page));
    }

    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);

    merged.prune_objects();
    merged.renumber_objects();
    merged.compress();

    Ok(merged)
}

/// Build a one-page document from `page_id` and the objects it references.
fn single_page_document(doc: &Document, page_id: ObjectId) -> EngineResult<Document> {
    let mut page = materialized_page(doc, page_id)?;
    page.remove(b"Parent");

    let mut single = Document::with_version(doc.version.clone());
    for id in document::page_dependencies(doc, &Object::Dictionary(page.clone())) {
        if id != page_id {
            single.objects.insert(id, doc.get_object(id)?.clone());
        }
    }

    single.max_id = doc.max_id;
    let pages_id = single.new_object_id();
    page.set("Parent", pages_id);
    single.objects.insert(page_id, Object::Dictionary(page));
    single.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let catalog_id = single.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    single.trailer.set("Root", catalog_id);

    single.renumber_objects();
    single.compress();

    Ok(single)
}
