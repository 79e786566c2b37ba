//! Generated PDFs for unit tests

use std::path::Path;

use lopdf::{dictionary, Document, EncryptionState, EncryptionVersion, Object, Permissions, Stream, StringFormat};

/// Build a PDF with `pages` pages, each showing its page number.
///
/// MediaBox and Resources live on the page tree root so that consumers must
/// handle inheritance. Each content stream is padded so even a one-page file
/// clears the minimum upload size.
pub fn sample_pdf(pages: usize, title: Option<&str>) -> Vec<u8> {
    save(&mut sample_document(pages, title))
}

/// Same as [`sample_pdf`], RC4-encrypted with an empty user password
pub fn encrypted_pdf(pages: usize, title: Option<&str>) -> Vec<u8> {
    let mut doc = sample_document(pages, title);
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String((1..=16).collect(), StringFormat::Literal),
            Object::String((1..=16).rev().collect(), StringFormat::Literal),
        ]),
    );

    let version = EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner",
        user_password: "",
        key_length: 128,
        permissions: Permissions::all(),
    };
    let state = EncryptionState::try_from(version).unwrap();
    doc.encrypt(&state).unwrap();
    save(&mut doc)
}

fn save(doc: &mut Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn sample_document(pages: usize, title: Option<&str>) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages);
    for number in 1..=pages {
        let mut content = format!("BT /F1 24 Tf 72 720 Td (Page {}) Tj ET\n", number);
        while content.len() < 1200 {
            content.push_str("% sample page padding for minimum file size\n");
        }
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Author" => Object::string_literal("Test Suite"),
        });
        doc.trailer.set("Info", info_id);
    }

    doc
}

/// Write a sample PDF named `name` into `dir`
pub fn write_sample(dir: &Path, name: &str, pages: usize) {
    std::fs::write(dir.join(name), sample_pdf(pages, None)).unwrap();
}

/// Number of pages in a PDF on disk
pub fn page_count(path: &Path) -> usize {
    Document::load(path).unwrap().get_pages().len()
}

/// The `Page N` label drawn on each page, in page order
pub fn page_labels(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|page_id| {
            let content = doc.get_page_content(*page_id).unwrap();
            let text = String::from_utf8_lossy(&content);
            let start = text.find("(Page ").expect("page label") + 1;
            let end = start + text[start..].find(')').expect("label end");
            text[start..end].to_string()
        })
        .collect()
}
