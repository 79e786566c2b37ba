//! Generated PDFs for integration tests.

#![allow(dead_code)]

use lopdf::{
    dictionary, Document, EncryptionState, EncryptionVersion, Object, Permissions, Stream, StringFormat,
};

/// Build a PDF whose pages each show `Page N`.
///
/// Content streams are padded so a single page clears the minimum upload size.
pub fn sample_pdf(pages: usize, title: Option<&str>) -> Vec<u8> {
    serialize(&mut sample_document(pages, title))
}

/// [`sample_pdf`] encrypted with an owner password and an empty user password
pub fn encrypted_pdf(pages: usize, title: Option<&str>) -> Vec<u8> {
    let mut doc = sample_document(pages, title);
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(b"integration-id-1".to_vec(), StringFormat::Literal),
            Object::String(b"integration-id-2".to_vec(), StringFormat::Literal),
        ]),
    );

    let state = EncryptionState::try_from(EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner",
        user_password: "",
        key_length: 128,
        permissions: Permissions::all(),
    })
    .expect("Failed to build encryption state");
    doc.encrypt(&state).expect("Failed to encrypt test PDF");
    serialize(&mut doc)
}

fn sample_document(pages: usize, title: Option<&str>) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids: Vec<Object> = Vec::new();
    for number in 1..=pages {
        let mut content = format!("BT /F1 18 Tf 100 700 Td (Page {}) Tj ET\n", number);
        while content.len() < 1500 {
            content.push_str("% integration test padding\n");
        }
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
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
        });
        doc.trailer.set("Info", info_id);
    }

    doc
}

fn serialize(doc: &mut Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("Failed to serialize test PDF");
    buffer
}

/// `Page N` labels of a PDF, in page order
pub fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("Failed to parse PDF");
    doc.get_pages()
        .values()
        .map(|page_id| {
            let content = doc.get_page_content(*page_id).expect("page content");
            let text = String::from_utf8_lossy(&content).into_owned();
            let start = text.find("(Page ").expect("page label") + 1;
            let end = start + text[start..].find(')').expect("label end");
            text[start..end].to_string()
        })
        .collect()
}
