use pdfcrypt::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

#[allow(dead_code)]
pub const ALICE_CERT: &[u8] = include_bytes!("fixtures/alice.cer");
#[allow(dead_code)]
pub const ALICE_KEY: &[u8] = include_bytes!("fixtures/alice.pk8");
#[allow(dead_code)]
pub const BOB_CERT: &[u8] = include_bytes!("fixtures/bob.cer");
#[allow(dead_code)]
pub const BOB_KEY: &[u8] = include_bytes!("fixtures/bob.pk8");
#[allow(dead_code)]
pub const ECDSA_CERT: &[u8] = include_bytes!("fixtures/ecdsa.cer");

#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A one page document showing `text`. Returns the document and the id of the content stream.
#[allow(dead_code)]
pub fn one_page_document(version: &str, text: &str) -> (Document, ObjectId) {
    let mut doc = Document::with_version(version);
    doc.trailer.set(
        "ID",
        vec![
            Object::String(b"0123456789abcdef".to_vec(), StringFormat::Hexadecimal),
            Object::String(b"fedcba9876543210".to_vec(), StringFormat::Hexadecimal),
        ],
    );

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
    });
    doc.set_object(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        },
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal("pdfcrypt"),
    });
    doc.trailer.set("Info", info_id);

    (doc, content_id)
}

/// The text shown by the first `Tj` operator of a content stream.
#[allow(dead_code)]
pub fn shown_text(doc: &Document, content_id: ObjectId) -> String {
    let content = &doc.get_object(content_id).unwrap().as_stream().unwrap().content;
    let content = String::from_utf8_lossy(content);
    let start = content.find('(').map(|i| i + 1).unwrap_or(0);
    let end = content.rfind(") Tj").unwrap_or(content.len());
    content[start..end].to_string()
}
