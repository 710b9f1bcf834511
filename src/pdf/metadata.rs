//! PDF metadata extraction

use std::path::Path;

use lopdf::{Document, Object};

use crate::error::{Error, Result};

/// Count pages by reading the Count field from the Pages dictionary
/// This is more reliable than get_pages() which doesn't handle nested page trees
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let pages_id = doc
        .catalog()?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| Error::General("No Pages reference in catalog".to_string()))?;

    let count = doc
        .get_dictionary(pages_id)?
        .get(b"Count")
        .map_err(|_| Error::General("No Count in Pages".to_string()))?;

    match count {
        Object::Integer(n) if *n >= 0 => Ok(*n as usize),
        _ => Err(Error::General("Count is not a page count".to_string())),
    }
}

/// Text value from the document information dictionary
fn info_text(doc: &Document, key: &[u8]) -> Option<String> {
    let info_id = doc.trailer.get(b"Info").and_then(Object::as_reference).ok()?;
    let value = doc.get_dictionary(info_id).ok()?.get(key).ok()?;
    let bytes = value.as_str().ok()?;
    decode_text_string(bytes)
}

/// PDF text strings are either UTF-16BE with a byte order mark or PDFDocEncoding
fn decode_text_string(bytes: &[u8]) -> Option<String> {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units).ok();
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(text) => Some(text),
        // Latin-1 agrees with PDFDocEncoding for printable characters
        Err(_) => Some(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Producing application (if present)
    pub producer: Option<String>,
}

fn metadata_of(doc: &Document) -> Result<PdfMetadata> {
    // Use catalog-based counting for accuracy
    let page_count = count_pages_from_catalog(doc)?;

    Ok(PdfMetadata {
        page_count,
        title: info_text(doc, b"Title"),
        author: info_text(doc, b"Author"),
        producer: info_text(doc, b"Producer"),
    })
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    metadata_of(&doc)
}

/// Extract metadata from an in-memory PDF, such as a merge result
pub fn extract_metadata_from_bytes(bytes: &[u8]) -> Result<PdfMetadata> {
    let doc = Document::load_mem(bytes)?;
    metadata_of(&doc)
}

/// Count the number of pages in a PDF file
///
/// This is a quick operation that reads the Count field from the Pages dictionary.
pub fn count_pages(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    count_pages_from_catalog(&doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, StringFormat};

    fn pdf_with_info(info: lopdf::Dictionary) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0_i64.into(), 0_i64.into(), 100_i64.into(), 100_i64.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => 1_i64,
                "Kids" => vec![Object::Reference(page_id)],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", Object::Reference(info_id));

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_count_pages_nonexistent_file() {
        let result = count_pages(Path::new("nonexistent.pdf"));
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_extract_metadata_nonexistent_file() {
        let result = extract_metadata(Path::new("nonexistent.pdf"));
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_extract_metadata_from_bytes() {
        let bytes = pdf_with_info(dictionary! {
            "Title" => Object::string_literal("Quarterly Report"),
            "Author" => Object::String(
                vec![0xFE, 0xFF, 0x00, 0x4A, 0x00, 0xF6],
                StringFormat::Hexadecimal,
            ),
        });

        let meta = extract_metadata_from_bytes(&bytes).unwrap();
        assert_eq!(meta.page_count, 1);
        assert_eq!(meta.title.as_deref(), Some("Quarterly Report"));
        assert_eq!(meta.author.as_deref(), Some("Jö"));
        assert_eq!(meta.producer, None);
    }

    #[test]
    fn test_extract_metadata_from_garbage() {
        assert!(matches!(
            extract_metadata_from_bytes(b"not a pdf").unwrap_err(),
            Error::Pdf(_)
        ));
    }
}
