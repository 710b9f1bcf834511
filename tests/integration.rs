//! Integration tests for the document merge library

use std::cell::RefCell;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::rc::Rc;

use doc_merge::input::{InputFile, InputKind};
use doc_merge::layout::PageDimensions;
use doc_merge::pdf::{
    arrange_pages, count_pages, extract_metadata, extract_metadata_from_bytes, DocumentMerger,
    MergeOptions, PageArrangement, PageOutcome, Rotation,
};
use doc_merge::render::{HtmlRasterizer, RasterOptions, RenderSurface};
use doc_merge::{Error, Result};
use image::{ImageFormat, Rgba, RgbaImage};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Stands in for the headless renderer: a white bitmap the width of the container
#[derive(Clone, Default)]
struct WhitePageRasterizer {
    surfaces: Rc<RefCell<Vec<PathBuf>>>,
    documents: Rc<RefCell<Vec<String>>>,
    fail: bool,
}

impl HtmlRasterizer for WhitePageRasterizer {
    fn render(&self, surface: &RenderSurface, options: &RasterOptions) -> Result<RgbaImage> {
        assert!(surface.document_path().exists(), "document written before rendering");
        self.surfaces.borrow_mut().push(surface.root().to_path_buf());
        self.documents.borrow_mut().push(surface.html().to_string());

        if self.fail {
            return Err(Error::Render("renderer unavailable".to_string()));
        }
        Ok(RgbaImage::from_pixel(
            options.pixel_width(),
            2112,
            Rgba([255, 255, 255, 255]),
        ))
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255]))
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("Failed to encode PNG");
    bytes.into_inner()
}

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([30, 30, 200]),
    ))
    .write_to(&mut bytes, ImageFormat::Jpeg)
    .expect("Failed to encode JPEG");
    bytes.into_inner()
}

/// PDF with one page per label; each page shows its label
fn pdf_bytes(labels: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for label in labels {
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            format!("BT ({}) Tj ET", label).into_bytes(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0_i64.into(), 0_i64.into(), 612_i64.into(), 792_i64.into()],
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => labels.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to save PDF");
    bytes
}

fn docx_bytes(paragraph: &str) -> Vec<u8> {
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>"#,
        paragraph
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .expect("Failed to start zip entry");
    writer.write_all(xml.as_bytes()).expect("Failed to write zip entry");
    writer.finish().expect("Failed to finish zip").into_inner()
}

/// Workbook with one worksheet holding the given `<row>` elements
fn xlsx_bytes(rows: &str) -> Vec<u8> {
    let parts = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/></Types>"#.to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_string(),
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Totals" sheetId="1" r:id="rId1"/></sheets></workbook>"#.to_string(),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
        ),
        (
            "xl/worksheets/sheet1.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                rows
            ),
        ),
    ];

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        writer
            .start_file(name, SimpleFileOptions::default())
            .expect("Failed to start zip entry");
        writer.write_all(content.as_bytes()).expect("Failed to write zip entry");
    }
    writer.finish().expect("Failed to finish zip").into_inner()
}

fn page_texts(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("Output is not a valid PDF");
    doc.get_pages()
        .values()
        .map(|&id| {
            String::from_utf8_lossy(&doc.get_page_content(id).expect("Failed to read page"))
                .into_owned()
        })
        .collect()
}

fn merger(rasterizer: WhitePageRasterizer) -> DocumentMerger {
    DocumentMerger::new(MergeOptions {
        page: PageDimensions::letter(),
        ..MergeOptions::default()
    })
    .with_rasterizer(rasterizer)
}

#[test]
fn test_image_and_pdf_merge_in_order() {
    let files = vec![
        InputFile::new("a.png", "image/png", png_bytes(500, 500)),
        InputFile::new("b.pdf", "application/pdf", pdf_bytes(&["donor one", "donor two"])),
    ];

    let result = merger(WhitePageRasterizer::default())
        .merge(&files, |_| {})
        .expect("Merge failed");

    assert_eq!(result.page_count(), 3);
    let texts = page_texts(&result.bytes);
    assert_eq!(texts.len(), 3);
    assert!(texts[0].contains("/Im1 Do"), "first page is the image");
    assert!(texts[1].contains("(donor one)"));
    assert!(texts[2].contains("(donor two)"));
}

#[test]
fn test_truncated_pdf_yields_single_placeholder() {
    let mut bad = pdf_bytes(&["lost"]);
    bad.truncate(40);

    let files = vec![InputFile::new("bad.pdf", "application/pdf", bad)];
    let result = merger(WhitePageRasterizer::default())
        .merge(&files, |_| {})
        .expect("Merge failed");

    let texts = page_texts(&result.bytes);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("Could not load PDF: bad.pdf"));
}

#[test]
fn test_page_count_sums_over_all_kinds() {
    let files = vec![
        InputFile::new("photo.jpg", "image/jpeg", jpeg_bytes(640, 480)),
        InputFile::new("three.pdf", "application/pdf", pdf_bytes(&["1", "2", "3"])),
        InputFile::new("anim.gif", "image/gif", b"GIF89a".to_vec()),
        InputFile::new("memo.docx", "application/msword", docx_bytes("Minutes")),
        InputFile::new("data.bin", "application/octet-stream", vec![0, 1, 2]),
    ];

    let result = merger(WhitePageRasterizer::default())
        .merge(&files, |_| {})
        .expect("Merge failed");

    let kinds: Vec<InputKind> = result.files.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![
            InputKind::Jpeg,
            InputKind::Pdf,
            InputKind::OtherImage,
            InputKind::Word,
            InputKind::Unsupported,
        ]
    );
    assert_eq!(result.page_count(), 1 + 3 + 1 + 1 + 1);
    assert_eq!(page_texts(&result.bytes).len(), 7);
    assert_eq!(result.placeholders().count(), 2);
}

#[test]
fn test_render_surface_removed_after_merge() {
    let rasterizer = WhitePageRasterizer::default();
    let surfaces = rasterizer.surfaces.clone();

    let files = vec![InputFile::new(
        "notes.docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        docx_bytes("Agenda"),
    )];
    let result = merger(rasterizer).merge(&files, |_| {}).expect("Merge failed");
    assert_eq!(result.files[0].outcome, PageOutcome::Embedded);

    let surfaces = surfaces.borrow();
    assert_eq!(surfaces.len(), 1);
    assert!(!surfaces[0].exists(), "surface should be cleaned up");
}

#[test]
fn test_render_failure_yields_placeholder_and_cleans_up() {
    let rasterizer = WhitePageRasterizer {
        fail: true,
        ..WhitePageRasterizer::default()
    };
    let surfaces = rasterizer.surfaces.clone();

    let files = vec![
        InputFile::new("notes.docx", "", docx_bytes("Agenda")),
        InputFile::new("after.png", "image/png", png_bytes(20, 10)),
    ];
    let result = merger(rasterizer).merge(&files, |_| {}).expect("Merge failed");

    assert_eq!(
        result.files[0].outcome,
        PageOutcome::Placeholder("Could not render document: notes.docx".to_string())
    );
    assert_eq!(result.files[1].outcome, PageOutcome::Embedded);
    assert!(!surfaces.borrow()[0].exists());

    let texts = page_texts(&result.bytes);
    assert!(texts[0].contains("Could not render document: notes.docx"));
}

#[test]
fn test_corrupt_word_document_is_not_rendered() {
    let rasterizer = WhitePageRasterizer::default();
    let surfaces = rasterizer.surfaces.clone();

    let files = vec![InputFile::new("broken.docx", "", b"PK not really".to_vec())];
    let result = merger(rasterizer).merge(&files, |_| {}).expect("Merge failed");

    assert_eq!(
        result.files[0].outcome,
        PageOutcome::Placeholder("Could not convert document: broken.docx".to_string())
    );
    assert!(surfaces.borrow().is_empty());
}

#[test]
fn test_progress_reports_every_file_in_order() {
    let files = vec![
        InputFile::new("first.pdf", "application/pdf", pdf_bytes(&["x"])),
        InputFile::new("second.png", "image/png", png_bytes(4, 4)),
        InputFile::new("third.txt", "text/plain", b"hi".to_vec()),
    ];

    let mut seen = Vec::new();
    merger(WhitePageRasterizer::default())
        .merge(&files, |name| seen.push(name.to_string()))
        .expect("Merge failed");

    assert_eq!(seen, vec!["first.pdf", "second.png", "third.txt"]);
}

#[test]
fn test_rerun_is_deterministic_in_structure() {
    let files = vec![
        InputFile::new("a.pdf", "application/pdf", pdf_bytes(&["a1", "a2"])),
        InputFile::new("b.png", "image/png", png_bytes(30, 60)),
        InputFile::new("c.pdf", "application/pdf", pdf_bytes(&["c1"])),
    ];
    let merger = merger(WhitePageRasterizer::default());

    let first = merger.merge(&files, |_| {}).expect("First merge failed");
    let second = merger.merge(&files, |_| {}).expect("Second merge failed");

    assert_eq!(first.page_count(), second.page_count());
    assert_eq!(page_texts(&first.bytes), page_texts(&second.bytes));
}

#[test]
fn test_merge_paths_writes_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    let cover = temp_dir.path().join("cover.png");
    std::fs::write(&cover, png_bytes(100, 50)).expect("Failed to write cover");
    let body = temp_dir.path().join("body.pdf");
    std::fs::write(&body, pdf_bytes(&["p1", "p2"])).expect("Failed to write body");
    let output = temp_dir.path().join("merged.pdf");

    let result = merger(WhitePageRasterizer::default())
        .merge_paths(&[cover, body], &output, |_| {})
        .expect("Merge failed");

    assert_eq!(result.files[0].kind, InputKind::Png);
    assert_eq!(count_pages(&output).expect("Failed to count pages"), 3);

    let metadata = extract_metadata(&output).expect("Failed to read metadata");
    assert!(metadata
        .producer
        .as_deref()
        .is_some_and(|p| p.starts_with("doc-merge")));
}

#[test]
fn test_merge_paths_missing_input() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let output = temp_dir.path().join("merged.pdf");

    let result = merger(WhitePageRasterizer::default()).merge_paths(
        &[temp_dir.path().join("missing.pdf")],
        &output,
        |_| {},
    );

    assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    assert!(!output.exists());
}

#[test]
fn test_arrange_merged_output() {
    let files = vec![
        InputFile::new("a.pdf", "application/pdf", pdf_bytes(&["one", "two", "three"])),
    ];
    let merged = merger(WhitePageRasterizer::default())
        .merge(&files, |_| {})
        .expect("Merge failed");

    let arrangement = [
        PageArrangement::rotated(3, Rotation::Clockwise90),
        PageArrangement::new(1),
    ];
    let arranged = arrange_pages(&merged.bytes, &arrangement).expect("Arrange failed");

    let texts = page_texts(&arranged);
    assert_eq!(texts.len(), 2);
    assert!(texts[0].contains("(three)"));
    assert!(texts[1].contains("(one)"));

    let doc = Document::load_mem(&arranged).expect("Invalid PDF");
    let first = doc
        .get_dictionary(doc.get_pages()[&1])
        .expect("Missing page");
    assert_eq!(first.get(b"Rotate").and_then(Object::as_i64).ok(), Some(90));

    let metadata = extract_metadata_from_bytes(&arranged).expect("Failed to read metadata");
    assert_eq!(metadata.page_count, 2);
}

#[test]
fn test_spreadsheets_convert_first_sheet_or_fall_back() {
    let xlsx_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
    let files = vec![
        InputFile::new("budget.xlsx", xlsx_type, b"not a workbook".to_vec()),
        InputFile::new(
            "totals.xlsx",
            xlsx_type,
            xlsx_bytes(r#"<row r="1"><c r="A1" t="inlineStr"><is><t>Item</t></is></c><c r="B1"><v>42</v></c></row>"#),
        ),
    ];

    let rasterizer = WhitePageRasterizer::default();
    let documents = rasterizer.documents.clone();
    let result = merger(rasterizer).merge(&files, |_| {}).expect("Merge failed");

    assert_eq!(
        result.files[0].outcome,
        PageOutcome::Placeholder("Could not convert spreadsheet: budget.xlsx".to_string())
    );
    assert_eq!(result.files[1].outcome, PageOutcome::Embedded);
    assert_eq!(result.placeholders().count(), 1);

    let texts = page_texts(&result.bytes);
    assert_eq!(texts.len(), 2);
    assert!(texts[0].contains("Could not convert spreadsheet: budget.xlsx"));
    assert!(texts[1].contains("/Im1 Do"));

    // Only the readable workbook reaches the renderer
    let documents = documents.borrow();
    assert_eq!(documents.len(), 1);
    assert!(documents[0].contains("<td>Item</td>"));
    assert!(documents[0].contains("<td>42</td>"));
}
