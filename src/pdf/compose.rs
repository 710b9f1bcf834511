//! Incremental construction of the merged PDF using lopdf
//!
//! Pages are appended in call order. The page tree is a single flat `Pages`
//! node whose id is reserved up front, so every page can point at its parent
//! as soon as it is added.

use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::error::{Error, Result};
use crate::layout::{fit_centered, PageDimensions};
use crate::pdf::image::RasterImage;

/// Page attributes a page may inherit from its ancestors in the page tree
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

const NOTICE_FONT_SIZE: f64 = 14.0;
const NOTICE_MARGIN: f64 = 50.0;

/// The merged document being built
pub struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    font_id: Option<ObjectId>,
    page: PageDimensions,
}

impl OutputDocument {
    /// Start an empty document whose generated pages use `page` dimensions
    pub fn new(page: PageDimensions) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            font_id: None,
            page,
        }
    }

    /// Number of pages appended so far
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Append one page showing `image` scaled to fit and centred
    pub fn add_image_page(&mut self, image: &RasterImage) -> Result<ObjectId> {
        let placement = fit_centered(image.width, image.height, &self.page).ok_or(
            Error::EmptyImage {
                width: image.width,
                height: image.height,
            },
        )?;

        let image_id = image.add_to(&mut self.doc);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        real(placement.width),
                        real(0.0),
                        real(0.0),
                        real(placement.height),
                        real(placement.x),
                        real(placement.y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };

        let resources = dictionary! {
            "XObject" => dictionary! {
                "Im1" => Object::Reference(image_id),
            },
        };

        self.add_generated_page(content, resources)
    }

    /// Append a placeholder page carrying only `notice`
    pub fn add_notice_page(&mut self, notice: &str) -> Result<ObjectId> {
        let font_id = self.notice_font();
        let (_, page_height) = self.page.size_pt();
        let top = page_height - NOTICE_MARGIN - NOTICE_FONT_SIZE;

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), real(NOTICE_FONT_SIZE)]),
            Operation::new("Td", vec![real(NOTICE_MARGIN), real(top)]),
            Operation::new("Tj", vec![pdf_text(notice)]),
            Operation::new("ET", vec![]),
        ];

        // Helvetica cannot draw the whole notice; extraction and search use the exact text
        if !is_latin1(notice) {
            let actual = dictionary! { "ActualText" => unicode_text(notice) };
            operations.insert(0, Operation::new("BDC", vec![Object::Name(b"Span".to_vec()), actual.into()]));
            operations.push(Operation::new("EMC", vec![]));
        }

        let resources = dictionary! {
            "Font" => dictionary! {
                "F1" => Object::Reference(font_id),
            },
        };

        self.add_generated_page(Content { operations }, resources)
    }

    /// Copy every page of a donor document, in source order, onto the end
    ///
    /// Returns the number of pages copied. The donor's objects are renumbered
    /// above the current maximum id so nothing collides.
    pub fn append_document(&mut self, mut donor: Document) -> Result<usize> {
        // Renumber objects in the donor to avoid conflicts
        donor.renumber_objects_with(self.doc.max_id + 1);

        // BTreeMap keyed by page number, so values come out in source order
        let donor_pages: Vec<ObjectId> = donor.get_pages().into_values().collect();

        // Pages lose their old ancestors, so pull inherited attributes down first
        for &page_id in &donor_pages {
            materialize_inherited_attributes(&mut donor, page_id)?;
        }

        self.doc.max_id = self.doc.max_id.max(donor.max_id);
        self.doc.objects.extend(donor.objects);

        for &page_id in &donor_pages {
            let page = self.doc.get_dictionary_mut(page_id)?;
            page.set("Parent", Object::Reference(self.pages_id));
            self.page_ids.push(page_id);
        }

        Ok(donor_pages.len())
    }

    /// Write the page tree, catalog and info dictionary and serialise the document
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let kids: Vec<Object> = self
            .page_ids
            .iter()
            .map(|&id| Object::Reference(id))
            .collect();

        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => self.page_ids.len() as i64,
            "Kids" => kids,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(self.pages_id),
        });
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let info_id = self.doc.add_object(dictionary! {
            "Producer" => Object::string_literal(format!("doc-merge {}", env!("CARGO_PKG_VERSION"))),
            "CreationDate" => Object::string_literal(Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()),
        });
        self.doc.trailer.set("Info", Object::Reference(info_id));

        // Donor catalogs and page tree nodes are unreachable now
        self.doc.prune_objects();
        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc.save_to(&mut buffer)?;
        Ok(buffer)
    }

    fn add_generated_page(&mut self, content: Content, resources: Dictionary) -> Result<ObjectId> {
        let (width, height) = self.page.size_pt();
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.encode()?));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(self.pages_id),
            "MediaBox" => vec![real(0.0), real(0.0), real(width), real(height)],
            "Resources" => resources,
            "Contents" => Object::Reference(content_id),
        });

        self.page_ids.push(page_id);
        Ok(page_id)
    }

    /// Helvetica is one of the standard 14 fonts, so nothing needs embedding
    fn notice_font(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }

        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        self.font_id = Some(id);
        id
    }
}

/// Copy inheritable attributes from a page's ancestors onto the page itself
pub(crate) fn materialize_inherited_attributes(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut inherited: Vec<(&[u8], Object)> = Vec::new();
    {
        let page = doc.get_dictionary(page_id)?;
        let mut missing: Vec<&[u8]> = INHERITABLE_KEYS
            .iter()
            .copied()
            .filter(|key| !page.has(key))
            .collect();

        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut depth = 0;

        while let Some(parent_id) = parent {
            if missing.is_empty() || depth > 64 {
                break;
            }
            let Ok(node) = doc.get_dictionary(parent_id) else {
                break;
            };

            missing.retain(|key| match node.get(key) {
                Ok(value) => {
                    inherited.push((*key, value.clone()));
                    false
                }
                Err(_) => true,
            });

            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
        }
    }

    if inherited.is_empty() {
        return Ok(());
    }

    let page = doc.get_dictionary_mut(page_id)?;
    for (key, value) in inherited {
        page.set(key.to_vec(), value);
    }

    Ok(())
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn is_latin1(text: &str) -> bool {
    text.chars().all(|c| u32::from(c) <= 0xFF)
}

/// Literal string in WinAnsi-compatible bytes; characters outside Latin-1 become '?'
fn pdf_text(text: &str) -> Object {
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect();
    Object::String(bytes, StringFormat::Literal)
}

/// UTF-16BE text string with byte order mark
fn unicode_text(text: &str) -> Object {
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}
