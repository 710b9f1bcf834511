//! Page arrangement: reorder, drop and rotate pages of an existing PDF

use std::collections::HashSet;

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::{Error, Result};
use crate::pdf::compose::materialize_inherited_attributes;

/// Extra clockwise rotation applied on top of a page's own `/Rotate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Rotate180,
    Clockwise270,
}

impl Rotation {
    /// Parse a rotation from degrees; negative values count counter-clockwise
    pub fn from_degrees(degrees: i64) -> Result<Self> {
        match degrees.rem_euclid(360) {
            0 => Ok(Self::None),
            90 => Ok(Self::Clockwise90),
            180 => Ok(Self::Rotate180),
            270 => Ok(Self::Clockwise270),
            _ => Err(Error::InvalidArrangement(format!(
                "Invalid rotation: {}. Must be a multiple of 90",
                degrees
            ))),
        }
    }

    /// Get rotation as degrees
    pub fn as_degrees(&self) -> i64 {
        match self {
            Self::None => 0,
            Self::Clockwise90 => 90,
            Self::Rotate180 => 180,
            Self::Clockwise270 => 270,
        }
    }
}

/// One page of the arranged output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageArrangement {
    /// 1-based page number in the source document
    pub source_page: u32,
    pub rotation: Rotation,
}

impl PageArrangement {
    pub fn new(source_page: u32) -> Self {
        Self {
            source_page,
            rotation: Rotation::None,
        }
    }

    pub fn rotated(source_page: u32, rotation: Rotation) -> Self {
        Self {
            source_page,
            rotation,
        }
    }

    /// Build an arrangement from an optional page order plus per-page rotations
    ///
    /// Without an order every page is kept in source order. A rotation for a
    /// page that is not kept is an error.
    pub fn plan(
        page_count: usize,
        order: Option<&[u32]>,
        rotations: &[(u32, Rotation)],
    ) -> Result<Vec<Self>> {
        let mut arrangement: Vec<Self> = match order {
            Some(order) => order.iter().map(|&page| Self::new(page)).collect(),
            None => (1..=page_count as u32).map(Self::new).collect(),
        };

        for &(page, rotation) in rotations {
            let entry = arrangement
                .iter_mut()
                .find(|a| a.source_page == page)
                .ok_or_else(|| {
                    Error::InvalidArrangement(format!(
                        "Cannot rotate page {}: it is not part of the output",
                        page
                    ))
                })?;
            entry.rotation = rotation;
        }

        Ok(arrangement)
    }
}

/// Parse a page order such as `3,1,2` or `4-6,1`
///
/// Ranges expand in the order written, so `3-1` is rejected rather than reversed.
pub fn parse_page_order(s: &str) -> Result<Vec<u32>> {
    let mut pages = Vec::new();

    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start = parse_page_number(start)?;
            let end = parse_page_number(end)?;
            if start > end {
                return Err(Error::InvalidArrangement(format!(
                    "Invalid range {}-{}: start page must be less than or equal to end page",
                    start, end
                )));
            }
            pages.extend(start..=end);
        } else {
            pages.push(parse_page_number(part)?);
        }
    }

    if pages.is_empty() {
        return Err(Error::InvalidArrangement("Page order cannot be empty".to_string()));
    }

    Ok(pages)
}

/// Parse a `PAGE:DEGREES` rotation such as `2:90`
pub fn parse_page_rotation(s: &str) -> Result<(u32, Rotation)> {
    let (page, degrees) = s.split_once(':').ok_or_else(|| {
        Error::InvalidArrangement(format!("Invalid rotation '{}'. Expected PAGE:DEGREES", s))
    })?;

    let page = parse_page_number(page)?;
    let degrees: i64 = degrees.trim().parse().map_err(|_| {
        Error::InvalidArrangement(format!("Invalid rotation degrees: {}", degrees))
    })?;

    Ok((page, Rotation::from_degrees(degrees)?))
}

fn parse_page_number(s: &str) -> Result<u32> {
    let page: u32 = s
        .trim()
        .parse()
        .map_err(|_| Error::InvalidArrangement(format!("Invalid page number: {}", s.trim())))?;

    if page == 0 {
        return Err(Error::InvalidArrangement(
            "Page numbers must be positive (1-indexed)".to_string(),
        ));
    }
    Ok(page)
}

/// Rebuild a PDF with only the arranged pages, in arrangement order
pub fn arrange_pages(bytes: &[u8], arrangement: &[PageArrangement]) -> Result<Vec<u8>> {
    if arrangement.is_empty() {
        return Err(Error::InvalidArrangement(
            "At least one page must be kept".to_string(),
        ));
    }

    let mut doc = Document::load_mem(bytes)?;
    let pages = doc.get_pages();

    let mut seen = HashSet::new();
    let mut page_ids: Vec<(ObjectId, Rotation)> = Vec::with_capacity(arrangement.len());
    for entry in arrangement {
        let page_id = pages.get(&entry.source_page).copied().ok_or_else(|| {
            Error::InvalidArrangement(format!(
                "Page {} is out of range (document has {} pages)",
                entry.source_page,
                pages.len()
            ))
        })?;
        if !seen.insert(entry.source_page) {
            return Err(Error::InvalidArrangement(format!(
                "Page {} is listed more than once",
                entry.source_page
            )));
        }
        page_ids.push((page_id, entry.rotation));
    }

    let pages_id = doc
        .catalog()?
        .get(b"Pages")
        .and_then(Object::as_reference)?;

    // Nested page tree nodes are about to disappear
    for &(page_id, _) in &page_ids {
        materialize_inherited_attributes(&mut doc, page_id)?;
    }

    for &(page_id, rotation) in &page_ids {
        let page = doc.get_dictionary_mut(page_id)?;
        page.set("Parent", Object::Reference(pages_id));

        if rotation != Rotation::None {
            let current = page.get(b"Rotate").and_then(Object::as_i64).unwrap_or(0);
            page.set("Rotate", (current + rotation.as_degrees()).rem_euclid(360));
        }
    }

    let kids: Vec<Object> = page_ids
        .iter()
        .map(|&(id, _)| Object::Reference(id))
        .collect();
    let root = doc.get_dictionary_mut(pages_id)?;
    root.set("Kids", kids);
    root.set("Count", page_ids.len() as i64);

    // Dropped pages and their content are unreachable now
    doc.prune_objects();
    doc.compress();
    debug!("Arranged {} of {} pages", page_ids.len(), pages.len());

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}
