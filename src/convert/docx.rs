//! WordprocessingML (.docx) to HTML
//!
//! A .docx file is a zip archive; the body lives in `word/document.xml`.
//! Paragraphs, headings, bold/italic runs, line breaks, simple lists and
//! tables are kept. Everything else (images, fields, comments, section
//! properties) is dropped.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;
use zip::ZipArchive;

use crate::convert::WordConverter;
use crate::error::Result;

const DOCUMENT_PART: &str = "word/document.xml";

/// Built-in Word converter
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxConverter;

impl DocxConverter {
    pub fn new() -> Self {
        Self
    }
}

impl WordConverter for DocxConverter {
    fn to_html(&self, bytes: &[u8]) -> Result<String> {
        let xml = read_document_part(bytes)?;
        let html = document_xml_to_html(&xml)?;
        debug!("Converted {} bytes of WordprocessingML to {} bytes of HTML", xml.len(), html.len());
        Ok(html)
    }
}

fn read_document_part(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut part = archive.by_name(DOCUMENT_PART)?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Paragraph being collected until its closing tag
#[derive(Default)]
struct Paragraph {
    style: Option<String>,
    is_list_item: bool,
    html: String,
}

/// Formatting and text of the current run
#[derive(Default)]
struct Run {
    bold: bool,
    italic: bool,
    text: String,
}

impl Run {
    fn into_html(self) -> String {
        if self.text.is_empty() {
            return String::new();
        }
        let mut html = self.text;
        if self.italic {
            html = format!("<em>{}</em>", html);
        }
        if self.bold {
            html = format!("<strong>{}</strong>", html);
        }
        html
    }
}

/// Convert the XML of `word/document.xml` into an HTML fragment
///
/// Paragraphs inside text boxes (`w:txbxContent`) are written as blocks of
/// their own ahead of the paragraph that anchors them. Fallback markup
/// (`mc:Fallback`) repeats the preferred content and is skipped.
pub fn document_xml_to_html(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);

    let mut out = String::new();
    let mut paragraphs: Vec<Paragraph> = Vec::new();
    let mut runs: Vec<Run> = Vec::new();
    let mut in_text = false;
    let mut in_list = false;
    let mut fallback_depth = 0usize;

    loop {
        let event = reader.read_event()?;
        if fallback_depth > 0 {
            match &event {
                Event::Start(e) if e.name().as_ref() == b"mc:Fallback" => fallback_depth += 1,
                Event::End(e) if e.name().as_ref() == b"mc:Fallback" => fallback_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"mc:Fallback" => fallback_depth += 1,
                b"w:p" => paragraphs.push(Paragraph::default()),
                b"w:r" => runs.push(Run::default()),
                b"w:t" => in_text = true,
                b"w:tbl" => {
                    close_list(&mut out, &mut in_list);
                    out.push_str("<table>");
                }
                b"w:tr" => out.push_str("<tr>"),
                b"w:tc" => out.push_str("<td>"),
                other => apply_property(other, &e, &reader, paragraphs.last_mut(), runs.last_mut())?,
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:br" | b"w:cr" => {
                    if let Some(run) = runs.last_mut() {
                        run.text.push_str("<br />");
                    }
                }
                b"w:tab" => {
                    if let Some(run) = runs.last_mut() {
                        run.text.push('\t');
                    }
                }
                other => apply_property(other, &e, &reader, paragraphs.last_mut(), runs.last_mut())?,
            },
            Event::Text(t) => {
                if in_text {
                    if let Some(run) = runs.last_mut() {
                        let text = t.unescape()?;
                        run.text.push_str(&html_escape::encode_text(&text));
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:r" => {
                    if let (Some(finished), Some(paragraph)) = (runs.pop(), paragraphs.last_mut()) {
                        paragraph.html.push_str(&finished.into_html());
                    }
                }
                b"w:p" => {
                    if let Some(finished) = paragraphs.pop() {
                        write_paragraph(&mut out, finished, &mut in_list);
                    }
                }
                b"w:tbl" => out.push_str("</table>"),
                b"w:tr" => out.push_str("</tr>"),
                b"w:tc" => out.push_str("</td>"),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    close_list(&mut out, &mut in_list);
    Ok(out)
}

/// Record paragraph and run properties (`w:pStyle`, `w:numPr`, `w:b`, `w:i`)
fn apply_property(
    name: &[u8],
    element: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    paragraph: Option<&mut Paragraph>,
    run: Option<&mut Run>,
) -> Result<()> {
    match name {
        b"w:pStyle" => {
            if let (Some(paragraph), Some(value)) =
                (paragraph, attribute(element, "w:val", reader)?)
            {
                paragraph.style = Some(value);
            }
        }
        b"w:numPr" => {
            if let Some(paragraph) = paragraph {
                paragraph.is_list_item = true;
            }
        }
        b"w:b" => {
            if let Some(run) = run {
                run.bold = is_on(element, reader)?;
            }
        }
        b"w:i" => {
            if let Some(run) = run {
                run.italic = is_on(element, reader)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn attribute(element: &BytesStart<'_>, key: &str, reader: &Reader<&[u8]>) -> Result<Option<String>> {
    match element.try_get_attribute(key)? {
        Some(attr) => Ok(Some(attr.decode_and_unescape_value(reader)?.into_owned())),
        None => Ok(None),
    }
}

/// Toggle properties are on unless `w:val` says otherwise
fn is_on(element: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<bool> {
    Ok(!matches!(
        attribute(element, "w:val", reader)?.as_deref(),
        Some("0") | Some("false") | Some("off")
    ))
}

fn heading_tag(style: Option<&str>) -> &'static str {
    match style.map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("title") | Some("heading1") => "h1",
        Some("subtitle") | Some("heading2") => "h2",
        Some("heading3") => "h3",
        Some("heading4") => "h4",
        Some("heading5") => "h5",
        Some("heading6") => "h6",
        _ => "p",
    }
}

fn write_paragraph(out: &mut String, paragraph: Paragraph, in_list: &mut bool) {
    if paragraph.is_list_item {
        if !*in_list {
            out.push_str("<ul>");
            *in_list = true;
        }
        out.push_str(&format!("<li>{}</li>", paragraph.html));
        return;
    }

    close_list(out, in_list);

    // Empty paragraphs are spacing only
    if paragraph.html.trim().is_empty() {
        return;
    }

    let tag = heading_tag(paragraph.style.as_deref());
    out.push_str(&format!("<{tag}>{}</{tag}>", paragraph.html));
}

fn close_list(out: &mut String, in_list: &mut bool) {
    if *in_list {
        out.push_str("</ul>");
        *in_list = false;
    }
}
