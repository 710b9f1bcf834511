//! Spreadsheet (.xlsx/.xls) to HTML using calamine
//!
//! Only the first sheet of the workbook is converted.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use tracing::debug;

use crate::convert::SpreadsheetConverter;
use crate::error::{Error, Result};

/// Built-in spreadsheet converter
#[derive(Debug, Default, Clone, Copy)]
pub struct CalamineConverter;

impl CalamineConverter {
    pub fn new() -> Self {
        Self
    }
}

impl SpreadsheetConverter for CalamineConverter {
    fn first_sheet_to_html(&self, bytes: &[u8]) -> Result<String> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        let first = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| Error::Conversion("workbook has no sheets".to_string()))?;

        let range = workbook.worksheet_range(&first)?;
        debug!("Converting sheet '{}' ({} rows)", first, range.height());

        Ok(range_to_html(&range))
    }
}

/// Render a cell range as an HTML table, one `<tr>` per row
pub fn range_to_html(range: &Range<Data>) -> String {
    let mut html = String::from("<table>");

    for row in range.rows() {
        html.push_str("<tr>");
        for cell in row {
            html.push_str("<td>");
            html.push_str(&html_escape::encode_text(&cell.to_string()));
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }

    html.push_str("</table>");
    html
}
