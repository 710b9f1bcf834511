//! Office document to HTML conversion
//!
//! The merge pipeline only needs an HTML fragment per document; how it is
//! produced sits behind these traits so tests can substitute fixed output.

pub mod docx;
pub mod sheet;

pub use docx::DocxConverter;
pub use sheet::CalamineConverter;

use crate::error::Result;

/// Turns a Word document into an HTML fragment
pub trait WordConverter {
    fn to_html(&self, bytes: &[u8]) -> Result<String>;
}

/// Turns the first sheet of a workbook into an HTML table
pub trait SpreadsheetConverter {
    fn first_sheet_to_html(&self, bytes: &[u8]) -> Result<String>;
}
