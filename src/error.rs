//! Error types for the document merge library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the document merge library
///
/// Inside a merge most of these never reach the caller: a failure while
/// handling one input file is turned into a placeholder page instead.
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Office archive could not be opened
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Malformed WordprocessingML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Spreadsheet could not be read
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Image with a zero dimension
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// Office document could not be converted to HTML
    #[error("Conversion failed: {0}")]
    Conversion(String),

    /// HTML could not be rasterized
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Invalid page arrangement request
    #[error("Invalid page arrangement: {0}")]
    InvalidArrangement(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(quick_xml::Error::from(err))
    }
}
