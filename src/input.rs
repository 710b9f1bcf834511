//! Input files and their kind

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

const WORD_MEDIA_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
];

const SPREADSHEET_MEDIA_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
];

/// A file handed to the merge pipeline
///
/// The pipeline only reads it. `size` is the length of `bytes`.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl InputFile {
    /// Create an input file from in-memory content
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size: bytes.len() as u64,
            bytes,
            modified: None,
        }
    }

    /// Read an input file from disk, guessing its media type from the extension
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path)?;
        let modified = std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            name,
            media_type,
            size: bytes.len() as u64,
            bytes,
            modified,
        })
    }

    /// Lowercase file extension, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }

    /// Resolve how the pipeline should treat this file
    pub fn kind(&self) -> InputKind {
        InputKind::detect(&self.media_type, self.extension().as_deref())
    }
}

/// What the pipeline does with an input, decided once per file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Png,
    Jpeg,
    /// Any other `image/*` type; becomes a placeholder page
    OtherImage,
    Pdf,
    Word,
    Spreadsheet,
    Unsupported,
}

impl InputKind {
    /// Classify by declared media type, falling back to the extension for Office formats
    pub fn detect(media_type: &str, extension: Option<&str>) -> Self {
        let media_type = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match media_type.as_str() {
            "image/png" => return InputKind::Png,
            "image/jpeg" | "image/jpg" | "image/pjpeg" => return InputKind::Jpeg,
            "application/pdf" => return InputKind::Pdf,
            m if m.starts_with("image/") => return InputKind::OtherImage,
            m if WORD_MEDIA_TYPES.contains(&m) => return InputKind::Word,
            m if SPREADSHEET_MEDIA_TYPES.contains(&m) => return InputKind::Spreadsheet,
            _ => {}
        }

        match extension {
            Some("docx") | Some("doc") => InputKind::Word,
            Some("xlsx") | Some("xls") => InputKind::Spreadsheet,
            _ => InputKind::Unsupported,
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InputKind::Png => "PNG image",
            InputKind::Jpeg => "JPEG image",
            InputKind::OtherImage => "unsupported image",
            InputKind::Pdf => "PDF",
            InputKind::Word => "Word document",
            InputKind::Spreadsheet => "spreadsheet",
            InputKind::Unsupported => "unsupported file",
        };
        f.write_str(label)
    }
}
