//! PDF manipulation module

pub mod arrange;
pub mod compose;
pub mod image;
pub mod merge;
pub mod metadata;

// Re-export commonly used items
pub use arrange::{arrange_pages, PageArrangement, Rotation};
pub use compose::OutputDocument;
pub use image::RasterImage;
pub use merge::{DocumentMerger, FileReport, MergeOptions, MergeResult, PageOutcome};
pub use metadata::{count_pages, extract_metadata, extract_metadata_from_bytes, PdfMetadata};
