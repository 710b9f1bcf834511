//! Document Merge Library
//!
//! A cross-platform library for combining images, PDFs and Office documents
//! into a single PDF. This library provides functionality to:
//! - Merge PNG/JPEG images, PDFs, Word documents and spreadsheets in order
//! - Replace any file that cannot be handled with a placeholder page
//! - Reorder, drop and rotate the pages of a PDF
//! - Extract metadata (page counts, etc.)
//!
//! # Example
//!
//! ```no_run
//! use doc_merge::input::InputFile;
//! use doc_merge::pdf::{DocumentMerger, MergeOptions};
//! use std::path::Path;
//!
//! let files = vec![
//!     InputFile::from_path(Path::new("cover.png")).expect("Failed to read"),
//!     InputFile::from_path(Path::new("report.pdf")).expect("Failed to read"),
//! ];
//!
//! let merger = DocumentMerger::new(MergeOptions::default());
//! let result = merger
//!     .merge(&files, |name| eprintln!("Processing {}", name))
//!     .expect("Failed to merge");
//!
//! std::fs::write("merged.pdf", &result.bytes).expect("Failed to write");
//! ```

pub mod convert;
pub mod error;
pub mod input;
pub mod layout;
pub mod pdf;
pub mod render;

// Re-export commonly used items
pub use error::{Error, Result};
pub use input::{InputFile, InputKind};
pub use pdf::{DocumentMerger, MergeOptions, MergeResult};
