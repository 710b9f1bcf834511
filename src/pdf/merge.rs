//! Document merging using lopdf
//!
//! Every input becomes one or more pages of a single output PDF, in input
//! order. A file that cannot be handled never aborts the merge: it is
//! replaced by a placeholder page naming it.

use std::path::{Path, PathBuf};

use image::ImageFormat;
use lopdf::Document;
use tracing::{debug, info, warn};

use crate::convert::{CalamineConverter, DocxConverter, SpreadsheetConverter, WordConverter};
use crate::error::{Error, Result};
use crate::input::{InputFile, InputKind};
use crate::layout::PageDimensions;
use crate::pdf::compose::OutputDocument;
use crate::pdf::image::RasterImage;
use crate::render::{CommandRasterizer, HtmlRasterizer, RasterOptions, RenderSurface};

/// Options for merging documents
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// Size of pages generated for images, rendered documents and placeholders
    pub page: PageDimensions,
    /// Layout and scale used when rasterizing converted Office documents
    pub raster: RasterOptions,
}

/// What happened to one input file
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// Embedded as a single bitmap page
    Embedded,
    /// Donor PDF pages copied, with the number of pages
    Copied(usize),
    /// Replaced by a placeholder page carrying this notice
    Placeholder(String),
}

impl PageOutcome {
    /// Pages this file contributed to the output
    pub fn pages(&self) -> usize {
        match self {
            PageOutcome::Embedded | PageOutcome::Placeholder(_) => 1,
            PageOutcome::Copied(n) => *n,
        }
    }
}

/// Per-file entry of a merge result
#[derive(Debug, Clone)]
pub struct FileReport {
    pub name: String,
    pub kind: InputKind,
    pub outcome: PageOutcome,
}

/// The merged PDF and what happened to each input, in input order
#[derive(Debug, Clone)]
pub struct MergeResult {
    pub bytes: Vec<u8>,
    pub files: Vec<FileReport>,
}

impl MergeResult {
    /// Total number of pages in the output
    pub fn page_count(&self) -> usize {
        self.files.iter().map(|f| f.outcome.pages()).sum()
    }

    /// Files that ended up as placeholder pages
    pub fn placeholders(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, PageOutcome::Placeholder(_)))
    }
}

/// A file that could not be handled, with the notice for its placeholder page
struct Placeholder {
    notice: String,
    cause: Option<Error>,
}

impl Placeholder {
    fn new(notice: String) -> Self {
        Self { notice, cause: None }
    }

    fn caused_by(notice: String, cause: Error) -> Self {
        Self {
            notice,
            cause: Some(cause),
        }
    }
}

/// Merges images, PDFs and Office documents into one PDF
///
/// Conversion and rendering are delegated to the configured collaborators.
/// The defaults are [`DocxConverter`], [`CalamineConverter`] and
/// [`CommandRasterizer`].
///
/// # Example
///
/// ```no_run
/// use doc_merge::pdf::{DocumentMerger, MergeOptions};
/// use std::path::PathBuf;
///
/// let merger = DocumentMerger::new(MergeOptions::default());
/// let inputs = vec![PathBuf::from("cover.png"), PathBuf::from("report.pdf")];
///
/// let result = merger
///     .merge_paths(&inputs, &PathBuf::from("merged.pdf"), |name| println!("{}", name))
///     .expect("Failed to merge");
/// println!("{} pages", result.page_count());
/// ```
pub struct DocumentMerger {
    options: MergeOptions,
    word: Box<dyn WordConverter>,
    spreadsheet: Box<dyn SpreadsheetConverter>,
    rasterizer: Box<dyn HtmlRasterizer>,
}

impl DocumentMerger {
    pub fn new(options: MergeOptions) -> Self {
        Self {
            options,
            word: Box::new(DocxConverter::new()),
            spreadsheet: Box::new(CalamineConverter::new()),
            rasterizer: Box::new(CommandRasterizer::default()),
        }
    }

    pub fn with_word_converter(mut self, converter: impl WordConverter + 'static) -> Self {
        self.word = Box::new(converter);
        self
    }

    pub fn with_spreadsheet_converter(
        mut self,
        converter: impl SpreadsheetConverter + 'static,
    ) -> Self {
        self.spreadsheet = Box::new(converter);
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: impl HtmlRasterizer + 'static) -> Self {
        self.rasterizer = Box::new(rasterizer);
        self
    }

    /// Merge `files` into one PDF, in order
    ///
    /// `progress` is called with each file name right before that file is
    /// processed. Fails only when the output document itself cannot be built.
    pub fn merge<F>(&self, files: &[InputFile], mut progress: F) -> Result<MergeResult>
    where
        F: FnMut(&str),
    {
        info!("Merging {} files", files.len());

        let mut output = OutputDocument::new(self.options.page);
        let mut reports = Vec::with_capacity(files.len());

        for file in files {
            progress(&file.name);

            let kind = file.kind();
            debug!(
                "Processing {} ({}, {} bytes, {})",
                file.name, file.media_type, file.size, kind
            );

            let outcome = match self.process(&mut output, file, kind) {
                Ok(outcome) => outcome,
                Err(placeholder) => {
                    match &placeholder.cause {
                        Some(cause) => warn!("{} ({})", placeholder.notice, cause),
                        None => warn!("{}", placeholder.notice),
                    }
                    output.add_notice_page(&placeholder.notice)?;
                    PageOutcome::Placeholder(placeholder.notice)
                }
            };

            reports.push(FileReport {
                name: file.name.clone(),
                kind,
                outcome,
            });
        }

        let page_count = output.page_count();
        let bytes = output.finish()?;
        info!("Merged {} files into {} pages", reports.len(), page_count);

        Ok(MergeResult {
            bytes,
            files: reports,
        })
    }

    /// Read `inputs` from disk, merge them and write the result to `output_path`
    pub fn merge_paths<F>(
        &self,
        inputs: &[PathBuf],
        output_path: &Path,
        progress: F,
    ) -> Result<MergeResult>
    where
        F: FnMut(&str),
    {
        if inputs.is_empty() {
            return Err(Error::General("No input files provided".to_string()));
        }

        // Validate all input files exist
        for path in inputs {
            if !path.exists() {
                return Err(Error::FileNotFound(path.clone()));
            }
        }

        let files = inputs
            .iter()
            .map(|path| InputFile::from_path(path))
            .collect::<Result<Vec<_>>>()?;

        let result = self.merge(&files, progress)?;
        std::fs::write(output_path, &result.bytes)?;

        Ok(result)
    }

    fn process(
        &self,
        output: &mut OutputDocument,
        file: &InputFile,
        kind: InputKind,
    ) -> std::result::Result<PageOutcome, Placeholder> {
        match kind {
            InputKind::Png => self.embed_image(output, file, ImageFormat::Png),
            InputKind::Jpeg => self.embed_image(output, file, ImageFormat::Jpeg),
            InputKind::OtherImage => Err(Placeholder::new(format!(
                "Unsupported image type: {}",
                file.name
            ))),
            InputKind::Pdf => self.copy_pages(output, file),
            InputKind::Word => {
                let html = self.word.to_html(&file.bytes).map_err(|e| {
                    Placeholder::caused_by(format!("Could not convert document: {}", file.name), e)
                })?;
                self.embed_html(output, file, &html)
            }
            InputKind::Spreadsheet => {
                let html = self.spreadsheet.first_sheet_to_html(&file.bytes).map_err(|e| {
                    Placeholder::caused_by(
                        format!("Could not convert spreadsheet: {}", file.name),
                        e,
                    )
                })?;
                self.embed_html(output, file, &html)
            }
            InputKind::Unsupported => Err(Placeholder::new(format!(
                "Unsupported file type: {}",
                file.name
            ))),
        }
    }

    fn embed_image(
        &self,
        output: &mut OutputDocument,
        file: &InputFile,
        format: ImageFormat,
    ) -> std::result::Result<PageOutcome, Placeholder> {
        let failed = |e: Error| Placeholder::caused_by(format!("Could not load image: {}", file.name), e);

        let image = RasterImage::decode(&file.bytes, format).map_err(failed)?;
        output.add_image_page(&image).map_err(failed)?;
        Ok(PageOutcome::Embedded)
    }

    fn copy_pages(
        &self,
        output: &mut OutputDocument,
        file: &InputFile,
    ) -> std::result::Result<PageOutcome, Placeholder> {
        let failed = |e: Error| Placeholder::caused_by(format!("Could not load PDF: {}", file.name), e);

        let donor = Document::load_mem(&file.bytes)
            .map_err(Error::from)
            .map_err(failed)?;
        let copied = output.append_document(donor).map_err(failed)?;

        if copied == 0 {
            warn!("{} has no pages", file.name);
        }
        Ok(PageOutcome::Copied(copied))
    }

    /// Lay out converted HTML on a fresh surface, rasterize it and embed the bitmap
    fn embed_html(
        &self,
        output: &mut OutputDocument,
        file: &InputFile,
        html: &str,
    ) -> std::result::Result<PageOutcome, Placeholder> {
        let failed =
            |e: Error| Placeholder::caused_by(format!("Could not render document: {}", file.name), e);
        let raster = &self.options.raster;

        let bitmap = {
            let surface = RenderSurface::prepare(html, raster).map_err(failed)?;
            self.rasterizer.render(&surface, raster).map_err(failed)?
        };

        let image = RasterImage::from_rgba_image(bitmap).map_err(failed)?;
        output.add_image_page(&image).map_err(failed)?;
        Ok(PageOutcome::Embedded)
    }
}
