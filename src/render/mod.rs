//! HTML rasterization
//!
//! Converted Office documents are laid out in a letter-width container and
//! turned into one bitmap. The layout happens on a [`RenderSurface`]: a private
//! temporary directory holding the document, created right before rendering
//! and removed when the surface is dropped, whether rendering worked or not.

pub mod command;

pub use command::CommandRasterizer;

use std::path::{Path, PathBuf};

use image::RgbaImage;
use tempfile::TempDir;
use tracing::debug;

use crate::error::Result;
use crate::layout::{Length, Margins};

const DOCUMENT_FILE: &str = "document.html";

/// How converted HTML is laid out and rasterized
#[derive(Debug, Clone, Copy)]
pub struct RasterOptions {
    /// Device pixels per CSS pixel
    pub scale: f64,
    /// Width of the document container
    pub container_width: Length,
    /// Padding inside the container
    pub margins: Margins,
}

impl RasterOptions {
    /// Container width in CSS pixels
    pub fn css_width(&self) -> u32 {
        self.container_width.css_px().round() as u32
    }

    /// Width of the rendered bitmap in device pixels
    pub fn pixel_width(&self) -> u32 {
        (f64::from(self.css_width()) * self.scale).round() as u32
    }
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            container_width: Length::from_inches(8.5),
            margins: Margins::standard(),
        }
    }
}

/// Renders a prepared surface to a bitmap
pub trait HtmlRasterizer {
    fn render(&self, surface: &RenderSurface, options: &RasterOptions) -> Result<RgbaImage>;
}

/// Off-screen location holding one styled document while it is rendered
#[derive(Debug)]
pub struct RenderSurface {
    dir: TempDir,
    html: String,
}

impl RenderSurface {
    /// Wrap `body_html` in the styled container and write it to a fresh directory
    pub fn prepare(body_html: &str, options: &RasterOptions) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("doc-merge-render-").tempdir()?;
        let html = styled_document(body_html, options);
        std::fs::write(dir.path().join(DOCUMENT_FILE), &html)?;
        debug!("Prepared render surface at {}", dir.path().display());

        Ok(Self { dir, html })
    }

    /// Directory backing this surface
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// The full HTML document on this surface
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Path of the HTML document
    pub fn document_path(&self) -> PathBuf {
        self.dir.path().join(DOCUMENT_FILE)
    }

    /// Path for a renderer output file with the given extension
    pub fn output_path(&self, extension: &str) -> PathBuf {
        self.dir.path().join(format!("render.{}", extension))
    }
}

/// Full HTML document: white letter-width page, 1in padding, basic typography
pub fn styled_document(body_html: &str, options: &RasterOptions) -> String {
    let margins = &options.margins;
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
html, body {{ margin: 0; padding: 0; background: #ffffff; }}
.page {{
  box-sizing: border-box;
  width: {width}px;
  padding: {top}px {right}px {bottom}px {left}px;
  background: #ffffff;
  color: #000000;
  font-family: Arial, Helvetica, sans-serif;
  font-size: 12pt;
  line-height: 1.4;
}}
.page p {{ margin: 0 0 8pt 0; }}
.page h1 {{ font-size: 20pt; margin: 0 0 10pt 0; }}
.page h2 {{ font-size: 16pt; margin: 0 0 8pt 0; }}
.page h3, .page h4, .page h5, .page h6 {{ font-size: 13pt; margin: 0 0 6pt 0; }}
.page table {{ border-collapse: collapse; width: 100%; margin: 0 0 8pt 0; }}
.page td, .page th {{ border: 1px solid #999999; padding: 4px 6px; font-size: 10pt; vertical-align: top; text-align: left; }}
.page ul {{ margin: 0 0 8pt 0; padding-left: 24px; }}
</style>
</head>
<body>
<div class="page">
{body}
</div>
</body>
</html>
"#,
        width = options.css_width(),
        top = margins.top.css_px().round(),
        right = margins.right.css_px().round(),
        bottom = margins.bottom.css_px().round(),
        left = margins.left.css_px().round(),
        body = body_html,
    )
}
