//! Rasterization through an external headless renderer
//!
//! The default program is `wkhtmltoimage`. Any program accepting the same
//! arguments (`--quiet --format png --width N --zoom Z <input> <output>`)
//! can be configured instead.

use std::ffi::OsString;
use std::process::Command;

use image::{ImageReader, RgbaImage};
use tracing::debug;

use crate::error::{Error, Result};
use crate::render::{HtmlRasterizer, RasterOptions, RenderSurface};

/// Default headless renderer
pub const DEFAULT_PROGRAM: &str = "wkhtmltoimage";

/// Runs a headless HTML renderer as a child process
#[derive(Debug, Clone)]
pub struct CommandRasterizer {
    program: OsString,
}

impl CommandRasterizer {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn arguments(surface: &RenderSurface, options: &RasterOptions) -> Vec<OsString> {
        vec![
            "--quiet".into(),
            "--format".into(),
            "png".into(),
            "--width".into(),
            options.pixel_width().to_string().into(),
            "--zoom".into(),
            options.scale.to_string().into(),
            surface.document_path().into_os_string(),
            surface.output_path("png").into_os_string(),
        ]
    }
}

impl Default for CommandRasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl HtmlRasterizer for CommandRasterizer {
    fn render(&self, surface: &RenderSurface, options: &RasterOptions) -> Result<RgbaImage> {
        let args = Self::arguments(surface, options);
        debug!("Running {:?} with {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(surface.root())
            .output()
            .map_err(|e| {
                Error::Render(format!(
                    "could not start {}: {}",
                    self.program.to_string_lossy(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Render(format!(
                "{} exited with {}: {}",
                self.program.to_string_lossy(),
                output.status,
                stderr.trim()
            )));
        }

        let png_path = surface.output_path("png");
        if !png_path.exists() {
            return Err(Error::Render(format!(
                "{} produced no image",
                self.program.to_string_lossy()
            )));
        }

        let image = ImageReader::open(&png_path)?
            .with_guessed_format()?
            .decode()?;
        debug!("Rendered bitmap {}x{}", image.width(), image.height());

        Ok(image.into_rgba8())
    }
}
