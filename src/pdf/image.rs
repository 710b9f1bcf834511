//! Bitmap decoding and PDF image XObjects

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};

/// A decoded bitmap ready to be placed on a page
///
/// Colour samples are stored as 8-bit RGB; an alpha channel is kept separately
/// and only when at least one pixel is not fully opaque.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl RasterImage {
    /// Decode PNG or JPEG bytes
    pub fn decode(bytes: &[u8], format: ImageFormat) -> Result<Self> {
        let image = ImageReader::with_format(Cursor::new(bytes), format).decode()?;
        Self::from_dynamic(image)
    }

    /// Wrap an already decoded image
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        let has_alpha = image.color().has_alpha();
        Self::from_rgba(image.into_rgba8(), has_alpha)
    }

    /// Wrap a rendered RGBA bitmap
    pub fn from_rgba_image(image: RgbaImage) -> Result<Self> {
        Self::from_rgba(image, true)
    }

    fn from_rgba(image: RgbaImage, keep_alpha: bool) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage { width, height });
        }

        let pixel_count = (width as usize) * (height as usize);
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for pixel in image.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }

        let alpha = if keep_alpha && alpha.iter().any(|&a| a != u8::MAX) {
            Some(alpha)
        } else {
            None
        };

        Ok(Self {
            width,
            height,
            rgb,
            alpha,
        })
    }

    /// Whether a soft mask will be written for this image
    pub fn has_alpha(&self) -> bool {
        self.alpha.is_some()
    }

    /// Add this image to a document as an Image XObject and return its id
    ///
    /// Streams are written uncompressed; `Document::compress` applies
    /// FlateDecode when the document is saved.
    pub fn add_to(&self, doc: &mut Document) -> ObjectId {
        let smask_id = self.alpha.as_ref().map(|alpha| {
            let mask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(self.width),
                    "Height" => i64::from(self.height),
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8_i64,
                },
                alpha.clone(),
            );
            doc.add_object(mask)
        });

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(self.width),
            "Height" => i64::from(self.height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
        };
        if let Some(mask_id) = smask_id {
            dict.set("SMask", Object::Reference(mask_id));
        }

        doc.add_object(Stream::new(dict, self.rgb.clone()))
    }
}
