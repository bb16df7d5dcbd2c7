//! Rendered page bitmaps and their encoded form.

use crate::error::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Page size in PDF points (1 point = 1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    /// Width in points
    pub width: f32,
    /// Height in points
    pub height: f32,
}

impl PageSize {
    /// Create a new page size.
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// US Letter (8.5 x 11 inches).
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// One page rasterized to an in-memory bitmap.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    index: usize,
    image: DynamicImage,
}

impl RenderedPage {
    /// Wrap a bitmap produced for the page at `index` (0-based).
    pub fn new(index: usize, image: DynamicImage) -> Self {
        Self { index, image }
    }

    /// 0-based page index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Bitmap width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Bitmap height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width() as f64 / self.height() as f64
    }

    /// Borrow the bitmap.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Encode the bitmap for embedding into a presentation.
    pub fn encode(&self, encoding: ImageEncoding) -> Result<EncodedImage> {
        if self.width() == 0 || self.height() == 0 {
            return Err(Error::Assembly(format!(
                "page {} rendered to an empty bitmap",
                self.index + 1
            )));
        }

        let mut data = Vec::new();
        match encoding {
            ImageEncoding::Png => {
                self.image
                    .write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)?;
            }
            ImageEncoding::Jpeg { quality } => {
                // JPEG has no alpha channel
                let rgb = self.image.to_rgb8();
                JpegEncoder::new_with_quality(&mut data, quality).encode_image(&rgb)?;
            }
        }

        Ok(EncodedImage {
            data,
            format: encoding.format(),
            width: self.width(),
            height: self.height(),
        })
    }
}

/// How rendered bitmaps are compressed inside the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageEncoding {
    /// Lossless PNG
    #[default]
    Png,
    /// JPEG with the given quality (1-100)
    Jpeg {
        /// Encoder quality
        quality: u8,
    },
}

impl ImageEncoding {
    /// JPEG at a quality that keeps slide text legible.
    pub fn jpeg() -> Self {
        ImageEncoding::Jpeg { quality: 90 }
    }

    /// Container format produced by this encoding.
    pub fn format(&self) -> ImageFormat {
        match self {
            ImageEncoding::Png => ImageFormat::Png,
            ImageEncoding::Jpeg { .. } => ImageFormat::Jpeg,
        }
    }

    /// Check the encoder parameters.
    pub fn validate(&self) -> Result<()> {
        match self {
            ImageEncoding::Jpeg { quality } if !(1..=100).contains(quality) => Err(
                Error::InvalidOption(format!("JPEG quality must be 1-100, got {}", quality)),
            ),
            _ => Ok(()),
        }
    }
}

/// Image container format of an embedded picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    /// PNG
    Png,
    /// JPEG
    Jpeg,
}

impl ImageFormat {
    /// File extension used for media parts.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    /// MIME content type.
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    /// Guess the format from a media part extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }
}

/// Encoded picture bytes ready to be stored as a media part.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Encoded bytes
    pub data: Vec<u8>,
    /// Container format of `data`
    pub format: ImageFormat,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
}
