use crate::PreprocessError;
use image::{DynamicImage, ImageBuffer, Luma, LumaA, Rgb, Rgba};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    L8,
    La8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::L8 => 1,
            PixelFormat::La8 => 2,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// A decoded, interleaved 8-bit raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl RasterImage {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, PreprocessError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(format.channels()))
            .ok_or(PreprocessError::InvalidDimensions {
                width: width as usize,
                height: height as usize,
            })?;
        if data.len() != expected {
            return Err(PreprocessError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Convert to an RGB8 (3 channels) or RGBA8 (4 channels) raster.
    /// Borrows when the image is already in the wanted format.
    pub fn convert(&self, channels: usize) -> Result<Cow<'_, RasterImage>, PreprocessError> {
        let format = match channels {
            3 => PixelFormat::Rgb8,
            4 => PixelFormat::Rgba8,
            other => return Err(PreprocessError::UnsupportedChannelCount(other)),
        };

        if self.format == format {
            return Ok(Cow::Borrowed(self));
        }

        let dynamic = self.to_dynamic()?;
        let data = match format {
            PixelFormat::Rgb8 => dynamic.to_rgb8().into_raw(),
            _ => dynamic.to_rgba8().into_raw(),
        };

        tracing::trace!(
            from = ?self.format,
            to = ?format,
            "Converted image pixel format"
        );

        Ok(Cow::Owned(Self {
            width: self.width,
            height: self.height,
            format,
            data,
        }))
    }

    fn to_dynamic(&self) -> Result<DynamicImage, PreprocessError> {
        let (w, h, raw) = (self.width, self.height, self.data.clone());
        let image = match self.format {
            PixelFormat::L8 => {
                ImageBuffer::<Luma<u8>, _>::from_raw(w, h, raw).map(DynamicImage::ImageLuma8)
            }
            PixelFormat::La8 => {
                ImageBuffer::<LumaA<u8>, _>::from_raw(w, h, raw).map(DynamicImage::ImageLumaA8)
            }
            PixelFormat::Rgb8 => {
                ImageBuffer::<Rgb<u8>, _>::from_raw(w, h, raw).map(DynamicImage::ImageRgb8)
            }
            PixelFormat::Rgba8 => {
                ImageBuffer::<Rgba<u8>, _>::from_raw(w, h, raw).map(DynamicImage::ImageRgba8)
            }
        };

        image.ok_or(PreprocessError::BufferSizeMismatch {
            expected: w as usize * h as usize * self.format.channels(),
            actual: self.data.len(),
        })
    }
}

impl From<DynamicImage> for RasterImage {
    fn from(image: DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let (format, data) = match image {
            DynamicImage::ImageLuma8(buf) => (PixelFormat::L8, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => (PixelFormat::La8, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (PixelFormat::Rgb8, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (PixelFormat::Rgba8, buf.into_raw()),
            // 16-bit and float rasters are narrowed to 8-bit RGBA
            other => (PixelFormat::Rgba8, other.to_rgba8().into_raw()),
        };

        Self {
            width,
            height,
            format,
            data,
        }
    }
}
