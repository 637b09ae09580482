//! Resampling an interleaved 8-bit raster straight into a typed tensor buffer.

use crate::PreprocessError;
use crate::config::Resampler;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};

/// Numeric type an interpolated sample is written out as.
pub trait Element: Copy + Default {
    fn from_sample(value: f32) -> Self;
}

impl Element for f32 {
    #[inline]
    fn from_sample(value: f32) -> Self {
        value
    }
}

impl Element for u8 {
    /// Truncates toward zero, saturating at 0 and 255.
    #[inline]
    fn from_sample(value: f32) -> Self {
        value as u8
    }
}

/// Source raster geometry: `width * height * channels` interleaved bytes.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl Geometry {
    pub fn len(&self) -> usize {
        self.width * self.height * self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resample `src` to `dst_width x dst_height`, writing `dst_width * dst_height * channels`
/// elements to the front of `out`.
pub fn resample_into<T: Element>(
    resampler: Resampler,
    src: &[u8],
    geometry: Geometry,
    dst_width: usize,
    dst_height: usize,
    out: &mut [T],
) -> Result<(), PreprocessError> {
    match resampler {
        Resampler::Bilinear => resize_bilinear(src, geometry, dst_width, dst_height, out),
        Resampler::FastImageResize => {
            check_buffers(src, geometry, dst_width, dst_height, out)?;
            let resized = resize_fast(src, geometry, dst_width, dst_height)?;
            for (dst, &px) in out.iter_mut().zip(resized.iter()) {
                *dst = T::from_sample(px as f32);
            }
            Ok(())
        }
    }
}

fn check_buffers<T>(
    src: &[u8],
    geometry: Geometry,
    dst_width: usize,
    dst_height: usize,
    out: &[T],
) -> Result<(), PreprocessError> {
    if geometry.width == 0 || geometry.height == 0 {
        return Err(PreprocessError::InvalidDimensions {
            width: geometry.width,
            height: geometry.height,
        });
    }
    if dst_width == 0 || dst_height == 0 {
        return Err(PreprocessError::InvalidDimensions {
            width: dst_width,
            height: dst_height,
        });
    }
    if src.len() != geometry.len() {
        return Err(PreprocessError::BufferSizeMismatch {
            expected: geometry.len(),
            actual: src.len(),
        });
    }
    let needed = dst_width * dst_height * geometry.channels;
    if out.len() < needed {
        return Err(PreprocessError::ExceedsTensor {
            needed,
            capacity: out.len(),
        });
    }
    Ok(())
}

/// Two-axis linear interpolation over the four nearest source pixels.
///
/// Destination pixel `(x, y)` samples source coordinate `(x * sw / dw, y * sh / dh)`
/// (no corner alignment, no half-pixel offset). The neighbour on the far side is
/// clamped to the last row/column, so borders never read out of bounds.
pub fn resize_bilinear<T: Element>(
    src: &[u8],
    geometry: Geometry,
    dst_width: usize,
    dst_height: usize,
    out: &mut [T],
) -> Result<(), PreprocessError> {
    check_buffers(src, geometry, dst_width, dst_height, out)?;

    let Geometry {
        width: src_width,
        height: src_height,
        channels,
    } = geometry;

    let scale_x = src_width as f32 / dst_width as f32;
    let scale_y = src_height as f32 / dst_height as f32;
    let src_stride = src_width * channels;
    let dst_stride = dst_width * channels;

    for (y, dst_row) in out
        .chunks_exact_mut(dst_stride)
        .take(dst_height)
        .enumerate()
    {
        let in_y = y as f32 * scale_y;
        let y0 = (in_y.floor() as usize).min(src_height - 1);
        let y1 = (y0 + 1).min(src_height - 1);
        let dy = in_y - y0 as f32;

        let top = &src[y0 * src_stride..(y0 + 1) * src_stride];
        let bottom = &src[y1 * src_stride..(y1 + 1) * src_stride];

        for (x, dst_px) in dst_row.chunks_exact_mut(channels).enumerate() {
            let in_x = x as f32 * scale_x;
            let x0 = (in_x.floor() as usize).min(src_width - 1);
            let x1 = (x0 + 1).min(src_width - 1);
            let dx = in_x - x0 as f32;

            let w00 = (1.0 - dx) * (1.0 - dy);
            let w10 = dx * (1.0 - dy);
            let w01 = (1.0 - dx) * dy;
            let w11 = dx * dy;

            for (c, dst) in dst_px.iter_mut().enumerate() {
                let p00 = top[x0 * channels + c] as f32;
                let p10 = top[x1 * channels + c] as f32;
                let p01 = bottom[x0 * channels + c] as f32;
                let p11 = bottom[x1 * channels + c] as f32;

                *dst = T::from_sample(p00 * w00 + p10 * w10 + p01 * w01 + p11 * w11);
            }
        }
    }

    Ok(())
}

fn resize_fast(
    src: &[u8],
    geometry: Geometry,
    dst_width: usize,
    dst_height: usize,
) -> Result<Vec<u8>, PreprocessError> {
    let pixel_type = match geometry.channels {
        3 => PixelType::U8x3,
        4 => PixelType::U8x4,
        other => return Err(PreprocessError::UnsupportedChannelCount(other)),
    };
    if geometry.is_empty() || dst_width == 0 || dst_height == 0 {
        return Err(PreprocessError::InvalidDimensions {
            width: dst_width,
            height: dst_height,
        });
    }

    let src = ImageRef::new(
        geometry.width as u32,
        geometry.height as u32,
        src,
        pixel_type,
    )
    .map_err(|e| PreprocessError::Resize(e.to_string()))?;

    let mut resized = Image::new(dst_width as u32, dst_height as u32, pixel_type);

    Resizer::new()
        .resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )
        .map_err(|e| PreprocessError::Resize(e.to_string()))?;

    Ok(resized.into_vec())
}
