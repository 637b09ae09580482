use crate::config::{PreprocessConfig, ResizePolicy};
use crate::raster::RasterImage;
use crate::resample::{Element, Geometry, resample_into};
use crate::{PreparedInput, Preprocess, PreprocessError};
use common::{TensorData, TensorSpec, span};

#[derive(Debug, Clone, Default)]
pub struct CpuPreProcessor {
    config: PreprocessConfig,
}

impl CpuPreProcessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Target `(width, height)` for a source image given the tensor's declared size.
    ///
    /// Under [`ResizePolicy::PreserveAspect`] the declared height is replaced by
    /// `tensor_width * src_height / src_width`, truncated.
    pub fn target_size(
        &self,
        src_width: usize,
        src_height: usize,
        tensor_width: usize,
        tensor_height: usize,
    ) -> Result<(usize, usize), PreprocessError> {
        if src_width == 0 || src_height == 0 {
            return Err(PreprocessError::InvalidDimensions {
                width: src_width,
                height: src_height,
            });
        }

        let height = match self.config.resize_policy {
            ResizePolicy::PreserveAspect => {
                (tensor_width as f64 * src_height as f64 / src_width as f64) as usize
            }
            ResizePolicy::Stretch => tensor_height,
        };

        if tensor_width == 0 || height == 0 {
            return Err(PreprocessError::InvalidDimensions {
                width: tensor_width,
                height,
            });
        }

        Ok((tensor_width, height))
    }
}

impl Preprocess for CpuPreProcessor {
    fn prepare(
        &self,
        image: Option<&RasterImage>,
        spec: &TensorSpec,
    ) -> Result<PreparedInput, PreprocessError> {
        let _s = span!("prepare_input");

        let image = image.ok_or(PreprocessError::NullSource)?;
        let (tensor_height, tensor_width, channels) = spec
            .nhwc()
            .ok_or_else(|| PreprocessError::UnsupportedLayout(spec.dims.clone()))?;
        if spec.checked_byte_size().is_none() {
            return Err(PreprocessError::InvalidDimensions {
                width: tensor_width,
                height: tensor_height,
            });
        }
        let capacity = spec.element_count();

        tracing::trace!(
            src_width = image.width(),
            src_height = image.height(),
            tensor = %spec,
            "Preprocessing image"
        );

        let (width, height) = self.target_size(
            image.width() as usize,
            image.height() as usize,
            tensor_width,
            tensor_height,
        )?;

        if height != tensor_height {
            tracing::debug!(
                declared = tensor_height,
                resized = height,
                "Aspect-adjusted height differs from the declared input height"
            );
        }

        let converted = image.convert(channels)?;

        let written = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(channels))
            .unwrap_or(usize::MAX);
        if written > capacity {
            return Err(PreprocessError::ExceedsTensor {
                needed: written,
                capacity,
            });
        }

        let geometry = Geometry {
            width: converted.width() as usize,
            height: converted.height() as usize,
            channels,
        };

        let mut data = TensorData::zeros(spec);
        match &mut data {
            TensorData::F32(array) => {
                self.fill(converted.data(), geometry, width, height, array.as_slice_mut())?
            }
            TensorData::U8(array) => {
                self.fill(converted.data(), geometry, width, height, array.as_slice_mut())?
            }
        }

        Ok(PreparedInput {
            data,
            width,
            height,
            channels,
            written,
        })
    }
}

impl CpuPreProcessor {
    fn fill<T: Element>(
        &self,
        src: &[u8],
        geometry: Geometry,
        width: usize,
        height: usize,
        out: Option<&mut [T]>,
    ) -> Result<(), PreprocessError> {
        let _s = span!("resample", width, height);

        let out = out.ok_or_else(|| {
            PreprocessError::Resize("input tensor is not contiguous".to_string())
        })?;
        resample_into(self.config.resampler, src, geometry, width, height, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PixelFormat;
    use crate::config::Resampler;
    use common::ElementType;

    fn rgb_image(width: u32, height: u32, value: u8) -> RasterImage {
        RasterImage::new(
            width,
            height,
            PixelFormat::Rgb8,
            vec![value; (width * height * 3) as usize],
        )
        .unwrap()
    }

    #[test]
    fn test_aspect_ratio_height_for_landscape_image() {
        let preprocessor = CpuPreProcessor::default();
        assert_eq!(
            preprocessor.target_size(640, 480, 224, 224).unwrap(),
            (224, 168)
        );
    }

    #[test]
    fn test_stretch_policy_keeps_declared_height() {
        let preprocessor = CpuPreProcessor::new(PreprocessConfig {
            resize_policy: ResizePolicy::Stretch,
            resampler: Resampler::Bilinear,
        });
        assert_eq!(
            preprocessor.target_size(640, 480, 224, 224).unwrap(),
            (224, 224)
        );
    }

    #[test]
    fn test_prepare_float_tensor() {
        let spec = TensorSpec::new([1, 224, 224, 3], ElementType::F32);
        let image = rgb_image(640, 480, 200);

        let prepared = CpuPreProcessor::default()
            .prepare(Some(&image), &spec)
            .unwrap();

        assert_eq!((prepared.width, prepared.height), (224, 168));
        assert_eq!(prepared.written, 224 * 168 * 3);
        assert!(prepared.data.fits(&spec));

        let values = prepared.data.as_f32().unwrap();
        assert!(
            values[..prepared.written]
                .iter()
                .all(|v| (v - 200.0).abs() < 1e-3)
        );
        assert!(
            values[prepared.written..].iter().all(|v| *v == 0.0),
            "Rows past the aspect-adjusted height stay zeroed"
        );
    }

    #[test]
    fn test_prepare_quantized_tensor() {
        let spec = TensorSpec::new([1, 8, 8, 3], ElementType::U8);
        let image = rgb_image(8, 8, 77);

        let prepared = CpuPreProcessor::default()
            .prepare(Some(&image), &spec)
            .unwrap();

        assert_eq!(prepared.data.element_type(), ElementType::U8);
        assert!(prepared.data.as_u8().unwrap().iter().all(|v| *v == 77));
    }

    #[test]
    fn test_prepare_converts_to_rgba() {
        let spec = TensorSpec::new([1, 2, 2, 4], ElementType::U8);
        let image = rgb_image(2, 2, 9);

        let prepared = CpuPreProcessor::default()
            .prepare(Some(&image), &spec)
            .unwrap();

        assert_eq!(
            prepared.data.as_u8().unwrap(),
            &[9, 9, 9, 255, 9, 9, 9, 255, 9, 9, 9, 255, 9, 9, 9, 255]
        );
    }

    #[test]
    fn test_prepare_without_image() {
        let spec = TensorSpec::new([1, 2, 2, 3], ElementType::F32);
        assert_eq!(
            CpuPreProcessor::default().prepare(None, &spec).unwrap_err(),
            PreprocessError::NullSource
        );
    }

    #[test]
    fn test_prepare_rejects_unsupported_channels() {
        let spec = TensorSpec::new([1, 2, 2, 1], ElementType::F32);
        let image = rgb_image(2, 2, 0);
        assert_eq!(
            CpuPreProcessor::default()
                .prepare(Some(&image), &spec)
                .unwrap_err(),
            PreprocessError::UnsupportedChannelCount(1)
        );
    }

    #[test]
    fn test_prepare_rejects_zero_height() {
        // 1000x1 source scaled to width 10 gives height 0
        let spec = TensorSpec::new([1, 10, 10, 3], ElementType::F32);
        let image = rgb_image(1000, 1, 0);
        assert!(matches!(
            CpuPreProcessor::default()
                .prepare(Some(&image), &spec)
                .unwrap_err(),
            PreprocessError::InvalidDimensions { .. }
        ));
    }

    #[test]
    fn test_prepare_rejects_portrait_overflow() {
        let spec = TensorSpec::new([1, 4, 4, 3], ElementType::F32);
        let image = rgb_image(4, 8, 0);
        assert_eq!(
            CpuPreProcessor::default()
                .prepare(Some(&image), &spec)
                .unwrap_err(),
            PreprocessError::ExceedsTensor {
                needed: 4 * 8 * 3,
                capacity: 4 * 4 * 3
            }
        );
    }

    #[test]
    fn test_prepare_rejects_overflowing_spec() {
        let image = RasterImage::new(4, 4, PixelFormat::Rgb8, vec![0u8; 48]).unwrap();
        let spec = TensorSpec::new([1, usize::MAX, 2, 3], ElementType::F32);
        assert_eq!(
            CpuPreProcessor::default()
                .prepare(Some(&image), &spec)
                .unwrap_err(),
            PreprocessError::InvalidDimensions {
                width: 2,
                height: usize::MAX
            }
        );
    }

    #[test]
    fn test_prepare_rejects_non_nhwc_spec() {
        let spec = TensorSpec::new([224, 224, 3], ElementType::F32);
        let image = rgb_image(2, 2, 0);
        assert!(matches!(
            CpuPreProcessor::default()
                .prepare(Some(&image), &spec)
                .unwrap_err(),
            PreprocessError::UnsupportedLayout(_)
        ));
    }
}
