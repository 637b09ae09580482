//! Turns an arbitrary decoded image into the exact input tensor a classification
//! model declares: channel conversion, aspect-preserving bilinear resize and
//! element-type dispatch (raw floats or truncated bytes).

pub mod config;
pub mod cpu;
pub mod error;
pub mod raster;
pub mod resample;

use common::{TensorData, TensorSpec};

pub use config::{PreprocessConfig, Resampler, ResizePolicy};
pub use cpu::CpuPreProcessor;
pub use error::PreprocessError;
pub use raster::{PixelFormat, RasterImage};

/// Input tensor contents produced for one inference call.
#[derive(Debug, Clone)]
pub struct PreparedInput {
    /// Sized to the full input spec; elements past `written` are zero.
    pub data: TensorData,
    /// Resized width in pixels
    pub width: usize,
    /// Resized height in pixels (aspect-adjusted under the default policy)
    pub height: usize,
    pub channels: usize,
    /// Number of leading elements holding resized pixel data
    pub written: usize,
}

/// Trait for image preprocessing implementations
pub trait Preprocess {
    /// Fill an input tensor described by `spec` from `image`.
    ///
    /// Fails with [`PreprocessError::NullSource`] when no image is bound.
    fn prepare(
        &self,
        image: Option<&RasterImage>,
        spec: &TensorSpec,
    ) -> Result<PreparedInput, PreprocessError>;
}
