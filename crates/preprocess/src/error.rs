use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PreprocessError {
    #[error("No source image bound")]
    NullSource,

    #[error("Unsupported channel count: {0} (expected 3 or 4)")]
    UnsupportedChannelCount(usize),

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Input tensor must be [1, H, W, C], got {0:?}")]
    UnsupportedLayout(Vec<usize>),

    #[error("Pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Resized image needs {needed} elements but the input tensor holds {capacity}")]
    ExceedsTensor { needed: usize, capacity: usize },

    #[error("Resize failed: {0}")]
    Resize(String),
}
