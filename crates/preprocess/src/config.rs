use std::str::FromStr;

/// How the target height is chosen once the target width is fixed by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizePolicy {
    /// `height = width * src_height / src_width`, ignoring the declared height.
    /// The result may be shorter than the tensor; the remainder stays zeroed.
    #[default]
    PreserveAspect,
    /// Use the declared tensor height and distort the aspect ratio.
    Stretch,
}

impl FromStr for ResizePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preserve" | "preserve-aspect" | "aspect" => Ok(ResizePolicy::PreserveAspect),
            "stretch" => Ok(ResizePolicy::Stretch),
            other => Err(format!("unknown resize policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resampler {
    /// Four-corner bilinear interpolation, exact at integral coordinates.
    #[default]
    Bilinear,
    /// `fast_image_resize` convolution with a bilinear filter (SIMD, antialiased on downscale).
    FastImageResize,
}

impl FromStr for Resampler {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bilinear" => Ok(Resampler::Bilinear),
            "fast" | "fast_image_resize" | "fir" => Ok(Resampler::FastImageResize),
            other => Err(format!("unknown resampler: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreprocessConfig {
    pub resize_policy: ResizePolicy,
    pub resampler: Resampler,
}
