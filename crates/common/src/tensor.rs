//! Tensor descriptions shared by the preprocessor, the session and the ranker.

use ndarray::{ArrayD, IxDyn};
use std::fmt;

/// Element types the pipeline knows how to fill and rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    F32,
    /// 8-bit unsigned, usually asymmetric-quantized.
    U8,
}

impl ElementType {
    /// Size of one element in bytes.
    pub fn size_of(&self) -> usize {
        match self {
            ElementType::F32 => 4,
            ElementType::U8 => 1,
        }
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, ElementType::F32)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::F32 => "f32",
            ElementType::U8 => "u8",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tensor affine quantization: `real = scale * (q - zero_point)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantParams {
    pub scale: f32,
    pub zero_point: i32,
}

/// Shape and element type of one graph input or output slot.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorSpec {
    pub dims: Vec<usize>,
    pub element_type: ElementType,
    pub quant: Option<QuantParams>,
}

impl TensorSpec {
    pub fn new(dims: impl Into<Vec<usize>>, element_type: ElementType) -> Self {
        Self {
            dims: dims.into(),
            element_type,
            quant: None,
        }
    }

    pub fn with_quant(mut self, quant: QuantParams) -> Self {
        self.quant = Some(quant);
        self
    }

    /// `None` when the product of `dims` overflows `usize`.
    pub fn checked_element_count(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    pub fn checked_byte_size(&self) -> Option<usize> {
        self.checked_element_count()?
            .checked_mul(self.element_type.size_of())
    }

    /// Saturates at `usize::MAX` for shapes that overflow.
    pub fn element_count(&self) -> usize {
        self.checked_element_count().unwrap_or(usize::MAX)
    }

    /// Saturates at `usize::MAX` for shapes that overflow.
    pub fn byte_size(&self) -> usize {
        self.checked_byte_size().unwrap_or(usize::MAX)
    }

    /// `(height, width, channels)` for a `[1, H, W, C]` layout.
    pub fn nhwc(&self) -> Option<(usize, usize, usize)> {
        match self.dims.as_slice() {
            [1, h, w, c] => Some((*h, *w, *c)),
            _ => None,
        }
    }

    /// Innermost dimension, which holds the class scores of a `(1, ..., N)` output.
    pub fn last_dim(&self) -> usize {
        self.dims.last().copied().unwrap_or(0)
    }
}

impl fmt::Display for TensorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.dims, self.element_type)?;
        if let Some(q) = self.quant {
            write!(f, " (scale={}, zero_point={})", q.scale, q.zero_point)?;
        }
        Ok(())
    }
}

/// Owned tensor contents, used both for prepared inputs and engine outputs.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    F32(ArrayD<f32>),
    U8(ArrayD<u8>),
}

impl TensorData {
    pub fn zeros(spec: &TensorSpec) -> Self {
        let shape = IxDyn(&spec.dims);
        match spec.element_type {
            ElementType::F32 => TensorData::F32(ArrayD::zeros(shape)),
            ElementType::U8 => TensorData::U8(ArrayD::zeros(shape)),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            TensorData::F32(_) => ElementType::F32,
            TensorData::U8(_) => ElementType::U8,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            TensorData::F32(a) => a.shape(),
            TensorData::U8(a) => a.shape(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TensorData::F32(a) => a.len(),
            TensorData::U8(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn byte_len(&self) -> usize {
        self.len() * self.element_type().size_of()
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            TensorData::F32(a) => a.as_slice(),
            TensorData::U8(_) => None,
        }
    }

    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            TensorData::U8(a) => a.as_slice(),
            TensorData::F32(_) => None,
        }
    }

    /// Same element type and byte size as `spec`.
    pub fn fits(&self, spec: &TensorSpec) -> bool {
        self.element_type() == spec.element_type && self.byte_len() == spec.byte_size()
    }
}
