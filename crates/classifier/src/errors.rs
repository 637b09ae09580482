use preprocess::PreprocessError;
use std::io;
use thiserror::Error;

/// Coarse failure categories surfaced to callers of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EmptyInput,
    UnrecognizedFormat,
    GraphBuildFailed,
    ShapeMismatch,
    ExecutionFailed,
    UnsupportedChannelCount,
    InvalidDimensions,
    NullSource,
    Io,
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Model data is empty")]
    EmptyInput,

    #[error("Unrecognized model format: expected signature {expected:?} at offset 4")]
    UnrecognizedFormat { expected: &'static str },

    #[error("Failed to build execution graph: {0}")]
    GraphBuildFailed(String),

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ClassifierError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassifierError::EmptyInput => ErrorKind::EmptyInput,
            ClassifierError::UnrecognizedFormat { .. } => ErrorKind::UnrecognizedFormat,
            ClassifierError::GraphBuildFailed(_) => ErrorKind::GraphBuildFailed,
            ClassifierError::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            ClassifierError::ExecutionFailed(_) => ErrorKind::ExecutionFailed,
            ClassifierError::Io(_) => ErrorKind::Io,
            ClassifierError::Preprocess(e) => match e {
                PreprocessError::NullSource => ErrorKind::NullSource,
                PreprocessError::UnsupportedChannelCount(_) => ErrorKind::UnsupportedChannelCount,
                PreprocessError::InvalidDimensions { .. }
                | PreprocessError::UnsupportedLayout(_) => ErrorKind::InvalidDimensions,
                PreprocessError::BufferSizeMismatch { .. }
                | PreprocessError::ExceedsTensor { .. } => ErrorKind::ShapeMismatch,
                PreprocessError::Resize(_) => ErrorKind::ExecutionFailed,
            },
        }
    }

    pub(crate) fn graph_build(err: impl std::fmt::Display) -> Self {
        ClassifierError::GraphBuildFailed(err.to_string())
    }

    pub(crate) fn execution(err: impl std::fmt::Display) -> Self {
        ClassifierError::ExecutionFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
