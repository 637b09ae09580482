use crate::errors::{ClassifierError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

/// File identifier of a TFLite flatbuffer, stored at bytes `[4, 8)`.
pub const MODEL_SIGNATURE: &str = "TFL3";
pub const MODEL_EXTENSION: &str = "tflite";

const SIGNATURE_RANGE: std::ops::Range<usize> = 4..8;

/// Validated, immutable model bytes.
///
/// Cloning is cheap: the payload is shared read-only, so several sessions
/// can be built from one container.
#[derive(Debug, Clone)]
pub struct ModelContainer {
    data: Arc<[u8]>,
}

impl ModelContainer {
    pub fn load(bytes: &[u8]) -> Result<Self> {
        validate(bytes)?;
        Ok(Self {
            data: Arc::from(bytes),
        })
    }

    pub fn load_from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        validate(&buf)?;
        Ok(Self { data: buf.into() })
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let model = Self::load_from_reader(BufReader::new(File::open(path)?))?;

        tracing::info!(
            path = %path.display(),
            size_mb = model.len() as f64 / (1024.0 * 1024.0),
            "Model loaded"
        );
        Ok(model)
    }

    /// Replace the held bytes wholesale. On failure the previous model is kept.
    pub fn reload(&mut self, bytes: &[u8]) -> Result<()> {
        *self = Self::load(bytes)?;
        Ok(())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn shared(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a validated container.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Whether `path` carries the model file extension (case-insensitive).
pub fn is_model_path(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MODEL_EXTENSION))
}

fn validate(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(ClassifierError::EmptyInput);
    }

    match bytes.get(SIGNATURE_RANGE) {
        Some(signature) if signature == MODEL_SIGNATURE.as_bytes() => Ok(()),
        _ => Err(ClassifierError::UnrecognizedFormat {
            expected: MODEL_SIGNATURE,
        }),
    }
}
