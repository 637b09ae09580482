use crate::postprocessing::{DEFAULT_MAX_RESULTS, DEFAULT_THRESHOLD};
use common::env_or;
use preprocess::{PreprocessConfig, Resampler, ResizePolicy};
use std::env;

pub use common::Environment;

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub environment: Environment,
    pub log_level: Option<String>,
    pub model_path: String,
    pub label_path: String,
    pub image_path: Option<String>,
    pub confidence_threshold: f32,
    pub max_results: usize,
    pub num_threads: usize,
    pub preprocess: PreprocessConfig,
}

impl ClassifierConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();
        let log_level = env::var("LOG_LEVEL").ok();

        let model_path =
            env::var("MODEL_PATH").unwrap_or_else(|_| "models/model.tflite".to_string());
        let label_path =
            env::var("LABEL_PATH").unwrap_or_else(|_| "models/labels.txt".to_string());
        let image_path = env::var("IMAGE_PATH").ok();

        let confidence_threshold = env_or("CONFIDENCE_THRESHOLD", DEFAULT_THRESHOLD);
        if !(0.0..=1.0).contains(&confidence_threshold) {
            anyhow::bail!(
                "CONFIDENCE_THRESHOLD must be within [0, 1], got {confidence_threshold}"
            );
        }

        let max_results = env_or("MAX_RESULTS", DEFAULT_MAX_RESULTS);
        let num_threads = env_or("NUM_THREADS", default_threads()).max(1);

        let preprocess = PreprocessConfig {
            resize_policy: env_or("RESIZE_POLICY", ResizePolicy::default()),
            resampler: env_or("RESAMPLER", Resampler::default()),
        };

        Ok(Self {
            environment,
            log_level,
            model_path,
            label_path,
            image_path,
            confidence_threshold,
            max_results,
            num_threads,
            preprocess,
        })
    }

    /// Create default configuration for testing
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            log_level: None,
            model_path: "/models/mobilenet_v1_1.0_224.tflite".to_string(),
            label_path: "/models/labels.txt".to_string(),
            image_path: None,
            confidence_threshold: DEFAULT_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
            num_threads: 1,
            preprocess: PreprocessConfig::default(),
        }
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
