pub mod backend;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod labels;
pub mod logging;
pub mod model;
pub mod postprocessing;
pub mod session;

// Re-export commonly used types for convenience
pub use backend::{ExecutionGraph, GraphOptions, InferenceEngine, Slot};
pub use classifier::Classifier;
pub use config::ClassifierConfig;
pub use errors::{ClassifierError, ErrorKind, Result};
pub use labels::LabelTable;
pub use model::{MODEL_EXTENSION, MODEL_SIGNATURE, ModelContainer, is_model_path};
pub use postprocessing::{Classification, Confidence, Ranker, ScoredIndex, top_n};
pub use session::Session;
