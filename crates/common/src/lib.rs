pub mod config;
pub mod logging;
pub mod span;
pub mod tensor;

pub use config::{Environment, env_or};
pub use logging::setup_logging;
pub use tensor::{ElementType, QuantParams, TensorData, TensorSpec};

#[doc(hidden)]
pub use tracing as __tracing;
