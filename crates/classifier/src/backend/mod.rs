use common::{TensorData, TensorSpec};

pub mod scripted;

#[cfg(feature = "tract-backend")]
pub mod tract;

/// A tensor slot on an execution graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Input(usize),
    Output(usize),
}

/// Options supplied once when a graph is built.
#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// Worker-thread hint for kernel execution.
    pub num_threads: usize,
    /// Allow fp32 operators to run in fp16 where the engine supports it.
    pub allow_fp16: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            num_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            allow_fp16: true,
        }
    }
}

/// Builds execution graphs from serialized model bytes.
pub trait InferenceEngine {
    type Graph: ExecutionGraph;

    /// Parse `model` into a graph using the engine's fixed operator set.
    fn build_graph(&self, model: &[u8], options: &GraphOptions) -> anyhow::Result<Self::Graph>;
}

/// One built model, owned by a single session.
///
/// Calls run to completion or failure; there is no cancellation hook.
pub trait ExecutionGraph {
    fn input_count(&self) -> usize;

    fn output_count(&self) -> usize;

    fn tensor_spec(&self, slot: Slot) -> anyhow::Result<TensorSpec>;

    /// One-time tensor allocation required before the first `invoke`.
    fn allocate_tensors(&mut self) -> anyhow::Result<()>;

    /// Copy `data` into input slot `index`.
    fn write_tensor(&mut self, index: usize, data: &TensorData) -> anyhow::Result<()>;

    /// Run the forward pass.
    fn invoke(&mut self) -> anyhow::Result<()>;

    /// Contents of output slot `index` after a successful `invoke`.
    fn read_tensor(&self, index: usize) -> anyhow::Result<TensorData>;
}
