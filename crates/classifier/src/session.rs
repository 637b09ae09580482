use crate::backend::{ExecutionGraph, GraphOptions, InferenceEngine, Slot};
use crate::errors::{ClassifierError, Result};
use crate::model::ModelContainer;
use common::{TensorData, TensorSpec, span};

/// Narrow, single-caller wrapper over one built execution graph.
///
/// Lifecycle: `build` -> `allocate` (once) -> (`fill_input` -> `run` -> `output`)*.
/// Not meant to be shared between concurrent calls; build one session per
/// concurrent request from a shared [`ModelContainer`].
pub struct Session<G: ExecutionGraph> {
    graph: G,
    input: TensorSpec,
    output: TensorSpec,
    allocated: bool,
    output_data: Option<TensorData>,
}

impl<G: ExecutionGraph> Session<G> {
    pub fn build<E>(engine: &E, model: &ModelContainer, options: &GraphOptions) -> Result<Self>
    where
        E: InferenceEngine<Graph = G>,
    {
        let _s = span!("build_session");

        let graph = engine
            .build_graph(model.bytes(), options)
            .map_err(ClassifierError::graph_build)?;

        let inputs = graph.input_count();
        let outputs = graph.output_count();
        tracing::debug!(inputs, outputs, "Execution graph built");

        if inputs == 0 {
            return Err(ClassifierError::graph_build("model reports no input tensors"));
        }
        if outputs == 0 {
            return Err(ClassifierError::graph_build("model reports no output tensors"));
        }

        let input = graph
            .tensor_spec(Slot::Input(0))
            .map_err(ClassifierError::graph_build)?;
        let output = graph
            .tensor_spec(Slot::Output(0))
            .map_err(ClassifierError::graph_build)?;

        for spec in [&input, &output] {
            if spec.checked_byte_size().is_none() {
                return Err(ClassifierError::graph_build(format!("tensor size overflows: {spec}")));
            }
        }

        log_tensor_inventory(&graph);

        Ok(Self {
            graph,
            input,
            output,
            allocated: false,
            output_data: None,
        })
    }

    /// Shape and element type of input slot 0.
    pub fn input_spec(&self) -> &TensorSpec {
        &self.input
    }

    /// Shape and element type of output slot 0.
    pub fn output_spec(&self) -> &TensorSpec {
        &self.output
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Allocate tensor storage. Repeated calls are no-ops.
    pub fn allocate(&mut self) -> Result<()> {
        if self.allocated {
            return Ok(());
        }

        self.graph
            .allocate_tensors()
            .map_err(|e| ClassifierError::execution(format!("can't allocate tensors: {e}")))?;
        self.allocated = true;

        tracing::debug!(input = %self.input, output = %self.output, "Tensors allocated");
        Ok(())
    }

    /// Copy a prepared buffer into input slot 0. Its byte size and element
    /// type must match [`Self::input_spec`].
    pub fn fill_input(&mut self, buffer: &TensorData) -> Result<()> {
        if !buffer.fits(&self.input) {
            return Err(ClassifierError::ShapeMismatch {
                expected: format!("{} ({} bytes)", self.input, self.input.byte_size()),
                actual: format!(
                    "{:?} {} ({} bytes)",
                    buffer.shape(),
                    buffer.element_type(),
                    buffer.byte_len()
                ),
            });
        }

        self.graph
            .write_tensor(0, buffer)
            .map_err(ClassifierError::execution)
    }

    /// Execute the forward pass. Any previous output is discarded first, so a
    /// failed run never leaves stale results readable.
    pub fn run(&mut self) -> Result<()> {
        let _s = span!("model_inference");

        self.output_data = None;

        if !self.allocated {
            return Err(ClassifierError::execution("tensors have not been allocated"));
        }

        self.graph.invoke().map_err(ClassifierError::execution)?;
        let output = self
            .graph
            .read_tensor(0)
            .map_err(ClassifierError::execution)?;

        self.output_data = Some(output);
        Ok(())
    }

    /// Output slot 0 of the last successful [`Self::run`].
    pub fn output(&self) -> Result<&TensorData> {
        self.output_data
            .as_ref()
            .ok_or_else(|| {
                ClassifierError::execution("no output available before a successful run")
            })
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }
}

fn log_tensor_inventory<G: ExecutionGraph>(graph: &G) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let slots = (0..graph.input_count())
        .map(Slot::Input)
        .chain((0..graph.output_count()).map(Slot::Output));

    for slot in slots {
        match graph.tensor_spec(slot) {
            Ok(spec) => tracing::debug!(
                ?slot,
                bytes = spec.byte_size(),
                spec = %spec,
                "Tensor"
            ),
            Err(e) => tracing::debug!(?slot, error = %e, "Tensor spec unavailable"),
        }
    }
}
