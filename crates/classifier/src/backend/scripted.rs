//! Deterministic in-process engine with fixed tensor specs and scripted output.
//!
//! Exercises the session and pipeline without linking a numeric kernel library.

use super::{ExecutionGraph, GraphOptions, InferenceEngine, Slot};
use anyhow::{anyhow, bail};
use common::{TensorData, TensorSpec};

/// Step at which a scripted engine reports an engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    Build,
    /// Build succeeds but the graph reports zero inputs.
    NoInputs,
    Allocate,
    Invoke,
}

#[derive(Debug, Clone)]
pub struct ScriptedEngine {
    input: TensorSpec,
    output: TensorSpec,
    scores: Option<TensorData>,
    failure: Option<FailurePoint>,
}

impl ScriptedEngine {
    pub fn new(input: TensorSpec, output: TensorSpec) -> Self {
        Self {
            input,
            output,
            scores: None,
            failure: None,
        }
    }

    /// Output returned by every successful invoke. Defaults to zeros.
    pub fn with_output(mut self, scores: TensorData) -> Self {
        self.scores = Some(scores);
        self
    }

    pub fn failing_at(mut self, point: FailurePoint) -> Self {
        self.failure = Some(point);
        self
    }
}

impl InferenceEngine for ScriptedEngine {
    type Graph = ScriptedGraph;

    fn build_graph(&self, model: &[u8], options: &GraphOptions) -> anyhow::Result<ScriptedGraph> {
        if self.failure == Some(FailurePoint::Build) {
            bail!("unable to interpret {} model bytes", model.len());
        }

        tracing::debug!(
            model_bytes = model.len(),
            num_threads = options.num_threads,
            "Building scripted graph"
        );

        let inputs = if self.failure == Some(FailurePoint::NoInputs) {
            Vec::new()
        } else {
            vec![self.input.clone()]
        };

        Ok(ScriptedGraph {
            inputs,
            output: self.output.clone(),
            scores: self.scores.clone(),
            failure: self.failure,
            num_threads: options.num_threads,
            allocated: false,
            input_data: None,
            output_data: None,
            invocations: 0,
        })
    }
}

#[derive(Debug)]
pub struct ScriptedGraph {
    inputs: Vec<TensorSpec>,
    output: TensorSpec,
    scores: Option<TensorData>,
    failure: Option<FailurePoint>,
    num_threads: usize,
    allocated: bool,
    input_data: Option<TensorData>,
    output_data: Option<TensorData>,
    invocations: usize,
}

impl ScriptedGraph {
    /// Most recent contents written to input slot 0.
    pub fn last_input(&self) -> Option<&TensorData> {
        self.input_data.as_ref()
    }

    pub fn invocations(&self) -> usize {
        self.invocations
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }
}

impl ExecutionGraph for ScriptedGraph {
    fn input_count(&self) -> usize {
        self.inputs.len()
    }

    fn output_count(&self) -> usize {
        1
    }

    fn tensor_spec(&self, slot: Slot) -> anyhow::Result<TensorSpec> {
        match slot {
            Slot::Input(i) => self
                .inputs
                .get(i)
                .cloned()
                .ok_or_else(|| anyhow!("no input slot {i}")),
            Slot::Output(0) => Ok(self.output.clone()),
            Slot::Output(i) => Err(anyhow!("no output slot {i}")),
        }
    }

    fn allocate_tensors(&mut self) -> anyhow::Result<()> {
        if self.failure == Some(FailurePoint::Allocate) {
            bail!("tensor arena exhausted");
        }
        self.allocated = true;
        Ok(())
    }

    fn write_tensor(&mut self, index: usize, data: &TensorData) -> anyhow::Result<()> {
        let spec = self
            .inputs
            .get(index)
            .ok_or_else(|| anyhow!("no input slot {index}"))?;
        if !data.fits(spec) {
            bail!("input {index} expects {spec}, got {:?}", data.shape());
        }
        self.input_data = Some(data.clone());
        Ok(())
    }

    fn invoke(&mut self) -> anyhow::Result<()> {
        if !self.allocated {
            bail!("tensors have not been allocated");
        }
        if self.failure == Some(FailurePoint::Invoke) {
            bail!("node 0 failed to invoke");
        }

        self.invocations += 1;
        self.output_data = Some(
            self.scores
                .clone()
                .unwrap_or_else(|| TensorData::zeros(&self.output)),
        );
        Ok(())
    }

    fn read_tensor(&self, index: usize) -> anyhow::Result<TensorData> {
        if index != 0 {
            bail!("no output slot {index}");
        }
        self.output_data
            .clone()
            .ok_or_else(|| anyhow!("graph has not been invoked"))
    }
}
