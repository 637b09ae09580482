use super::{ExecutionGraph, GraphOptions, InferenceEngine, Slot};
use anyhow::{Context, anyhow, bail};
use common::{ElementType, QuantParams, TensorData, TensorSpec};
use ndarray::{ArrayD, IxDyn};
use std::io::Cursor;
use tract_core::prelude::*;

/// Runs TFLite flatbuffers on the CPU with tract.
#[derive(Debug, Clone, Copy, Default)]
pub struct TractEngine;

impl InferenceEngine for TractEngine {
    type Graph = TractGraph;

    fn build_graph(&self, model: &[u8], options: &GraphOptions) -> anyhow::Result<TractGraph> {
        let model = tract_tflite::tflite()
            .model_for_read(&mut Cursor::new(model))
            .context("tract could not interpret the model")?;

        // tract picks its own kernel threading; the hint is informational
        tracing::debug!(
            num_threads = options.num_threads,
            allow_fp16 = options.allow_fp16,
            nodes = model.nodes().len(),
            "Parsed TFLite graph"
        );

        let inputs = model
            .input_outlets()?
            .iter()
            .map(|outlet| fact_to_spec(model.outlet_fact(*outlet)?))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let outputs = model
            .output_outlets()?
            .iter()
            .map(|outlet| fact_to_spec(model.outlet_fact(*outlet)?))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let input_types = model
            .input_outlets()?
            .iter()
            .map(|outlet| Ok(model.outlet_fact(*outlet)?.datum_type))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(TractGraph {
            pending: vec![None; inputs.len()],
            model: Some(model),
            plan: None,
            inputs,
            input_types,
            outputs,
            results: None,
        })
    }
}

pub struct TractGraph {
    model: Option<TypedModel>,
    plan: Option<TypedRunnableModel<TypedModel>>,
    inputs: Vec<TensorSpec>,
    input_types: Vec<DatumType>,
    outputs: Vec<TensorSpec>,
    pending: Vec<Option<Tensor>>,
    results: Option<TVec<TValue>>,
}

impl ExecutionGraph for TractGraph {
    fn input_count(&self) -> usize {
        self.inputs.len()
    }

    fn output_count(&self) -> usize {
        self.outputs.len()
    }

    fn tensor_spec(&self, slot: Slot) -> anyhow::Result<TensorSpec> {
        let spec = match slot {
            Slot::Input(i) => self.inputs.get(i),
            Slot::Output(i) => self.outputs.get(i),
        };
        spec.cloned().ok_or_else(|| anyhow!("no tensor at {slot:?}"))
    }

    fn allocate_tensors(&mut self) -> anyhow::Result<()> {
        if self.plan.is_some() {
            return Ok(());
        }
        let model = self
            .model
            .take()
            .ok_or_else(|| anyhow!("graph has no model to plan"))?;

        let plan = model
            .into_optimized()
            .context("graph optimization failed")?
            .into_runnable()
            .context("could not plan graph execution")?;

        self.plan = Some(plan);
        Ok(())
    }

    fn write_tensor(&mut self, index: usize, data: &TensorData) -> anyhow::Result<()> {
        let datum_type = *self
            .input_types
            .get(index)
            .ok_or_else(|| anyhow!("no input slot {index}"))?;

        let tensor = match data {
            TensorData::F32(array) => {
                let values = array
                    .as_slice()
                    .ok_or_else(|| anyhow!("input is not contiguous"))?;
                Tensor::from_shape::<f32>(data.shape(), values)?
            }
            TensorData::U8(array) => {
                let values = array
                    .as_slice()
                    .ok_or_else(|| anyhow!("input is not contiguous"))?;
                let mut tensor = Tensor::from_shape::<u8>(data.shape(), values)?;
                if datum_type.is_quantized() {
                    // SAFETY: u8 and QU8 share the same storage layout
                    unsafe { tensor.set_datum_type(datum_type) };
                }
                tensor
            }
        };

        self.pending[index] = Some(tensor);
        Ok(())
    }

    fn invoke(&mut self) -> anyhow::Result<()> {
        let plan = self
            .plan
            .as_ref()
            .ok_or_else(|| anyhow!("tensors have not been allocated"))?;

        let inputs = self
            .pending
            .iter()
            .enumerate()
            .map(|(i, tensor)| {
                tensor
                    .clone()
                    .map(TValue::from)
                    .ok_or_else(|| anyhow!("input {i} has not been written"))
            })
            .collect::<anyhow::Result<TVec<TValue>>>()?;

        self.results = None;
        self.results = Some(plan.run(inputs)?);
        Ok(())
    }

    fn read_tensor(&self, index: usize) -> anyhow::Result<TensorData> {
        let tensor = self
            .results
            .as_ref()
            .and_then(|results| results.get(index))
            .ok_or_else(|| anyhow!("no result for output {index}"))?;
        let spec = self
            .outputs
            .get(index)
            .ok_or_else(|| anyhow!("no output slot {index}"))?;
        let shape = IxDyn(tensor.shape());

        let data = match spec.element_type {
            ElementType::F32 => TensorData::F32(ArrayD::from_shape_vec(
                shape,
                tensor.as_slice::<f32>()?.to_vec(),
            )?),
            ElementType::U8 => TensorData::U8(ArrayD::from_shape_vec(
                shape,
                tensor.as_slice::<u8>()?.to_vec(),
            )?),
        };
        Ok(data)
    }
}

fn fact_to_spec(fact: &TypedFact) -> anyhow::Result<TensorSpec> {
    let dims = fact
        .shape
        .as_concrete()
        .ok_or_else(|| anyhow!("symbolic tensor shape {:?}", fact.shape))?
        .to_vec();

    let element_type = match fact.datum_type.unquantized() {
        DatumType::F32 => ElementType::F32,
        DatumType::U8 => ElementType::U8,
        other => bail!("cannot handle tensor type {other:?} yet"),
    };

    let mut spec = TensorSpec::new(dims, element_type);
    if fact.datum_type.is_quantized() {
        let (zero_point, scale) = fact.datum_type.zp_scale();
        spec = spec.with_quant(QuantParams { scale, zero_point });
    }
    Ok(spec)
}
