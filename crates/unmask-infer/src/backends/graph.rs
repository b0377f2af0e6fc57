use std::io::Cursor;

use tract_onnx::prelude::*;

use crate::backend::{Backend, LoadedModel};
use crate::preprocess::TensorLayout;
use crate::score::HeadWidth;
use crate::{Device, InferError, ModelSource, Session};
use unmask_base::Tensor;

type GraphPlan = RunnableModel<TypedFact, Box<dyn TypedOp>, TypedModel>;

/// Runs ONNX graphs through tract, entirely in-process on the CPU.
pub struct GraphBackend {
    device: Device,
}

impl GraphBackend {
    pub fn new(device: Device) -> Self {
        Self { device }
    }
}

impl Backend for GraphBackend {
    fn name(&self) -> &str {
        "graph"
    }

    fn input_layout(&self) -> TensorLayout {
        TensorLayout::ChannelLast
    }

    fn load(
        &self,
        model: ModelSource,
        _input_size: (usize, usize),
    ) -> Result<LoadedModel, InferError> {
        if self.device != Device::Cpu {
            return Err(InferError::UnsupportedDevice(self.device.clone()));
        }
        let plan = match model {
            ModelSource::File(path) => tract_onnx::onnx()
                .model_for_path(&path)
                .and_then(|m| m.into_optimized())
                .and_then(|m| m.into_runnable())
                .map_err(|e| InferError::ModelLoad(format!("failed to load graph model: {e}")))?,
            ModelSource::Memory(bytes) => tract_onnx::onnx()
                .model_for_read(&mut Cursor::new(bytes))
                .and_then(|m| m.into_optimized())
                .and_then(|m| m.into_runnable())
                .map_err(|e| InferError::ModelLoad(format!("failed to load graph model: {e}")))?,
        };
        let head = output_head(&plan)?;
        Ok(LoadedModel {
            session: Box::new(GraphSession { plan }),
            head,
        })
    }
}

/// Read the head width from the trailing dimension of the optimized
/// output fact. Rank-1 outputs score one unit per frame.
fn output_head(plan: &GraphPlan) -> Result<HeadWidth, InferError> {
    let fact = plan
        .model()
        .output_fact(0)
        .map_err(|e| InferError::ModelLoad(format!("graph model has no output: {e}")))?;
    let units = if fact.rank() == 1 {
        1
    } else {
        fact.shape
            .last()
            .and_then(|dim| dim.to_usize().ok())
            .ok_or_else(|| {
                InferError::ModelLoad("graph model output width is not static".to_string())
            })?
    };
    HeadWidth::from_units(units)
        .ok_or_else(|| InferError::ModelLoad(format!("unsupported head width {units}")))
}

struct GraphSession {
    plan: GraphPlan,
}

impl Session for GraphSession {
    fn run(&mut self, batch: &Tensor<f32>) -> Result<Tensor<f32>, InferError> {
        let array = tract_ndarray::ArrayD::from_shape_vec(
            tract_ndarray::IxDyn(&batch.shape),
            batch.data.clone(),
        )
        .map_err(|e| InferError::Shape(format!("bad input shape: {e}")))?;
        let outputs = self
            .plan
            .run(tvec![array.into_tensor().into()])
            .map_err(|e| InferError::Backend(format!("graph inference failed: {e}")))?;
        let view = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| InferError::Backend(format!("graph output is not f32: {e}")))?;
        Tensor::new(view.shape().to_vec(), view.iter().copied().collect())
            .map_err(InferError::from)
    }
}
