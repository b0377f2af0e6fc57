use serde::{Deserialize, Serialize};

use crate::backends::{GraphBackend, OnnxBackend, TorchBackend};
use crate::preprocess::TensorLayout;
use crate::score::HeadWidth;
use crate::{Device, InferError, ModelSource, Session};

/// Which inference engine evaluates a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Safetensors checkpoint run through candle.
    Torch,
    /// ONNX graph run through tract.
    Graph,
    /// ONNX graph run through onnxruntime.
    Onnx,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Torch => "torch",
            BackendKind::Graph => "graph",
            BackendKind::Onnx => "onnx",
        }
    }
}

/// A session plus the head width discovered while loading it.
pub struct LoadedModel {
    pub session: Box<dyn Session>,
    pub head: HeadWidth,
}

pub trait Backend {
    fn name(&self) -> &str;
    /// Layout the backend expects for its input batches.
    fn input_layout(&self) -> TensorLayout;
    fn load(
        &self,
        model: ModelSource,
        input_size: (usize, usize),
    ) -> Result<LoadedModel, InferError>;
}

pub fn backend_for(kind: BackendKind, device: Device) -> Box<dyn Backend> {
    match kind {
        BackendKind::Torch => Box::new(TorchBackend::new(device)),
        BackendKind::Graph => Box::new(GraphBackend::new(device)),
        BackendKind::Onnx => Box::new(OnnxBackend::new(device)),
    }
}
