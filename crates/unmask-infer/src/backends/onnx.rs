use ndarray::ArrayD;
use ort::{inputs, session::Session as OrtSession, value::TensorRef};

use crate::backend::{Backend, LoadedModel};
use crate::preprocess::TensorLayout;
use crate::score::HeadWidth;
use crate::{Device, InferError, ModelSource, Session};
use unmask_base::Tensor;

/// Runs ONNX graphs through onnxruntime.
pub struct OnnxBackend {
    device: Device,
}

impl OnnxBackend {
    pub fn new(device: Device) -> Self {
        Self { device }
    }
}

impl Backend for OnnxBackend {
    fn name(&self) -> &str {
        "onnx"
    }

    fn input_layout(&self) -> TensorLayout {
        TensorLayout::ChannelLast
    }

    fn load(
        &self,
        model: ModelSource,
        input_size: (usize, usize),
    ) -> Result<LoadedModel, InferError> {
        let device = &self.device;
        let builder = OrtSession::builder().map_err(|e| {
            InferError::Backend(format!("failed to create session builder: {e}"))
        })?;

        // Map Device to ort execution providers
        let builder = match device {
            Device::Cpu => builder,
            #[cfg(feature = "cuda")]
            Device::Cuda { device_id } => {
                use ort::ep::ExecutionProvider;
                use ort::execution_providers::CUDAExecutionProvider;
                let ep = CUDAExecutionProvider::default().with_device_id(*device_id);
                let available = ep.is_available().unwrap_or(false);
                log::info!(
                    "cuda execution provider requested (device_id={device_id}), available: {available}"
                );
                builder
                    .with_execution_providers([ep.build()])
                    .map_err(|_| InferError::UnsupportedDevice(device.clone()))?
            }
            #[cfg(not(feature = "cuda"))]
            Device::Cuda { .. } => {
                return Err(InferError::UnsupportedDevice(device.clone()));
            }
        };

        let session = match model {
            ModelSource::File(path) => builder.commit_from_file(path).map_err(|e| {
                InferError::ModelLoad(format!("failed to load model from file: {e}"))
            })?,
            ModelSource::Memory(bytes) => builder.commit_from_memory(&bytes).map_err(|e| {
                InferError::ModelLoad(format!("failed to load model from memory: {e}"))
            })?,
        };

        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .ok_or_else(|| InferError::ModelLoad("model has no inputs".to_string()))?;
        let output_name = session
            .outputs()
            .first()
            .map(|output| output.name().to_string())
            .ok_or_else(|| InferError::ModelLoad("model has no outputs".to_string()))?;

        let mut session = OnnxSession {
            session,
            input_name,
            output_name,
        };
        // Runtime metadata often leaves the class dimension dynamic, so the
        // head width comes from running one zero frame through the model.
        let head = probe_head(&mut session, input_size)?;
        Ok(LoadedModel {
            session: Box::new(session),
            head,
        })
    }
}

fn probe_head(session: &mut OnnxSession, input_size: (usize, usize)) -> Result<HeadWidth, InferError> {
    let (width, height) = input_size;
    let zeros = Tensor::zeros(vec![1, height, width, 3])?;
    let output = session.run(&zeros)?;
    let units = match output.shape.as_slice() {
        [_, units] => *units,
        [_] => 1,
        other => {
            return Err(InferError::ModelLoad(format!(
                "unexpected probe output shape {other:?}"
            )));
        }
    };
    HeadWidth::from_units(units)
        .ok_or_else(|| InferError::ModelLoad(format!("unsupported head width {units}")))
}

struct OnnxSession {
    session: OrtSession,
    input_name: String,
    output_name: String,
}

impl Session for OnnxSession {
    fn run(&mut self, batch: &Tensor<f32>) -> Result<Tensor<f32>, InferError> {
        let array = ArrayD::from_shape_vec(batch.shape.clone(), batch.data.clone())
            .map_err(|e| InferError::Shape(format!("bad input shape: {e}")))?;
        let tensor_ref = TensorRef::from_array_view(array.view())
            .map_err(|e| InferError::Backend(format!("failed to create tensor ref: {e}")))?;
        let outputs = self
            .session
            .run(inputs![self.input_name.as_str() => tensor_ref])
            .map_err(|e| InferError::Backend(format!("inference failed: {e}")))?;
        let value = &outputs[self.output_name.as_str()];
        let array = value
            .try_extract_array::<f32>()
            .map_err(|e| InferError::Backend(format!("output is not f32: {e}")))?;
        Tensor::new(array.shape().to_vec(), array.iter().copied().collect())
            .map_err(InferError::from)
    }
}
