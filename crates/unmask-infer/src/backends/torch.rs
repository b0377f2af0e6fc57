use std::path::Path;

use candle_core::{DType, Tensor as CanTensor};
use candle_nn::{Module, VarBuilder};
use safetensors::SafeTensors;

use crate::backend::{Backend, LoadedModel};
use crate::meso4::Meso4;
use crate::preprocess::TensorLayout;
use crate::score::HeadWidth;
use crate::{Device, InferError, ModelSource, Session};
use unmask_base::Tensor;

/// Runs Meso4 safetensors checkpoints through candle.
pub struct TorchBackend {
    device: Device,
}

impl TorchBackend {
    pub fn new(device: Device) -> Self {
        Self { device }
    }
}

impl Backend for TorchBackend {
    fn name(&self) -> &str {
        "torch"
    }

    fn input_layout(&self) -> TensorLayout {
        TensorLayout::ChannelFirst
    }

    fn load(
        &self,
        model: ModelSource,
        input_size: (usize, usize),
    ) -> Result<LoadedModel, InferError> {
        let device = candle_device(&self.device)?;
        let (vb, head) = match &model {
            ModelSource::File(path) => {
                let (head, prefixed) = sniff_checkpoint_file(path)?;
                let vb = unsafe {
                    VarBuilder::from_mmaped_safetensors(&[path], DType::F32, &device)?
                };
                (strip_prefix(vb, prefixed), head)
            }
            ModelSource::Memory(bytes) => {
                let (head, prefixed) = sniff_checkpoint(bytes)?;
                let tensors = candle_core::safetensors::load_buffer(bytes, &device)?;
                let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);
                (strip_prefix(vb, prefixed), head)
            }
        };
        let net = Meso4::load(vb, input_size, head.units())
            .map_err(|e| InferError::ModelLoad(format!("failed to build meso4: {e}")))?;
        Ok(LoadedModel {
            session: Box::new(TorchSession { net, device }),
            head,
        })
    }
}

fn candle_device(device: &Device) -> Result<candle_core::Device, InferError> {
    match device {
        Device::Cpu => Ok(candle_core::Device::Cpu),
        Device::Cuda { device_id } => candle_core::Device::new_cuda(*device_id as usize)
            .map_err(|_| InferError::UnsupportedDevice(device.clone())),
    }
}

fn strip_prefix(vb: VarBuilder<'_>, prefixed: bool) -> VarBuilder<'_> {
    if prefixed { vb.pp("module") } else { vb }
}

/// Read the head width from `fc2.weight` without loading the weights.
///
/// Checkpoints exported from distributed training wrap every name in a
/// `module.` prefix; the second return value reports whether this one does.
fn sniff_checkpoint(bytes: &[u8]) -> Result<(HeadWidth, bool), InferError> {
    let tensors = SafeTensors::deserialize(bytes)
        .map_err(|e| InferError::ModelLoad(format!("failed to deserialize safetensors: {e}")))?;
    let (view, prefixed) = match tensors.tensor("fc2.weight") {
        Ok(view) => (view, false),
        Err(_) => match tensors.tensor("module.fc2.weight") {
            Ok(view) => (view, true),
            Err(e) => {
                return Err(InferError::ModelLoad(format!(
                    "checkpoint has no fc2.weight tensor: {e}"
                )));
            }
        },
    };
    let shape = view.shape();
    if shape.is_empty() {
        return Err(InferError::ModelLoad(format!(
            "unexpected shape for fc2.weight: {shape:?}"
        )));
    }
    let head = HeadWidth::from_units(shape[0]).ok_or_else(|| {
        InferError::ModelLoad(format!("unsupported head width {}", shape[0]))
    })?;
    Ok((head, prefixed))
}

/// Memory-maps the checkpoint to read tensor metadata without copying the
/// weights; the later mmap load shares the same page cache.
fn sniff_checkpoint_file(path: &Path) -> Result<(HeadWidth, bool), InferError> {
    let file = std::fs::File::open(path)?;
    let mmap = unsafe { memmap2::Mmap::map(&file) }
        .map_err(|e| InferError::Io(format!("failed to memory-map checkpoint: {e}")))?;
    sniff_checkpoint(&mmap)
}

struct TorchSession {
    net: Meso4,
    device: candle_core::Device,
}

impl Session for TorchSession {
    /// Executes one forward pass per batch row, in order.
    fn run(&mut self, batch: &Tensor<f32>) -> Result<Tensor<f32>, InferError> {
        let Some((&rows, frame_dims)) = batch.shape.split_first() else {
            return Err(InferError::Shape(
                "expected a batched input, got a scalar".to_string(),
            ));
        };
        let stride: usize = frame_dims.iter().product();
        let mut frame_shape = Vec::with_capacity(batch.shape.len());
        frame_shape.push(1);
        frame_shape.extend_from_slice(frame_dims);

        let mut data = Vec::new();
        let mut units = 0;
        for row in 0..rows {
            let chunk = batch.data[row * stride..(row + 1) * stride].to_vec();
            let input = CanTensor::from_vec(chunk, frame_shape.clone(), &self.device)?;
            let output = self.net.forward(&input)?;
            let scores = output.flatten_all()?.to_vec1::<f32>()?;
            units = scores.len();
            data.extend_from_slice(&scores);
        }
        Tensor::new(vec![rows, units], data).map_err(InferError::from)
    }
}
