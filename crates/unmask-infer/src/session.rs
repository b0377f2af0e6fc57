use crate::InferError;
use unmask_base::Tensor;

/// A loaded model ready to score frame batches.
///
/// `run` takes one batch in the backend's input layout and returns the raw
/// head output, shape `[n, units]` or `[n]`.
pub trait Session: Send {
    fn run(&mut self, batch: &Tensor<f32>) -> Result<Tensor<f32>, InferError>;
}
