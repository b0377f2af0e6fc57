pub mod graph;
pub mod onnx;
pub mod torch;

pub use graph::GraphBackend;
pub use onnx::OnnxBackend;
pub use torch::TorchBackend;
