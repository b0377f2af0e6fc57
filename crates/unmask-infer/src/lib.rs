pub mod aggregate;
pub mod backend;
pub mod backends;
pub mod catalog;
pub mod detector;
pub mod device;
pub mod error;
pub mod meso4;
pub mod modelsource;
pub mod preprocess;
pub mod registry;
pub mod score;
pub mod session;

pub use aggregate::{aggregate, Aggregate};
pub use backend::{backend_for, Backend, BackendKind, LoadedModel};
pub use catalog::{ModelCatalog, ModelSpec};
pub use detector::{Detector, Prediction};
pub use device::Device;
pub use error::InferError;
pub use modelsource::ModelSource;
pub use preprocess::{preprocess, TensorLayout};
pub use registry::DetectorRegistry;
pub use score::{extract, extract_series, HeadWidth};
pub use session::Session;
