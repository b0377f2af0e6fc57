use std::sync::Mutex;

use serde::Serialize;

use crate::aggregate::{aggregate, Aggregate};
use crate::backend::{backend_for, LoadedModel};
use crate::catalog::ModelSpec;
use crate::preprocess::{preprocess, TensorLayout};
use crate::score::{extract_series, HeadWidth};
use crate::{Device, InferError, ModelSource, Session};
use unmask_base::Tensor;
use unmask_video::Frame;

/// Per-frame fake probabilities for one video plus their aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub scores: Vec<f32>,
    pub aggregate: Aggregate,
}

/// A loaded detection model bound to one backend.
///
/// `predict` takes `&self`; the session is serialized behind a mutex so a
/// detector can be shared across threads.
pub struct Detector {
    model_name: String,
    backend_name: String,
    session: Mutex<Box<dyn Session>>,
    head: HeadWidth,
    layout: TensorLayout,
    input_size: (usize, usize),
}

impl Detector {
    pub fn new(spec: &ModelSpec, device: Device) -> Result<Self, InferError> {
        let backend = backend_for(spec.kind, device);
        let LoadedModel { session, head } =
            backend.load(ModelSource::File(spec.path.clone()), spec.input_size)?;
        Ok(Self {
            model_name: spec.name.clone(),
            backend_name: backend.name().to_string(),
            session: Mutex::new(session),
            head,
            layout: backend.input_layout(),
            input_size: spec.input_size,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn head(&self) -> HeadWidth {
        self.head
    }

    /// Score each frame and aggregate the series. An empty frame list
    /// yields an all-zero prediction without touching the session.
    pub fn predict(&self, frames: &[Frame]) -> Result<Prediction, InferError> {
        if frames.is_empty() {
            return Ok(Prediction {
                scores: Vec::new(),
                aggregate: aggregate(&[]),
            });
        }
        let mut inputs = Vec::with_capacity(frames.len());
        for frame in frames {
            inputs.push(preprocess(frame, self.input_size, self.layout)?);
        }
        let batch = Tensor::stack(&inputs)?;
        let output = {
            let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
            session.run(&batch)?
        };
        let scores = extract_series(&output, self.head)?;
        if scores.len() != frames.len() {
            return Err(InferError::Shape(format!(
                "model returned {} scores for {} frames",
                scores.len(),
                frames.len()
            )));
        }
        Ok(Prediction {
            aggregate: aggregate(&scores),
            scores,
        })
    }
}
