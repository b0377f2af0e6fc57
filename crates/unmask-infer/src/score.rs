use crate::InferError;
use unmask_base::Tensor;

/// Number of units in a model's classification head.
///
/// `One` is a single fake-logit squashed with a sigmoid; `Two` is a
/// `[real, fake]` logit pair turned into a fake probability with a softmax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadWidth {
    One,
    Two,
}

impl HeadWidth {
    pub fn units(&self) -> usize {
        match self {
            HeadWidth::One => 1,
            HeadWidth::Two => 2,
        }
    }

    pub fn from_units(units: usize) -> Option<HeadWidth> {
        match units {
            1 => Some(HeadWidth::One),
            2 => Some(HeadWidth::Two),
            _ => None,
        }
    }
}

/// Turn one frame's raw head output into a fake probability in `[0, 1]`.
pub fn extract(raw: &[f32], head: HeadWidth) -> Result<f32, InferError> {
    match head {
        HeadWidth::One => match raw {
            [logit] => Ok(sigmoid(*logit)),
            _ => Err(InferError::Shape(format!(
                "expected 1 logit, got {}",
                raw.len()
            ))),
        },
        HeadWidth::Two => match raw {
            [real, fake] => Ok(fake_probability(*real, *fake)),
            _ => Err(InferError::Shape(format!(
                "expected 2 logits, got {}",
                raw.len()
            ))),
        },
    }
}

/// Turn a batched head output of shape `[n, units]` (or `[n]` for a
/// single-unit head) into per-frame fake probabilities.
pub fn extract_series(output: &Tensor<f32>, head: HeadWidth) -> Result<Vec<f32>, InferError> {
    let units = head.units();
    let rows = match output.shape.as_slice() {
        [n] if units == 1 => *n,
        [n, u] if *u == units => *n,
        other => {
            return Err(InferError::Shape(format!(
                "expected output shape [n] or [n, {units}], got {other:?}"
            )));
        }
    };
    let mut scores = Vec::with_capacity(rows);
    for row in 0..rows {
        let start = row * units;
        scores.push(extract(&output.data[start..start + units], head)?);
    }
    Ok(scores)
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable two-class softmax, returning the fake-class mass.
fn fake_probability(real: f32, fake: f32) -> f32 {
    let m = real.max(fake);
    let e_real = (real - m).exp();
    let e_fake = (fake - m).exp();
    e_fake / (e_real + e_fake)
}
