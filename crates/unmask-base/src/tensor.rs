use std::fmt;

#[derive(Debug, PartialEq)]
pub enum TensorError {
    ShapeOverflow,
    ShapeMismatch { expected: usize, got: usize },
    StackMismatch { expected: Vec<usize>, got: Vec<usize> },
    EmptyStack,
}

impl fmt::Display for TensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorError::ShapeOverflow => write!(f, "shape dimensions overflow when multiplied"),
            TensorError::ShapeMismatch { expected, got } => {
                write!(f, "shape mismatch: expected {expected} elements, got {got}")
            }
            TensorError::StackMismatch { expected, got } => {
                write!(f, "stack mismatch: expected shape {expected:?}, got {got:?}")
            }
            TensorError::EmptyStack => write!(f, "cannot stack an empty list of tensors"),
        }
    }
}

impl std::error::Error for TensorError {}

/// A dense n-dimensional array: a shape plus flat row-major data.
#[derive(Clone, PartialEq)]
pub struct Tensor<T> {
    pub shape: Vec<usize>,
    pub data: Vec<T>,
}

impl<T: fmt::Debug> fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("data", &self.data)
            .finish()
    }
}

impl<T> Tensor<T> {
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> Result<Self, TensorError> {
        let product = checked_product(&shape)?;
        if product != data.len() {
            return Err(TensorError::ShapeMismatch {
                expected: product,
                got: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T: Default + Clone> Tensor<T> {
    pub fn zeros(shape: Vec<usize>) -> Result<Self, TensorError> {
        let product = checked_product(&shape)?;
        let data = vec![T::default(); product];
        Ok(Self { shape, data })
    }
}

impl<T: Clone> Tensor<T> {
    /// Stack tensors of identical shape along a new leading batch axis.
    ///
    /// Output shape is `[N, ...shape]` and the batch order matches the input
    /// order. Mixed shapes are rejected; an empty input is rejected (an empty
    /// batch has no well-defined element shape).
    pub fn stack(tensors: &[Tensor<T>]) -> Result<Self, TensorError> {
        let first = tensors.first().ok_or(TensorError::EmptyStack)?;
        let mut shape = Vec::with_capacity(first.shape.len() + 1);
        shape.push(tensors.len());
        shape.extend_from_slice(&first.shape);

        let mut data = Vec::with_capacity(first.data.len() * tensors.len());
        for tensor in tensors {
            if tensor.shape != first.shape {
                return Err(TensorError::StackMismatch {
                    expected: first.shape.clone(),
                    got: tensor.shape.clone(),
                });
            }
            data.extend_from_slice(&tensor.data);
        }
        Ok(Self { shape, data })
    }
}

fn checked_product(shape: &[usize]) -> Result<usize, TensorError> {
    let mut product: usize = 1;
    for &dim in shape {
        product = product.checked_mul(dim).ok_or(TensorError::ShapeOverflow)?;
    }
    Ok(product)
}
