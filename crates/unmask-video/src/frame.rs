use unmask_base::Tensor;

/// A single sampled video frame.
///
/// Pixels are BGR24 in a `[height, width, 3]` tensor. `index` is the
/// position of the frame in the decoded stream, counted from zero over
/// all decoded frames, not just the sampled ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub pixels: Tensor<u8>,
    pub index: u64,
}

impl Frame {
    pub fn height(&self) -> usize {
        self.pixels.shape[0]
    }

    pub fn width(&self) -> usize {
        self.pixels.shape[1]
    }
}
