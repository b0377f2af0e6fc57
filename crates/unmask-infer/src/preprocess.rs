use crate::InferError;
use unmask_base::Tensor;
use unmask_video::Frame;

/// Memory layout of a preprocessed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[3, height, width]` per frame, for NCHW batches.
    ChannelFirst,
    /// `[height, width, 3]` per frame, for NHWC batches.
    ChannelLast,
}

/// Convert one sampled frame into a model input tensor.
///
/// The BGR pixels are resized to `size` (width, height) with bilinear
/// interpolation, reordered to RGB, and scaled to `[0, 1]`. The result has
/// no batch axis; stack frames with [`Tensor::stack`] to build one.
pub fn preprocess(
    frame: &Frame,
    size: (usize, usize),
    layout: TensorLayout,
) -> Result<Tensor<f32>, InferError> {
    let shape = &frame.pixels.shape;
    if shape.len() != 3 || shape[2] != 3 {
        return Err(InferError::Shape(format!(
            "expected HWC frame with 3 channels, got shape {shape:?}"
        )));
    }
    let (src_h, src_w) = (shape[0], shape[1]);
    if src_h == 0 || src_w == 0 {
        return Err(InferError::Shape(format!(
            "frame dimensions must be non-zero, got {src_w}x{src_h}"
        )));
    }
    let (width, height) = size;
    if width == 0 || height == 0 {
        return Err(InferError::Shape(format!(
            "target dimensions must be non-zero, got {width}x{height}"
        )));
    }

    let resized = resize_bilinear(&frame.pixels.data, (src_w, src_h), (width, height));

    // BGR -> RGB swap and scale to [0, 1] while writing in layout order.
    let mut data = vec![0.0f32; width * height * 3];
    match layout {
        TensorLayout::ChannelLast => {
            for i in 0..width * height {
                let base = i * 3;
                for channel in 0..3 {
                    data[base + (2 - channel)] = resized[base + channel] as f32 / 255.0;
                }
            }
            Tensor::new(vec![height, width, 3], data).map_err(InferError::from)
        }
        TensorLayout::ChannelFirst => {
            let plane = width * height;
            for i in 0..plane {
                let base = i * 3;
                for channel in 0..3 {
                    data[(2 - channel) * plane + i] = resized[base + channel] as f32 / 255.0;
                }
            }
            Tensor::new(vec![3, height, width], data).map_err(InferError::from)
        }
    }
}

/// Bilinear resize of packed HWC pixels with half-pixel centers aligned.
/// Interpolated values land back on the u8 grid.
fn resize_bilinear(pixels: &[u8], from: (usize, usize), to: (usize, usize)) -> Vec<u8> {
    let (src_w, src_h) = from;
    let (dst_w, dst_h) = to;
    if (src_w, src_h) == (dst_w, dst_h) {
        return pixels.to_vec();
    }
    let scale_x = src_w as f32 / dst_w as f32;
    let scale_y = src_h as f32 / dst_h as f32;
    let mut out = Vec::with_capacity(dst_w * dst_h * 3);
    for y in 0..dst_h {
        let sy = ((y as f32 + 0.5) * scale_y - 0.5).max(0.0);
        let y0 = (sy as usize).min(src_h - 1);
        let y1 = (y0 + 1).min(src_h - 1);
        let fy = sy - y0 as f32;
        for x in 0..dst_w {
            let sx = ((x as f32 + 0.5) * scale_x - 0.5).max(0.0);
            let x0 = (sx as usize).min(src_w - 1);
            let x1 = (x0 + 1).min(src_w - 1);
            let fx = sx - x0 as f32;
            for channel in 0..3 {
                let p00 = pixels[(y0 * src_w + x0) * 3 + channel] as f32;
                let p01 = pixels[(y0 * src_w + x1) * 3 + channel] as f32;
                let p10 = pixels[(y1 * src_w + x0) * 3 + channel] as f32;
                let p11 = pixels[(y1 * src_w + x1) * 3 + channel] as f32;
                let top = p00 + (p01 - p00) * fx;
                let bottom = p10 + (p11 - p10) * fx;
                out.push((top + (bottom - top) * fy).round() as u8);
            }
        }
    }
    out
}
