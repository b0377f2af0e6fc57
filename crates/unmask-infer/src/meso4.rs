use candle_core::{Result, Tensor};
use candle_nn::{
    batch_norm, conv2d, linear, BatchNorm, Conv2d, Conv2dConfig, Linear, Module, VarBuilder,
};

/// Compact four-block CNN for per-frame forgery scoring (MesoNet Meso4).
///
/// Four conv + batchnorm + maxpool stages shrink the input by 32x, then two
/// dense layers produce the head logits. The head stays raw here; turning
/// logits into probabilities belongs to the scoring layer.
#[derive(Debug)]
pub struct Meso4 {
    conv1: Conv2d,
    bn1: BatchNorm,
    conv2: Conv2d,
    bn2: BatchNorm,
    conv3: Conv2d,
    bn3: BatchNorm,
    conv4: Conv2d,
    bn4: BatchNorm,
    fc1: Linear,
    fc2: Linear,
}

impl Meso4 {
    /// Build the network for `input_size` (width, height) with `head_units`
    /// output logits. Input dimensions must be divisible by 32.
    pub fn load(vb: VarBuilder, input_size: (usize, usize), head_units: usize) -> Result<Self> {
        let (width, height) = input_size;
        let conv1 = conv2d(
            3,
            8,
            3,
            Conv2dConfig {
                padding: 1,
                ..Default::default()
            },
            vb.pp("conv1"),
        )?;
        let bn1 = batch_norm(8, 1e-3, vb.pp("bn1"))?;
        let conv2 = conv2d(
            8,
            8,
            5,
            Conv2dConfig {
                padding: 2,
                ..Default::default()
            },
            vb.pp("conv2"),
        )?;
        let bn2 = batch_norm(8, 1e-3, vb.pp("bn2"))?;
        let conv3 = conv2d(
            8,
            16,
            5,
            Conv2dConfig {
                padding: 2,
                ..Default::default()
            },
            vb.pp("conv3"),
        )?;
        let bn3 = batch_norm(16, 1e-3, vb.pp("bn3"))?;
        let conv4 = conv2d(
            16,
            16,
            5,
            Conv2dConfig {
                padding: 2,
                ..Default::default()
            },
            vb.pp("conv4"),
        )?;
        let bn4 = batch_norm(16, 1e-3, vb.pp("bn4"))?;
        let flat = 16 * (height / 32) * (width / 32);
        let fc1 = linear(flat, 16, vb.pp("fc1"))?;
        let fc2 = linear(16, head_units, vb.pp("fc2"))?;
        Ok(Self {
            conv1,
            bn1,
            conv2,
            bn2,
            conv3,
            bn3,
            conv4,
            bn4,
            fc1,
            fc2,
        })
    }
}

impl Module for Meso4 {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = xs
            .apply(&self.conv1)?
            .apply_t(&self.bn1, false)?
            .relu()?
            .max_pool2d(2)?;
        let xs = xs
            .apply(&self.conv2)?
            .apply_t(&self.bn2, false)?
            .relu()?
            .max_pool2d(2)?;
        let xs = xs
            .apply(&self.conv3)?
            .apply_t(&self.bn3, false)?
            .relu()?
            .max_pool2d(2)?;
        let xs = xs
            .apply(&self.conv4)?
            .apply_t(&self.bn4, false)?
            .relu()?
            .max_pool2d(4)?;
        let xs = xs.flatten_from(1)?;
        let xs = self.fc1.forward(&xs)?;
        let xs = candle_nn::ops::leaky_relu(&xs, 0.1)?;
        self.fc2.forward(&xs)
    }
}
