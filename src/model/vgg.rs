//! VGG Model Architecture
//!
//! This module implements the VGG family (VGG-11/13/16/19) using the Burn
//! framework: stacks of 3x3 convolutions with ReLU and 2x2 max-pooling,
//! followed by a three-layer fully connected classifier head producing
//! class logits.

use burn::{
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Initializer, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    tensor::{backend::Backend, Tensor},
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Flattened feature dimension entering the classifier: 512 channels at 7x7
/// after five pooling stages on 224x224 input
const CLASSIFIER_INPUT: usize = 512 * 7 * 7;

/// Hidden width of the fully connected classifier
const CLASSIFIER_WIDTH: usize = 4096;

/// One entry of a VGG layer plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// 3x3 convolution to the given channel count
    Conv(usize),
    /// 2x2 max-pool, halving the spatial resolution
    Pool,
}

use Stage::{Conv, Pool};

const VGG11: &[Stage] = &[
    Conv(64), Pool,
    Conv(128), Pool,
    Conv(256), Conv(256), Pool,
    Conv(512), Conv(512), Pool,
    Conv(512), Conv(512), Pool,
];

const VGG13: &[Stage] = &[
    Conv(64), Conv(64), Pool,
    Conv(128), Conv(128), Pool,
    Conv(256), Conv(256), Pool,
    Conv(512), Conv(512), Pool,
    Conv(512), Conv(512), Pool,
];

const VGG16: &[Stage] = &[
    Conv(64), Conv(64), Pool,
    Conv(128), Conv(128), Pool,
    Conv(256), Conv(256), Conv(256), Pool,
    Conv(512), Conv(512), Conv(512), Pool,
    Conv(512), Conv(512), Conv(512), Pool,
];

const VGG19: &[Stage] = &[
    Conv(64), Conv(64), Pool,
    Conv(128), Conv(128), Pool,
    Conv(256), Conv(256), Conv(256), Conv(256), Pool,
    Conv(512), Conv(512), Conv(512), Conv(512), Pool,
    Conv(512), Conv(512), Conv(512), Conv(512), Pool,
];

/// The supported VGG depths
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VggVariant {
    Vgg11,
    Vgg13,
    Vgg16,
    Vgg19,
}

impl VggVariant {
    fn plan(&self) -> &'static [Stage] {
        match self {
            VggVariant::Vgg11 => VGG11,
            VggVariant::Vgg13 => VGG13,
            VggVariant::Vgg16 => VGG16,
            VggVariant::Vgg19 => VGG19,
        }
    }

    /// Number of convolutional layers in this variant
    pub fn conv_layers(&self) -> usize {
        self.plan()
            .iter()
            .filter(|s| matches!(s, Conv(_)))
            .count()
    }
}

impl std::fmt::Display for VggVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VggVariant::Vgg11 => write!(f, "vgg11"),
            VggVariant::Vgg13 => write!(f, "vgg13"),
            VggVariant::Vgg16 => write!(f, "vgg16"),
            VggVariant::Vgg19 => write!(f, "vgg19"),
        }
    }
}

/// Configuration for a VGG classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VggConfig {
    /// Which layer plan to build
    pub variant: VggVariant,
    /// Number of output classes
    pub num_classes: usize,
    /// Dropout rate in the classifier head
    pub dropout: f64,
    /// Number of input channels (3 for RGB)
    pub in_channels: usize,
}

impl VggConfig {
    pub fn new(variant: VggVariant, num_classes: usize) -> Self {
        Self {
            variant,
            num_classes,
            dropout: 0.5,
            in_channels: 3,
        }
    }

    /// Build the model on the given device
    pub fn init<B: Backend>(&self, device: &B::Device) -> Vgg<B> {
        Vgg::new(self, device)
    }
}

/// A convolution block: 3x3 Conv2d, ReLU, and an optional 2x2 MaxPool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    relu: Relu,
    pool: Option<MaxPool2d>,
}

impl<B: Backend> ConvBlock<B> {
    fn new(in_channels: usize, out_channels: usize, with_pool: bool, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .with_initializer(Initializer::XavierUniform { gain: 1.0 })
            .init(device);

        let pool = if with_pool {
            Some(MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init())
        } else {
            None
        };

        Self {
            conv,
            relu: Relu::new(),
            pool,
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.relu.forward(x);

        match &self.pool {
            Some(pool) => pool.forward(x),
            None => x,
        }
    }
}

/// VGG image classifier producing logits from a batch of 224x224 images
#[derive(Module, Debug)]
pub struct Vgg<B: Backend> {
    features: Vec<ConvBlock<B>>,
    fc1: Linear<B>,
    drop1: Dropout,
    fc2: Linear<B>,
    drop2: Dropout,
    fc3: Linear<B>,
    num_classes: usize,
}

impl<B: Backend> Vgg<B> {
    /// Create a new VGG model from configuration
    pub fn new(config: &VggConfig, device: &B::Device) -> Self {
        // Fold the layer plan into conv blocks, attaching each pool to the
        // convolution preceding it
        let mut blocks: Vec<(usize, bool)> = Vec::new();
        for stage in config.variant.plan() {
            match stage {
                Conv(channels) => blocks.push((*channels, false)),
                Pool => {
                    if let Some(last) = blocks.last_mut() {
                        last.1 = true;
                    }
                }
            }
        }

        let mut features = Vec::with_capacity(blocks.len());
        let mut in_channels = config.in_channels;
        for (out_channels, with_pool) in blocks {
            features.push(ConvBlock::new(in_channels, out_channels, with_pool, device));
            in_channels = out_channels;
        }

        let initializer = Initializer::XavierUniform { gain: 1.0 };
        let fc1 = LinearConfig::new(CLASSIFIER_INPUT, CLASSIFIER_WIDTH)
            .with_initializer(initializer.clone())
            .init(device);
        let fc2 = LinearConfig::new(CLASSIFIER_WIDTH, CLASSIFIER_WIDTH)
            .with_initializer(initializer.clone())
            .init(device);
        let fc3 = LinearConfig::new(CLASSIFIER_WIDTH, config.num_classes)
            .with_initializer(initializer)
            .init(device);

        Self {
            features,
            fc1,
            drop1: DropoutConfig::new(config.dropout).init(),
            fc2,
            drop2: DropoutConfig::new(config.dropout).init(),
            fc3,
            num_classes: config.num_classes,
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, 224, 224]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = x;
        for block in &self.features {
            x = block.forward(x);
        }

        // Flatten: [B, 512, 7, 7] -> [B, 512 * 7 * 7]
        let [batch_size, channels, height, width] = x.dims();
        let x = x.reshape([batch_size, channels * height * width]);

        let x = self.fc1.forward(x);
        let x = Relu::new().forward(x);
        let x = self.drop1.forward(x);

        let x = self.fc2.forward(x);
        let x = Relu::new().forward(x);
        let x = self.drop2.forward(x);

        self.fc3.forward(x)
    }

    /// Get the number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_conv_layer_counts() {
        assert_eq!(VggVariant::Vgg11.conv_layers(), 8);
        assert_eq!(VggVariant::Vgg13.conv_layers(), 10);
        assert_eq!(VggVariant::Vgg16.conv_layers(), 13);
        assert_eq!(VggVariant::Vgg19.conv_layers(), 16);
    }

    #[test]
    fn test_plans_have_five_pool_stages() {
        for variant in [
            VggVariant::Vgg11,
            VggVariant::Vgg13,
            VggVariant::Vgg16,
            VggVariant::Vgg19,
        ] {
            let pools = variant.plan().iter().filter(|s| **s == Pool).count();
            assert_eq!(pools, 5, "{variant} should have 5 pooling stages");
        }
    }

    #[test]
    fn test_variant_display() {
        assert_eq!(VggVariant::Vgg16.to_string(), "vgg16");
        assert_eq!(VggVariant::Vgg11.to_string(), "vgg11");
    }

    #[test]
    fn test_conv_block_pooling_halves_resolution() {
        let device = Default::default();
        let block = ConvBlock::<TestBackend>::new(3, 8, true, &device);

        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 16, 16], &device);
        let output = block.forward(input);

        assert_eq!(output.dims(), [1, 8, 8, 8]);
    }

    #[test]
    fn test_conv_block_without_pool_keeps_resolution() {
        let device = Default::default();
        let block = ConvBlock::<TestBackend>::new(3, 4, false, &device);

        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 16, 16], &device);
        let output = block.forward(input);

        assert_eq!(output.dims(), [2, 4, 16, 16]);
    }

    #[test]
    #[ignore = "full VGG forward is slow on the CPU backend"]
    fn test_vgg_output_shape() {
        let device = Default::default();
        let config = VggConfig::new(VggVariant::Vgg11, 6);
        let model = Vgg::<TestBackend>::new(&config, &device);

        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 224, 224], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [1, 6]);
    }
}
