//! Burn Dataset and Batcher integration.
//!
//! `ImageSource` turns the (path, label) pairs produced by the splitter
//! into decoded, transformed tensors on demand; `VisionBatcher` stacks
//! items into a normalized batch for the model.

use std::path::{Path, PathBuf};

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use image::ImageReader;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dataset::transform::Transform;
use crate::utils::error::{Error, Result};

/// Channel normalization constants: inputs are scaled to [0, 1] and then
/// mapped to [-1, 1] via (x - mean) / std
const NORM_MEAN: f32 = 0.5;
const NORM_STD: f32 = 0.5;

/// A single decoded sample ready for batching
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VisionItem {
    /// Image data as flattened CHW float array [3 * H * W], in [0, 1]
    pub image: Vec<f32>,
    /// Class label index
    pub label: usize,
    /// Image path (for diagnostics)
    pub path: String,
}

impl VisionItem {
    /// Load an image from disk, apply the transform, and convert to CHW floats
    pub fn from_path(path: &Path, label: usize, transform: &Transform) -> Result<Self> {
        let img = ImageReader::open(path)
            .map_err(|e| Error::Image(path.to_path_buf(), e.to_string()))?
            .decode()
            .map_err(|e| Error::Image(path.to_path_buf(), e.to_string()))?;

        let img = transform.apply(img).to_rgb8();
        let size = transform.output_size() as usize;

        let mut image = vec![0.0f32; 3 * size * size];
        for y in 0..size {
            for x in 0..size {
                let pixel = img.get_pixel(x as u32, y as u32);
                image[y * size + x] = pixel[0] as f32 / 255.0;
                image[size * size + y * size + x] = pixel[1] as f32 / 255.0;
                image[2 * size * size + y * size + x] = pixel[2] as f32 / 255.0;
            }
        }

        Ok(Self {
            image,
            label,
            path: path.to_string_lossy().to_string(),
        })
    }

    /// Create from pre-decoded image data
    pub fn from_data(image: Vec<f32>, label: usize, path: String) -> Self {
        Self { image, label, path }
    }
}

/// Lazily decoding sample source implementing Burn's `Dataset` trait
#[derive(Debug, Clone)]
pub struct ImageSource {
    samples: Vec<(PathBuf, usize)>,
    transform: Transform,
}

impl ImageSource {
    pub fn new(samples: Vec<(PathBuf, usize)>, transform: Transform) -> Self {
        Self { samples, transform }
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }
}

impl Dataset<VisionItem> for ImageSource {
    fn get(&self, index: usize) -> Option<VisionItem> {
        let (path, label) = self.samples.get(index)?;

        match VisionItem::from_path(path, *label, &self.transform) {
            Ok(item) => Some(item),
            Err(e) => {
                // Unreadable images are skipped rather than aborting the run
                warn!("Skipping sample {}: {e}", path.display());
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// A batch of images and targets for one forward pass
#[derive(Clone, Debug)]
pub struct VisionBatch<B: Backend> {
    /// Images with shape [batch_size, 3, height, width], normalized
    pub images: Tensor<B, 4>,
    /// Labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher stacking `VisionItem`s into a `VisionBatch`
#[derive(Clone, Debug)]
pub struct VisionBatcher<B: Backend> {
    device: B::Device,
    image_size: usize,
}

impl<B: Backend> VisionBatcher<B> {
    pub fn new(device: B::Device, image_size: usize) -> Self {
        Self { device, image_size }
    }
}

impl<B: Backend> Batcher<VisionItem, VisionBatch<B>> for VisionBatcher<B> {
    fn batch(&self, items: Vec<VisionItem>) -> VisionBatch<B> {
        let batch_size = items.len();
        let side = self.image_size;

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, 3, side, side]),
            &self.device,
        );
        let images = images.sub_scalar(NORM_MEAN).div_scalar(NORM_STD);

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(targets_data, [batch_size]),
            &self.device,
        );

        VisionBatch { images, targets }
    }
}
