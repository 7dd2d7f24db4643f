//! Image transforms applied when a sample is loaded.
//!
//! Training samples get a random resized crop plus a random horizontal
//! flip; validation samples are only resized. Both pipelines end at a
//! square image of the configured size.

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use rand::Rng;

/// Area fraction range sampled by the random resized crop
const CROP_SCALE: (f64, f64) = (0.08, 1.0);

/// Aspect ratio range sampled by the random resized crop
const CROP_RATIO: (f64, f64) = (3.0 / 4.0, 4.0 / 3.0);

/// Number of crop attempts before falling back to a center crop
const CROP_ATTEMPTS: usize = 10;

/// A transform pipeline for one dataset split
#[derive(Debug, Clone, Copy)]
pub enum Transform {
    /// Random resized crop + horizontal flip, for training
    Train { size: u32 },
    /// Plain resize, for validation
    Eval { size: u32 },
}

impl Transform {
    pub fn train(size: u32) -> Self {
        Self::Train { size }
    }

    pub fn eval(size: u32) -> Self {
        Self::Eval { size }
    }

    /// Target side length of the output image
    pub fn output_size(&self) -> u32 {
        match self {
            Self::Train { size } | Self::Eval { size } => *size,
        }
    }

    /// Apply the pipeline, producing a `size`x`size` image
    pub fn apply(&self, img: DynamicImage) -> DynamicImage {
        match *self {
            Self::Train { size } => {
                let mut rng = rand::thread_rng();
                let img = random_resized_crop(img, size, &mut rng);
                if rng.gen_bool(0.5) {
                    img.fliph()
                } else {
                    img
                }
            }
            Self::Eval { size } => img.resize_exact(size, size, FilterType::Triangle),
        }
    }
}

/// Crop a random region covering 8-100% of the image area with a random
/// aspect ratio, then resize it to `size`x`size`.
fn random_resized_crop<R: Rng>(img: DynamicImage, size: u32, rng: &mut R) -> DynamicImage {
    let (width, height) = img.dimensions();
    let area = (width * height) as f64;

    for _ in 0..CROP_ATTEMPTS {
        let target_area = area * rng.gen_range(CROP_SCALE.0..=CROP_SCALE.1);
        let log_ratio = rng.gen_range(CROP_RATIO.0.ln()..=CROP_RATIO.1.ln());
        let ratio = log_ratio.exp();

        let crop_w = (target_area * ratio).sqrt().round() as u32;
        let crop_h = (target_area / ratio).sqrt().round() as u32;

        if crop_w == 0 || crop_h == 0 || crop_w > width || crop_h > height {
            continue;
        }

        let x = rng.gen_range(0..=width - crop_w);
        let y = rng.gen_range(0..=height - crop_h);
        let cropped = img.crop_imm(x, y, crop_w, crop_h);
        return cropped.resize_exact(size, size, FilterType::Triangle);
    }

    // Fallback: center crop of the largest square
    let side = width.min(height);
    let x = (width - side) / 2;
    let y = (height - side) / 2;
    img.crop_imm(x, y, side, side)
        .resize_exact(size, size, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_eval_resizes_to_target() {
        let img = DynamicImage::new_rgb8(100, 60);
        let out = Transform::eval(32).apply(img);
        assert_eq!(out.dimensions(), (32, 32));
    }

    #[test]
    fn test_train_output_is_square() {
        let img = DynamicImage::new_rgb8(100, 60);
        let out = Transform::train(32).apply(img);
        assert_eq!(out.dimensions(), (32, 32));
    }

    #[test]
    fn test_random_resized_crop_dimensions() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..20 {
            let img = DynamicImage::new_rgb8(64, 48);
            let out = random_resized_crop(img, 24, &mut rng);
            assert_eq!(out.dimensions(), (24, 24));
        }
    }

    #[test]
    fn test_crop_handles_tiny_images() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let img = DynamicImage::new_rgb8(2, 2);
        let out = random_resized_crop(img, 16, &mut rng);
        assert_eq!(out.dimensions(), (16, 16));
    }

    #[test]
    fn test_output_size() {
        assert_eq!(Transform::train(224).output_size(), 224);
        assert_eq!(Transform::eval(224).output_size(), 224);
    }
}
