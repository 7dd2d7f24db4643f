//! Train/validation splitting for class-labeled image directories.
//!
//! The dataset root is expected to contain one subdirectory per class:
//!
//! ```text
//! root_dir/
//! ├── daisy/
//! │   ├── image1.jpg
//! │   └── image2.jpg
//! ├── dandelion/
//! │   └── ...
//! └── ...
//! ```
//!
//! Class indices are assigned in sorted directory-name order, and a seeded
//! fraction of every class is drawn into the validation set so the split is
//! reproducible for a given seed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::utils::error::{Error, Result};

/// File extensions considered images during the directory scan
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Configuration for dataset splitting
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of each class drawn into the validation set
    pub val_fraction: f64,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            val_fraction: 0.2,
            seed: 42,
        }
    }
}

impl SplitConfig {
    /// Validates the configured fractions
    pub fn validate(&self) -> Result<()> {
        if self.val_fraction <= 0.0 || self.val_fraction >= 1.0 {
            return Err(Error::Config(format!(
                "Validation fraction must be in (0, 1), got {}",
                self.val_fraction
            )));
        }
        Ok(())
    }
}

/// A train/validation partition of (path, label) samples
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    /// Training samples
    pub train: Vec<(PathBuf, usize)>,
    /// Validation samples
    pub val: Vec<(PathBuf, usize)>,
    /// Class names indexed by label
    pub class_names: Vec<String>,
}

impl DatasetSplit {
    /// Scan `root` and partition every class into train/validation samples
    pub fn from_root(root: &Path, config: &SplitConfig) -> Result<Self> {
        config.validate()?;

        if !root.exists() {
            return Err(Error::Config(format!(
                "Dataset directory does not exist: {}",
                root.display()
            )));
        }

        info!("Scanning dataset at {}", root.display());

        // Discover class directories in sorted order for stable labels
        let mut class_names: Vec<String> = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    class_names.push(name.to_string());
                }
            }
        }
        class_names.sort();

        if class_names.is_empty() {
            return Err(Error::Dataset(format!(
                "No class directories found under {}",
                root.display()
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut train = Vec::new();
        let mut val = Vec::new();

        for (label, class_name) in class_names.iter().enumerate() {
            let class_dir = root.join(class_name);
            let mut images: Vec<PathBuf> = WalkDir::new(&class_dir)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.path().to_path_buf())
                .filter(|p| is_image_file(p))
                .collect();

            if images.is_empty() {
                return Err(Error::Dataset(format!(
                    "Class '{class_name}' contains no images"
                )));
            }

            // Sort before shuffling so the draw depends only on the seed,
            // not on directory iteration order
            images.sort();
            images.shuffle(&mut rng);

            let val_count = (images.len() as f64 * config.val_fraction) as usize;
            debug!(
                "Class '{}' (label {}): {} images, {} for validation",
                class_name,
                label,
                images.len(),
                val_count
            );

            for (i, path) in images.into_iter().enumerate() {
                if i < val_count {
                    val.push((path, label));
                } else {
                    train.push((path, label));
                }
            }
        }

        if train.is_empty() {
            return Err(Error::Dataset(
                "Training split is empty; dataset is too small for the configured split"
                    .to_string(),
            ));
        }

        info!(
            "Found {} classes: {} training samples, {} validation samples",
            class_names.len(),
            train.len(),
            val.len()
        );

        Ok(Self {
            train,
            val,
            class_names,
        })
    }

    /// Number of discovered classes
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Write the label-to-class-name mapping as JSON
    pub fn write_class_indices(&self, path: &Path) -> Result<()> {
        let mapping: BTreeMap<usize, &str> = self
            .class_names
            .iter()
            .enumerate()
            .map(|(idx, name)| (idx, name.as_str()))
            .collect();

        let json = serde_json::to_string_pretty(&mapping)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use tempfile::TempDir;

    /// Build a dataset tree with the given number of images per class
    fn fake_dataset(classes: &[(&str, usize)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, count) in classes {
            let class_dir = dir.path().join(name);
            fs::create_dir_all(&class_dir).unwrap();
            for i in 0..*count {
                let img = RgbImage::new(2, 2);
                img.save(class_dir.join(format!("img_{i}.png"))).unwrap();
            }
        }
        dir
    }

    #[test]
    fn test_split_counts() -> Result<()> {
        let dir = fake_dataset(&[("daisy", 5), ("tulip", 10)]);
        let split = DatasetSplit::from_root(dir.path(), &SplitConfig::default())?;

        assert_eq!(split.num_classes(), 2);
        // 20% of 5 -> 1 val, 20% of 10 -> 2 val
        assert_eq!(split.val.len(), 3);
        assert_eq!(split.train.len(), 12);
        Ok(())
    }

    #[test]
    fn test_labels_follow_sorted_names() -> Result<()> {
        let dir = fake_dataset(&[("tulip", 3), ("daisy", 3)]);
        let split = DatasetSplit::from_root(dir.path(), &SplitConfig::default())?;

        assert_eq!(split.class_names, vec!["daisy", "tulip"]);
        for (path, label) in split.train.iter().chain(split.val.iter()) {
            let parent = path.parent().unwrap().file_name().unwrap().to_str().unwrap();
            assert_eq!(split.class_names[*label], parent);
        }
        Ok(())
    }

    #[test]
    fn test_split_is_deterministic() -> Result<()> {
        let dir = fake_dataset(&[("daisy", 8), ("tulip", 8)]);
        let config = SplitConfig {
            val_fraction: 0.25,
            seed: 7,
        };

        let a = DatasetSplit::from_root(dir.path(), &config)?;
        let b = DatasetSplit::from_root(dir.path(), &config)?;

        assert_eq!(a.train, b.train);
        assert_eq!(a.val, b.val);
        Ok(())
    }

    #[test]
    fn test_missing_root_fails() {
        let err = DatasetSplit::from_root(Path::new("/nonexistent/dataset"), &SplitConfig::default());
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_class_fails() {
        let dir = fake_dataset(&[("daisy", 3)]);
        fs::create_dir_all(dir.path().join("empty_class")).unwrap();

        let err = DatasetSplit::from_root(dir.path(), &SplitConfig::default());
        assert!(matches!(err, Err(Error::Dataset(_))));
    }

    #[test]
    fn test_invalid_fraction_fails() {
        let config = SplitConfig {
            val_fraction: 1.5,
            seed: 42,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_write_class_indices() -> Result<()> {
        let dir = fake_dataset(&[("daisy", 3), ("tulip", 3)]);
        let split = DatasetSplit::from_root(dir.path(), &SplitConfig::default())?;

        let out = dir.path().join("class_indices.json");
        split.write_class_indices(&out)?;

        let json = fs::read_to_string(&out)?;
        let mapping: BTreeMap<usize, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(mapping.get(&0).map(String::as_str), Some("daisy"));
        assert_eq!(mapping.get(&1).map(String::as_str), Some("tulip"));
        Ok(())
    }
}
