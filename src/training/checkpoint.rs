//! Best-model tracking and weight persistence.
//!
//! The checkpoint on disk always corresponds to the highest validation
//! accuracy seen so far: weights are overwritten whenever the accuracy
//! strictly improves, and ties keep the earlier snapshot. A small JSON
//! sidecar records which epoch produced the weights.

use std::fs;
use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::backend::Backend;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::vgg::{Vgg, VggVariant};
use crate::utils::error::{Error, Result};

/// Metadata written next to the best-model weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub epoch: usize,
    pub val_accuracy: f64,
    pub model: VggVariant,
    pub num_classes: usize,
    pub timestamp: String,
}

impl CheckpointMeta {
    pub fn new(epoch: usize, val_accuracy: f64, model: VggVariant, num_classes: usize) -> Self {
        Self {
            epoch,
            val_accuracy,
            model,
            num_classes,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Tracks the best validation accuracy and persists the matching weights
pub struct BestCheckpoint {
    weights_path: PathBuf,
    meta_path: PathBuf,
    best_accuracy: f64,
}

impl BestCheckpoint {
    /// Create the weights directory if needed; best accuracy starts at 0.0
    pub fn new(weights_dir: &Path) -> Result<Self> {
        fs::create_dir_all(weights_dir)?;

        Ok(Self {
            weights_path: weights_dir.join("best_model"),
            meta_path: weights_dir.join("best_model.json"),
            best_accuracy: 0.0,
        })
    }

    /// Record a validation accuracy; returns whether it is a new best.
    /// Strictly-greater comparison keeps the earliest snapshot on ties.
    pub fn observe(&mut self, val_accuracy: f64) -> bool {
        if val_accuracy > self.best_accuracy {
            self.best_accuracy = val_accuracy;
            true
        } else {
            false
        }
    }

    /// Best validation accuracy seen so far
    pub fn best_accuracy(&self) -> f64 {
        self.best_accuracy
    }

    /// Path the weights are written to (the recorder appends its extension)
    pub fn weights_path(&self) -> &Path {
        &self.weights_path
    }

    /// Overwrite the on-disk weights and metadata sidecar
    pub fn save<B: Backend>(&self, model: &Vgg<B>, meta: CheckpointMeta) -> Result<()> {
        model
            .clone()
            .save_file(self.weights_path.clone(), &CompactRecorder::new())
            .map_err(|e| Error::Checkpoint(format!("Failed to save model weights: {e:?}")))?;

        let json = serde_json::to_string_pretty(&meta)?;
        fs::write(&self.meta_path, json)?;

        info!(
            "New best model at epoch {} (val_acc={:.4}), saved to {}",
            meta.epoch,
            meta.val_accuracy,
            self.weights_path.display()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_observe_tracks_maximum() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let mut best = BestCheckpoint::new(dir.path())?;

        // The accuracy sequence from a four-epoch run: exactly three
        // improvements (epochs 0, 1, 3)
        let accuracies = [0.10, 0.35, 0.20, 0.40];
        let decisions: Vec<bool> = accuracies.iter().map(|a| best.observe(*a)).collect();

        assert_eq!(decisions, vec![true, true, false, true]);
        assert_eq!(best.best_accuracy(), 0.40);
        Ok(())
    }

    #[test]
    fn test_ties_keep_the_earliest() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let mut best = BestCheckpoint::new(dir.path())?;

        assert!(best.observe(0.40));
        assert!(!best.observe(0.40));
        assert_eq!(best.best_accuracy(), 0.40);
        Ok(())
    }

    #[test]
    fn test_creates_weights_directory() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let weights_dir = dir.path().join("logs").join("weights");

        let best = BestCheckpoint::new(&weights_dir)?;
        assert!(weights_dir.exists());
        assert!(best.weights_path().starts_with(&weights_dir));
        Ok(())
    }

    #[test]
    fn test_meta_serialization() {
        let meta = CheckpointMeta::new(3, 0.87, VggVariant::Vgg16, 6);
        let json = serde_json::to_string(&meta).unwrap();
        let parsed: CheckpointMeta = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.epoch, 3);
        assert_eq!(parsed.val_accuracy, 0.87);
        assert_eq!(parsed.model, VggVariant::Vgg16);
    }
}
