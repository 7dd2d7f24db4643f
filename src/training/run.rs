//! Training Loop
//!
//! Drives the per-epoch cycle: run the epoch runner in training mode, then
//! in evaluation mode, advance the cosine schedule, emit the scalar metrics
//! for the epoch, and persist the weights whenever validation accuracy
//! improves. Phases are strictly sequential; the only branch is the
//! checkpoint decision.

use std::path::PathBuf;
use std::time::Instant;

use burn::data::dataloader::DataLoaderBuilder;
use burn::module::{AutodiffModule, Module};
use burn::optim::decay::WeightDecayConfig;
use burn::optim::momentum::MomentumConfig;
use burn::optim::SgdConfig;
use burn::record::CompactRecorder;
use burn::tensor::backend::AutodiffBackend;
use tracing::info;

use crate::dataset::source::{ImageSource, VisionBatcher};
use crate::dataset::split::{DatasetSplit, SplitConfig};
use crate::dataset::transform::Transform;
use crate::model::vgg::{Vgg, VggConfig, VggVariant};
use crate::training::checkpoint::{BestCheckpoint, CheckpointMeta};
use crate::training::epoch::{eval_epoch, train_epoch};
use crate::training::schedule::CosineSchedule;
use crate::utils::error::{Error, Result};
use crate::utils::format_duration;
use crate::utils::metrics::{EpochScalars, MetricsLogger};
use crate::IMAGE_SIZE;

/// Hard cap on data-loader workers
const MAX_LOADER_WORKERS: usize = 8;

/// SGD momentum
const MOMENTUM: f64 = 0.9;

/// Fraction of each class held out for validation
const VAL_FRACTION: f64 = 0.2;

/// Configuration of a full training run
#[derive(Debug, Clone)]
pub struct TrainRunConfig {
    /// Number of output classes; must match the dataset
    pub num_classes: usize,
    /// Number of training epochs
    pub epochs: usize,
    /// Batch size
    pub batch_size: usize,
    /// Base learning rate
    pub base_lr: f64,
    /// Final learning rate as a fraction of the base rate
    pub lr_floor_fraction: f64,
    /// Weight decay (L2 penalty)
    pub weight_decay: f64,
    /// Root directory of the class-labeled dataset
    pub data_dir: PathBuf,
    /// Which VGG variant to train
    pub variant: VggVariant,
    /// Optional initial weights to load before training
    pub initial_weights: Option<PathBuf>,
    /// Random seed for splits and shuffling
    pub seed: u64,
    /// Directory for metrics, class indices, and checkpoints
    pub log_dir: PathBuf,
}

impl Default for TrainRunConfig {
    fn default() -> Self {
        Self {
            num_classes: 6,
            epochs: 50,
            batch_size: 128,
            base_lr: 0.01,
            lr_floor_fraction: 0.01,
            weight_decay: 5e-2,
            data_dir: PathBuf::from("./datasets"),
            variant: VggVariant::Vgg16,
            initial_weights: None,
            seed: 42,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl TrainRunConfig {
    /// Reject invalid flag values before any work starts
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::Config("Number of epochs must be greater than 0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("Batch size must be greater than 0".to_string()));
        }
        if self.num_classes == 0 {
            return Err(Error::Config("Number of classes must be greater than 0".to_string()));
        }
        if self.base_lr <= 0.0 {
            return Err(Error::Config("Learning rate must be positive".to_string()));
        }
        if self.lr_floor_fraction <= 0.0 || self.lr_floor_fraction > 1.0 {
            return Err(Error::Config(format!(
                "Final learning-rate fraction must be in (0, 1], got {}",
                self.lr_floor_fraction
            )));
        }
        if self.weight_decay < 0.0 {
            return Err(Error::Config("Weight decay must be non-negative".to_string()));
        }
        Ok(())
    }
}

/// Run a full training loop; returns the best validation accuracy.
pub fn run_training<B: AutodiffBackend>(config: &TrainRunConfig, device: B::Device) -> Result<f64> {
    config.validate()?;
    B::seed(config.seed);

    info!(
        "Training {} for {} epochs on {}",
        config.variant,
        config.epochs,
        config.data_dir.display()
    );

    // Split the dataset and record the label mapping
    let split = DatasetSplit::from_root(
        &config.data_dir,
        &SplitConfig {
            val_fraction: VAL_FRACTION,
            seed: config.seed,
        },
    )?;

    if split.num_classes() != config.num_classes {
        return Err(Error::Config(format!(
            "--num-classes is {} but the dataset contains {} classes",
            config.num_classes,
            split.num_classes()
        )));
    }
    if split.val.is_empty() {
        return Err(Error::Dataset(
            "Validation split is empty; add more images per class".to_string(),
        ));
    }

    std::fs::create_dir_all(&config.log_dir)?;
    split.write_class_indices(&config.log_dir.join("class_indices.json"))?;

    // Data loaders: shuffled training batches, fixed validation order.
    // Decoding runs on a bounded worker pool purely for throughput.
    let workers = loader_workers(config.batch_size);
    info!("Using {workers} data loader workers");

    let train_source = ImageSource::new(split.train.clone(), Transform::train(IMAGE_SIZE as u32));
    let val_source = ImageSource::new(split.val.clone(), Transform::eval(IMAGE_SIZE as u32));

    let train_loader = DataLoaderBuilder::new(VisionBatcher::<B>::new(device.clone(), IMAGE_SIZE))
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(workers)
        .build(train_source);

    let val_loader =
        DataLoaderBuilder::new(VisionBatcher::<B::InnerBackend>::new(device.clone(), IMAGE_SIZE))
            .batch_size(config.batch_size)
            .num_workers(workers)
            .build(val_source);

    // Model, optimizer, schedule
    let model_config = VggConfig::new(config.variant, config.num_classes);
    let mut model: Vgg<B> = model_config.init(&device);

    if let Some(weights) = &config.initial_weights {
        if !weights.exists() {
            return Err(Error::Config(format!(
                "Initial weights file does not exist: {}",
                weights.display()
            )));
        }
        model = model
            .load_file(weights.clone(), &CompactRecorder::new(), &device)
            .map_err(|e| {
                Error::Model(format!(
                    "Failed to load initial weights from {}: {e:?}",
                    weights.display()
                ))
            })?;
        info!("Loaded initial weights from {}", weights.display());
    }

    let mut optimizer = SgdConfig::new()
        .with_momentum(Some(MomentumConfig::new().with_momentum(MOMENTUM)))
        .with_weight_decay(Some(WeightDecayConfig::new(config.weight_decay)))
        .init();

    let mut schedule = CosineSchedule::new(config.base_lr, config.lr_floor_fraction, config.epochs);
    let mut metrics = MetricsLogger::create(&config.log_dir)?;
    let mut best = BestCheckpoint::new(&config.log_dir.join("weights"))?;

    let started = Instant::now();

    for epoch in 0..config.epochs {
        info!("Epoch {}/{}", epoch + 1, config.epochs);

        let lr = schedule.lr();
        let (updated, train_report) = train_epoch(model, &mut optimizer, &train_loader, lr, epoch)?;
        model = updated;

        let val_report = eval_epoch(&model.valid(), &val_loader)?;

        schedule.step();

        metrics.log_epoch(&EpochScalars {
            epoch,
            train_loss: train_report.loss,
            train_acc: train_report.accuracy,
            val_loss: val_report.loss,
            val_acc: val_report.accuracy,
            learning_rate: schedule.lr(),
        })?;

        if best.observe(val_report.accuracy) {
            best.save(
                &model,
                CheckpointMeta::new(epoch, val_report.accuracy, config.variant, config.num_classes),
            )?;
        }
    }

    metrics.finish()?;

    info!(
        "Finished training in {} | best validation accuracy: {:.4}",
        format_duration(started.elapsed().as_secs_f64()),
        best.best_accuracy()
    );

    Ok(best.best_accuracy())
}

/// Worker pool size: bounded by CPU count, batch size, and a hard cap
pub(crate) fn loader_workers(batch_size: usize) -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cpus.min(batch_size.max(1)).min(MAX_LOADER_WORKERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainRunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_epochs() {
        let config = TrainRunConfig {
            epochs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_lr() {
        let config = TrainRunConfig {
            base_lr: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TrainRunConfig {
            lr_floor_fraction: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_loader_workers_bounds() {
        assert_eq!(loader_workers(1), 1);
        assert!(loader_workers(128) <= MAX_LOADER_WORKERS);
        assert!(loader_workers(128) >= 1);
    }
}
