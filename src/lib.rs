//! # vggnet
//!
//! A training driver for VGG-style image classifiers built on the Burn
//! framework. The crate wires together dataset splitting, data augmentation,
//! the VGG model family, an SGD optimizer with a cosine learning-rate
//! schedule, a per-epoch train/validate loop, scalar metric logging, and
//! best-checkpoint saving.
//!
//! ## Modules
//!
//! - `dataset`: directory scanning, train/val splitting, image decoding,
//!   augmentation, and batch assembly
//! - `model`: VGG-11/13/16/19 architectures built with Burn
//! - `training`: the epoch runner, training loop, learning-rate schedule,
//!   and checkpointing
//! - `utils`: errors, logging, and the scalar metrics sink
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use vggnet::backend::TrainingBackend;
//! use vggnet::training::{run_training, TrainRunConfig};
//!
//! let config = TrainRunConfig::default();
//! let device = vggnet::backend::resolve_device("cpu")?;
//! let best_accuracy = run_training::<TrainingBackend>(&config, device)?;
//! ```

pub mod backend;
pub mod dataset;
pub mod model;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use dataset::source::{ImageSource, VisionBatch, VisionBatcher, VisionItem};
pub use dataset::split::{DatasetSplit, SplitConfig};
pub use model::vgg::{Vgg, VggConfig, VggVariant};
pub use training::checkpoint::BestCheckpoint;
pub use training::epoch::{EpochReport, EpochStats};
pub use training::schedule::CosineSchedule;
pub use training::{run_training, TrainRunConfig};
pub use utils::error::{Error, Result};
pub use utils::metrics::{EpochScalars, MetricsLogger, TrainingHistory};

/// Input resolution expected by the VGG family
pub const IMAGE_SIZE: usize = 224;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
