//! Training module
//!
//! This module provides:
//! - The epoch runner (one training or evaluation pass over a loader)
//! - The per-epoch training loop with scalar logging
//! - Cosine learning-rate scheduling
//! - Best-checkpoint tracking and persistence

pub mod checkpoint;
pub mod epoch;
pub mod run;
pub mod schedule;

// Re-export main types for convenience
pub use checkpoint::{BestCheckpoint, CheckpointMeta};
pub use epoch::{eval_epoch, train_epoch, EpochReport, EpochStats};
pub use run::{run_training, TrainRunConfig};
pub use schedule::CosineSchedule;
