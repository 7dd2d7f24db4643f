//! Scalar Metrics Sink
//!
//! Records the five per-epoch scalar time series (train loss, train
//! accuracy, validation loss, validation accuracy, learning rate) to a CSV
//! file that can be tailed while a run is in progress, and keeps an
//! in-memory history that is serialized to JSON when the run completes.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::utils::error::{Error, Result};

/// The scalar values emitted for one epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochScalars {
    pub epoch: usize,
    pub train_loss: f64,
    pub train_acc: f64,
    pub val_loss: f64,
    pub val_acc: f64,
    pub learning_rate: f64,
}

/// Full training history, one entry per epoch in each series
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub train_loss: Vec<f64>,
    pub train_accuracy: Vec<f64>,
    pub val_loss: Vec<f64>,
    pub val_accuracy: Vec<f64>,
    pub learning_rate: Vec<f64>,
}

impl TrainingHistory {
    /// Number of recorded epochs
    pub fn len(&self) -> usize {
        self.train_loss.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train_loss.is_empty()
    }

    fn push(&mut self, scalars: &EpochScalars) {
        self.train_loss.push(scalars.train_loss);
        self.train_accuracy.push(scalars.train_acc);
        self.val_loss.push(scalars.val_loss);
        self.val_accuracy.push(scalars.val_acc);
        self.learning_rate.push(scalars.learning_rate);
    }
}

/// Per-epoch scalar logger writing to `<log_dir>/metrics.csv`
pub struct MetricsLogger {
    writer: BufWriter<File>,
    history: TrainingHistory,
    history_path: PathBuf,
}

impl MetricsLogger {
    /// Create the log directory if needed and start a fresh CSV file
    pub fn create(log_dir: &Path) -> Result<Self> {
        fs::create_dir_all(log_dir)?;

        let csv_path = log_dir.join("metrics.csv");
        let file = File::create(&csv_path)?;
        let mut writer = BufWriter::new(file);
        writeln!(
            writer,
            "epoch,train_loss,train_acc,val_loss,val_acc,learning_rate"
        )?;
        writer.flush()?;

        Ok(Self {
            writer,
            history: TrainingHistory::default(),
            history_path: log_dir.join("history.json"),
        })
    }

    /// Append one epoch's scalars and flush so the row is durable
    pub fn log_epoch(&mut self, scalars: &EpochScalars) -> Result<()> {
        writeln!(
            self.writer,
            "{},{:.6},{:.6},{:.6},{:.6},{:.8}",
            scalars.epoch,
            scalars.train_loss,
            scalars.train_acc,
            scalars.val_loss,
            scalars.val_acc,
            scalars.learning_rate
        )?;
        self.writer.flush()?;

        self.history.push(scalars);

        info!(
            "Epoch {}: train_loss={:.4}, train_acc={:.4}, val_loss={:.4}, val_acc={:.4}, lr={:.6}",
            scalars.epoch,
            scalars.train_loss,
            scalars.train_acc,
            scalars.val_loss,
            scalars.val_acc,
            scalars.learning_rate
        );

        Ok(())
    }

    /// Serialize the accumulated history to `<log_dir>/history.json`
    pub fn finish(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.history)
            .map_err(|e| Error::Serialization(format!("Failed to serialize history: {e}")))?;
        fs::write(&self.history_path, json)?;
        Ok(())
    }

    /// The history recorded so far
    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }
}
