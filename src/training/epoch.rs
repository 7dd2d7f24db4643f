//! Epoch Runner
//!
//! Executes one full pass over a data loader: training mode runs forward,
//! loss, backward, and one optimizer step per batch; evaluation mode runs
//! the same forward and metric computation without gradients or updates.
//! Both modes accumulate loss and accuracy into per-epoch statistics.

use std::sync::Arc;

use burn::data::dataloader::DataLoader;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::{GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::ElementConversion;
use indicatif::{ProgressBar, ProgressStyle};

use crate::dataset::source::VisionBatch;
use crate::model::vgg::Vgg;
use crate::utils::error::{Error, Result};

/// Running loss/accuracy totals for one pass over the data
#[derive(Debug, Clone, Copy, Default)]
pub struct EpochStats {
    loss_sum: f64,
    correct: usize,
    samples: usize,
}

impl EpochStats {
    /// Fold in one batch. The batch-mean loss is weighted by the batch size
    /// so the final mean is per-sample even with a ragged last batch.
    pub fn record(&mut self, batch_mean_loss: f64, batch_correct: usize, batch_size: usize) {
        self.loss_sum += batch_mean_loss * batch_size as f64;
        self.correct += batch_correct;
        self.samples += batch_size;
    }

    /// Samples processed so far
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Accuracy over the batches processed so far (0.0 before any batch)
    pub fn running_accuracy(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.correct as f64 / self.samples as f64
        }
    }

    /// Finalize into (mean loss, accuracy); an empty pass is an error
    pub fn finish(self) -> Result<EpochReport> {
        if self.samples == 0 {
            return Err(Error::Dataset(
                "Epoch ran over an empty batch iterable".to_string(),
            ));
        }

        Ok(EpochReport {
            loss: self.loss_sum / self.samples as f64,
            accuracy: self.correct as f64 / self.samples as f64,
        })
    }
}

/// Final (mean loss, accuracy) pair for one pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    pub loss: f64,
    pub accuracy: f64,
}

fn batch_progress(total_items: usize) -> ProgressBar {
    let progress = ProgressBar::new(total_items as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("  [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );
    progress
}

/// Run one training epoch, returning the updated model and its report.
///
/// The model is moved through the optimizer step each batch and handed
/// back to the caller. A non-finite loss aborts the epoch immediately.
pub fn train_epoch<B, O>(
    model: Vgg<B>,
    optimizer: &mut O,
    loader: &Arc<dyn DataLoader<VisionBatch<B>>>,
    lr: f64,
    epoch: usize,
) -> Result<(Vgg<B>, EpochReport)>
where
    B: AutodiffBackend,
    O: Optimizer<Vgg<B>, B>,
{
    let mut model = model;
    let mut stats = EpochStats::default();
    let progress = batch_progress(loader.num_items());

    for (batch_index, batch) in loader.iter().enumerate() {
        let batch_size = batch.targets.dims()[0];

        let output = model.forward(batch.images.clone());
        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), batch.targets.clone());

        let loss_value: f64 = loss.clone().into_scalar().elem();
        if !loss_value.is_finite() {
            return Err(Error::Diverged {
                epoch,
                batch: batch_index,
            });
        }

        let predictions = output.argmax(1).squeeze::<1>(1);
        let batch_correct: i64 = predictions
            .equal(batch.targets.clone())
            .int()
            .sum()
            .into_scalar()
            .elem();
        stats.record(loss_value, batch_correct as usize, batch_size);

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optimizer.step(lr, model, grads);

        progress.inc(batch_size as u64);
        progress.set_message(format!(
            "loss={:.4} acc={:.2}%",
            loss_value,
            100.0 * stats.running_accuracy()
        ));
    }

    progress.finish_and_clear();
    let report = stats.finish()?;
    Ok((model, report))
}

/// Run one evaluation pass: same metrics, no gradients, no updates.
///
/// The caller passes the non-autodiff model (`model.valid()`), which also
/// leaves stochastic layers such as dropout inert.
pub fn eval_epoch<B: Backend>(
    model: &Vgg<B>,
    loader: &Arc<dyn DataLoader<VisionBatch<B>>>,
) -> Result<EpochReport> {
    let mut stats = EpochStats::default();
    let progress = batch_progress(loader.num_items());

    for batch in loader.iter() {
        let batch_size = batch.targets.dims()[0];

        let output = model.forward(batch.images.clone());
        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), batch.targets.clone());
        let loss_value: f64 = loss.into_scalar().elem();

        let predictions = output.argmax(1).squeeze::<1>(1);
        let batch_correct: i64 = predictions
            .equal(batch.targets)
            .int()
            .sum()
            .into_scalar()
            .elem();
        stats.record(loss_value, batch_correct as usize, batch_size);

        progress.inc(batch_size as u64);
        progress.set_message(format!(
            "loss={:.4} acc={:.2}%",
            loss_value,
            100.0 * stats.running_accuracy()
        ));
    }

    progress.finish_and_clear();
    stats.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pass_fails() {
        let stats = EpochStats::default();
        assert!(matches!(stats.finish(), Err(Error::Dataset(_))));
    }

    #[test]
    fn test_all_correct_batch_gives_full_accuracy() {
        let mut stats = EpochStats::default();
        stats.record(0.3, 16, 16);

        let report = stats.finish().unwrap();
        assert_eq!(report.accuracy, 1.0);
    }

    #[test]
    fn test_accuracy_stays_in_unit_interval() {
        let mut stats = EpochStats::default();
        stats.record(1.2, 3, 8);
        stats.record(0.8, 5, 8);

        let report = stats.finish().unwrap();
        assert!(report.accuracy >= 0.0 && report.accuracy <= 1.0);
        assert_eq!(report.accuracy, 0.5);
        assert!(report.loss >= 0.0 && report.loss.is_finite());
    }

    #[test]
    fn test_ragged_last_batch_weighting() {
        // Two full-size batches and a final single-sample batch: the mean
        // must be per-sample, not per-batch
        let mut stats = EpochStats::default();
        stats.record(1.0, 2, 2);
        stats.record(1.0, 1, 2);
        stats.record(4.0, 0, 1);

        let report = stats.finish().unwrap();
        assert!((report.loss - 8.0 / 5.0).abs() < 1e-12);
        assert!((report.accuracy - 3.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_running_accuracy() {
        let mut stats = EpochStats::default();
        assert_eq!(stats.running_accuracy(), 0.0);

        stats.record(0.5, 4, 8);
        assert_eq!(stats.running_accuracy(), 0.5);
        assert_eq!(stats.samples(), 8);
    }
}
