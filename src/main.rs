//! VGG Image Classification Training CLI
//!
//! Trains a VGG classifier on a directory of class-labeled images using the
//! Burn framework, logging per-epoch metrics and keeping the best model
//! checkpoint on disk.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::info;

use vggnet::backend::{self, TrainingBackend};
use vggnet::training::{run_training, TrainRunConfig};
use vggnet::utils::logging::init_logging;
use vggnet::VggVariant;

/// Train VGG image classifiers on class-labeled image directories
#[derive(Parser, Debug)]
#[command(name = "vggnet")]
#[command(version)]
#[command(about = "VGG image-classification training driver", long_about = None)]
struct Args {
    /// Number of output classes
    #[arg(long, default_value = "6")]
    num_classes: usize,

    /// Number of training epochs
    #[arg(long, default_value = "50")]
    epochs: usize,

    /// Batch size
    #[arg(long, default_value = "128")]
    batch_size: usize,

    /// Base learning rate
    #[arg(long, default_value = "0.01")]
    lr: f64,

    /// Final learning rate as a fraction of the base rate
    #[arg(long, default_value = "0.01")]
    lrf: f64,

    /// Weight decay
    #[arg(long, default_value = "0.05")]
    wd: f64,

    /// Root directory of the dataset (one subdirectory per class)
    #[arg(long, default_value = "./datasets")]
    data_path: PathBuf,

    /// Model variant to train
    #[arg(long, value_enum, default_value = "vgg16")]
    model_name: VggVariant,

    /// Initial weights to load before training (optional)
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Compute device (cpu, cuda or cuda:N)
    #[arg(long, default_value = "cuda:0")]
    device: String,

    /// Random seed for splits and shuffling
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Directory for metrics and checkpoints
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose).context("Failed to initialize logging")?;

    println!(
        "{}",
        format!("vggnet {} ({})", vggnet::VERSION, backend::backend_name())
            .green()
            .bold()
    );

    let device = backend::resolve_device(&args.device).context("Failed to resolve compute device")?;
    info!("Device: {device:?}");

    let config = TrainRunConfig {
        num_classes: args.num_classes,
        epochs: args.epochs,
        batch_size: args.batch_size,
        base_lr: args.lr,
        lr_floor_fraction: args.lrf,
        weight_decay: args.wd,
        data_dir: args.data_path,
        variant: args.model_name,
        initial_weights: args.weights,
        seed: args.seed,
        log_dir: args.log_dir,
    };

    let best = run_training::<TrainingBackend>(&config, device).context("Training failed")?;

    println!(
        "{} best validation accuracy: {:.2}%",
        "Finished Training.".green().bold(),
        best * 100.0
    );

    Ok(())
}
