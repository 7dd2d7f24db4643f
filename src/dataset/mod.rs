//! Dataset module: directory scanning, splitting, decoding, and batching.
//!
//! This module provides:
//! - Train/validation splitting over class-labeled image directories
//! - On-demand image decoding with per-split transform pipelines
//! - Batch assembly for the Burn data loader

pub mod source;
pub mod split;
pub mod transform;

// Re-export main types for convenience
pub use source::{ImageSource, VisionBatch, VisionBatcher, VisionItem};
pub use split::{DatasetSplit, SplitConfig};
pub use transform::Transform;
