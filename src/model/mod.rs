//! Model module for the VGG architectures built with the Burn framework.

pub mod vgg;

// Re-export main types for convenience
pub use vgg::{Vgg, VggConfig, VggVariant};

/// Default dropout rate in the classifier head
pub const DEFAULT_DROPOUT: f64 = 0.5;
