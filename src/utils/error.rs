//! Error Handling Module
//!
//! Defines the error taxonomy for the training driver.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for training operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading or decoding an image
    #[error("Failed to load image at {0:?}: {1}")]
    Image(PathBuf, String),

    /// Error scanning or splitting the dataset
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Error building or loading the model
    #[error("Model error: {0}")]
    Model(String),

    /// Invalid configuration or CLI flag value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad device string or unavailable backend
    #[error("Device error: {0}")]
    Device(String),

    /// Training produced a non-finite loss
    #[error("Non-finite loss at epoch {epoch}, batch {batch}: training diverged")]
    Diverged { epoch: usize, batch: usize },

    /// Failure persisting model weights or checkpoint metadata
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Convenience Result type for training operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Dataset("no class directories found".to_string());
        assert_eq!(err.to_string(), "Dataset error: no class directories found");
    }

    #[test]
    fn test_diverged_display() {
        let err = Error::Diverged { epoch: 3, batch: 17 };
        let msg = err.to_string();
        assert!(msg.contains("epoch 3"));
        assert!(msg.contains("batch 17"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
