//! Error types for layer and configuration failures
//!
//! Every failure here is a local precondition violation: a caller passed the wrong
//! shape, label, or call sequence. None of them are transient.

use thiserror::Error;

/// Errors raised by layer construction, sizing, forward and backward passes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayerError {
    #[error("class count must be positive")]
    InvalidClassCount,

    #[error("invalid input shape {width}x{height}x{depth}: every dimension must be positive")]
    InvalidShape {
        width: usize,
        height: usize,
        depth: usize,
    },

    #[error("shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("layer used before init")]
    NotInitialized,

    #[error("non-finite input {value} at index {index}")]
    NonFiniteInput { index: usize, value: f64 },

    #[error("invalid label {label}: expected an integer in [0, {class_count})")]
    InvalidLabel { label: f64, class_count: usize },

    #[error("backward called without a matching forward pass")]
    MissingForwardState,

    #[error("loss for label {label} is not finite")]
    NonFiniteLoss { label: usize },

    #[error("unsupported operation for {layer} layer: {operation}")]
    Unsupported {
        layer: &'static str,
        operation: &'static str,
    },
}

/// Errors raised while loading or applying a classifier configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Layer(#[from] LayerError),
}

pub type Result<T> = std::result::Result<T, LayerError>;
