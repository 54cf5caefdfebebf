//! Shared numeric helpers
//!
//! Slice-level softmax, log-softmax and argmax used by the classification layer.

pub mod activations;

pub use activations::{argmax, log_softmax, softmax, softmax_with_log};
