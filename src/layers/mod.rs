//! Layer abstractions
//!
//! This module provides the `Layer` and `LastLayer` traits and the softmax
//! classification layer that terminates a layer chain.

mod r#trait;
pub mod softmax;

// Re-export the traits for convenience
pub use r#trait::{BackwardTarget, LastLayer, Layer};
pub use softmax::{SoftmaxForward, SoftmaxLayer};
