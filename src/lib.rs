//! Softmax Classification Layer
//!
//! This library provides the terminal layer of a feed-forward classifier: a
//! numerically stable softmax over N class scores, and the negative log-likelihood
//! loss with its closed-form gradient with respect to those scores.
//!
//! # Modules
//!
//! - `layers`: Layer traits and the softmax classification layer
//! - `volume`: Activation container with per-value gradient slots
//! - `utils`: Slice-level softmax, log-softmax and argmax
//! - `config`: JSON classifier configuration
//! - `error`: Error types

pub mod config;
pub mod error;
pub mod layers;
pub mod utils;
pub mod volume;

pub use error::{ConfigError, LayerError, Result};
pub use layers::{BackwardTarget, LastLayer, Layer, SoftmaxForward, SoftmaxLayer};
pub use volume::{Shape, Volume};
