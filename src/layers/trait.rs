//! Layer trait definitions
//!
//! `Layer` is the contract every layer in a chain provides: sizing from the upstream
//! shape and a forward transformation. `LastLayer` adds the backward pass for
//! terminal layers, which compute a loss from a training target instead of
//! receiving a gradient from a downstream layer.

use crate::error::Result;
use crate::volume::{Shape, Volume};

/// Core trait for layers in a feed-forward chain.
///
/// # Example
///
/// ```
/// use softmax_classifier::layers::{Layer, SoftmaxLayer};
/// use softmax_classifier::volume::Volume;
///
/// let mut layer = SoftmaxLayer::new(3).unwrap();
/// layer.init(1, 1, 3).unwrap();
/// let output = layer.forward(&Volume::from_values(vec![1.0, 2.0, 3.0]), false).unwrap();
/// assert_eq!(output.len(), 3);
/// ```
pub trait Layer {
    /// Derive this layer's output shape from the upstream output shape.
    ///
    /// # Arguments
    ///
    /// * `input_width` - Width of the volume produced by the upstream layer
    /// * `input_height` - Height of the volume produced by the upstream layer
    /// * `input_depth` - Depth of the volume produced by the upstream layer
    ///
    /// # Returns
    ///
    /// `Ok(())` once the input and output shapes are stored, or an error if the
    /// shape is unusable for this layer (zero dimension, wrong element count).
    ///
    /// # Notes
    ///
    /// - Must be called once before the first `forward`
    /// - Calling it again with the same arguments is harmless; with different
    ///   arguments it re-derives the shape
    /// - A successful call discards any state left over from earlier passes
    fn init(&mut self, input_width: usize, input_height: usize, input_depth: usize)
        -> Result<()>;

    /// Transform `input` into a newly allocated output volume.
    ///
    /// # Arguments
    ///
    /// * `input` - Activation volume from the upstream layer, holding
    ///   `input_size()` values
    /// * `is_training` - Whether this pass is part of training
    ///
    /// # Returns
    ///
    /// The output volume with shape `output_shape()`, or an error if the layer is
    /// not initialized or `input` has the wrong number of values.
    ///
    /// # Notes
    ///
    /// - `is_training` lets mode-dependent layers (dropout, batch norm) switch
    ///   behaviour; deterministic layers ignore it
    /// - Layers may keep whatever the backward pass needs from this call; a later
    ///   `forward` replaces it
    fn forward(&mut self, input: &Volume, is_training: bool) -> Result<Volume>;

    /// Number of input elements expected per example, 0 before `init`.
    fn input_size(&self) -> usize;

    /// Output shape, `None` before `init`.
    fn output_shape(&self) -> Option<Shape>;

    /// Number of trainable parameters.
    fn parameter_count(&self) -> usize;
}

/// Training target handed to a terminal layer's backward pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackwardTarget<'a> {
    /// Index of the true class, delivered as a float.
    Label(f64),
    /// Per-output regression target.
    Values(&'a [f64]),
    /// No target: the gradient arrives from a downstream layer.
    Upstream,
}

impl BackwardTarget<'_> {
    /// Short description used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            BackwardTarget::Label(_) => "backward with class label",
            BackwardTarget::Values(_) => "backward with target vector",
            BackwardTarget::Upstream => "backward without target",
        }
    }
}

/// Terminal layer that turns a training target into a loss and input gradients.
pub trait LastLayer: Layer {
    /// Compute the loss for `target` and write d(loss)/d(input) into the gradient
    /// slots of `input`.
    ///
    /// # Arguments
    ///
    /// * `input` - The volume passed to the preceding `forward`; its gradients are
    ///   overwritten
    /// * `target` - Training target for the current example
    ///
    /// # Returns
    ///
    /// The scalar loss for this example.
    ///
    /// # Notes
    ///
    /// - Must follow the `forward` call for the same example
    /// - Existing gradients on `input` are cleared before the new ones are written
    /// - Target kinds the layer has no meaning for fail with
    ///   `LayerError::Unsupported` and leave `input` untouched
    fn backward(&mut self, input: &mut Volume, target: BackwardTarget<'_>) -> Result<f64>;
}
