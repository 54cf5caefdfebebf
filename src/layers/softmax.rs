//! Softmax classification layer
//!
//! Terminal layer for N mutually exclusive classes. The forward pass turns N logits
//! into a probability distribution; the backward pass takes the true class, returns
//! the negative log-likelihood `-ln(p_label)` and writes `p_i - [i == label]` into
//! the input gradients.
//!
//! Each forward pass produces an owned [`SoftmaxForward`] record. Callers that
//! manage their own per-example state use [`SoftmaxLayer::evaluate`] and
//! [`SoftmaxForward::backward`] directly; pipelines driving the layer through the
//! [`Layer`]/[`LastLayer`] traits get the most recent record cached on the layer.

use crate::error::{LayerError, Result};
use crate::layers::{BackwardTarget, LastLayer, Layer};
use crate::utils::activations::{argmax, softmax_with_log};
use crate::volume::{Shape, Volume};
use tracing::{debug, trace, warn};

const LAYER_NAME: &str = "softmax";

/// Convert a class label delivered as a float into an index.
///
/// Rejects NaN, infinities, fractional values and anything outside
/// `[0, class_count)`.
///
/// # Examples
///
/// ```
/// use softmax_classifier::layers::softmax::validate_label;
///
/// assert_eq!(validate_label(2.0, 3).unwrap(), 2);
/// assert!(validate_label(2.5, 3).is_err());
/// assert!(validate_label(3.0, 3).is_err());
/// ```
pub fn validate_label(label: f64, class_count: usize) -> Result<usize> {
    let invalid = LayerError::InvalidLabel { label, class_count };
    if !label.is_finite() || label.fract() != 0.0 || label < 0.0 {
        return Err(invalid);
    }
    if label >= class_count as f64 {
        return Err(invalid);
    }
    Ok(label as usize)
}

/// Result of one forward pass: the class distribution for a single example.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftmaxForward {
    probabilities: Vec<f64>,
    log_probabilities: Vec<f64>,
}

impl SoftmaxForward {
    /// Compute the distribution for `logits`, rejecting NaN and infinite entries.
    pub fn from_logits(logits: &[f64]) -> Result<Self> {
        if let Some((index, &value)) = logits.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(LayerError::NonFiniteInput { index, value });
        }
        let (probabilities, log_probabilities) = softmax_with_log(logits);
        Ok(Self {
            probabilities,
            log_probabilities,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(probabilities: Vec<f64>, log_probabilities: Vec<f64>) -> Self {
        Self {
            probabilities,
            log_probabilities,
        }
    }

    pub fn class_count(&self) -> usize {
        self.probabilities.len()
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn log_probabilities(&self) -> &[f64] {
        &self.log_probabilities
    }

    /// Copy the distribution into a flat `1 × 1 × N` volume.
    pub fn to_volume(&self) -> Volume {
        Volume::from_values(self.probabilities.clone())
    }

    /// Most probable class. Ties resolve to the lowest index.
    pub fn predicted_class(&self) -> Option<usize> {
        argmax(&self.probabilities)
    }

    /// Negative log-likelihood of `label`.
    ///
    /// Read from the log-probabilities rather than `ln(p)`, so the loss stays finite
    /// when `p_label` underflows to zero for widely spread logits. Records built by
    /// `from_logits` always have finite log-probabilities; the `NonFiniteLoss` check
    /// only guards records whose contents did not come from finite logits.
    pub fn loss(&self, label: usize) -> Result<f64> {
        let log_p = self
            .log_probabilities
            .get(label)
            .copied()
            .ok_or(LayerError::InvalidLabel {
                label: label as f64,
                class_count: self.class_count(),
            })?;

        let loss = -log_p;
        if !loss.is_finite() {
            warn!(label, loss, "non-finite softmax loss");
            return Err(LayerError::NonFiniteLoss { label });
        }
        Ok(loss)
    }

    /// Write the loss gradient into `input` and return the loss.
    ///
    /// `input` is the volume whose logits produced this record. Its existing
    /// gradients are cleared first, then slot i receives `p_i - [i == label]`.
    /// On error the input is left untouched.
    pub fn backward(&self, input: &mut Volume, label: usize) -> Result<f64> {
        let loss = self.loss(label)?;
        if input.len() != self.class_count() {
            return Err(LayerError::ShapeMismatch {
                expected: self.class_count(),
                actual: input.len(),
            });
        }

        input.zero_gradients();
        for (i, &p) in self.probabilities.iter().enumerate() {
            let indicator = if i == label { 1.0 } else { 0.0 };
            input.set_gradient(i, p - indicator);
        }

        trace!(label, loss, "softmax backward");
        Ok(loss)
    }
}

/// Softmax classifier over `class_count` classes.
///
/// Has no trainable parameters. Output shape is always `1 × 1 × N`.
///
/// # Example
///
/// ```
/// use softmax_classifier::layers::{BackwardTarget, LastLayer, Layer, SoftmaxLayer};
/// use softmax_classifier::volume::Volume;
///
/// let mut layer = SoftmaxLayer::new(3).unwrap();
/// layer.init(1, 1, 3).unwrap();
///
/// let mut input = Volume::from_values(vec![1.0, 2.0, 3.0]);
/// let probs = layer.forward(&input, true).unwrap();
/// assert!((probs.weights().iter().sum::<f64>() - 1.0).abs() < 1e-12);
///
/// let loss = layer.backward(&mut input, BackwardTarget::Label(2.0)).unwrap();
/// assert!((loss - 0.4076).abs() < 1e-4);
/// ```
#[derive(Debug, Clone)]
pub struct SoftmaxLayer {
    class_count: usize,
    input_shape: Option<Shape>,
    output_shape: Option<Shape>,
    last_forward: Option<SoftmaxForward>,
}

impl SoftmaxLayer {
    /// Create a layer for `class_count` classes. Zero classes is rejected.
    pub fn new(class_count: usize) -> Result<Self> {
        if class_count == 0 {
            return Err(LayerError::InvalidClassCount);
        }
        Ok(Self {
            class_count,
            input_shape: None,
            output_shape: None,
            last_forward: None,
        })
    }

    pub fn class_count(&self) -> usize {
        self.class_count
    }

    pub fn input_shape(&self) -> Option<Shape> {
        self.input_shape
    }

    /// Record of the most recent `forward` call, cleared by `init`.
    pub fn last_forward(&self) -> Option<&SoftmaxForward> {
        self.last_forward.as_ref()
    }

    /// Predicted class of the most recent `forward` call.
    pub fn prediction(&self) -> Option<usize> {
        self.last_forward.as_ref().and_then(SoftmaxForward::predicted_class)
    }

    /// Compute the class distribution for `input` without touching the layer's cache.
    pub fn evaluate(&self, input: &Volume) -> Result<SoftmaxForward> {
        let output_shape = self.output_shape.ok_or(LayerError::NotInitialized)?;
        let expected = output_shape.depth;
        if input.len() != expected {
            return Err(LayerError::ShapeMismatch {
                expected,
                actual: input.len(),
            });
        }
        SoftmaxForward::from_logits(input.weights())
    }
}

impl Layer for SoftmaxLayer {
    fn init(
        &mut self,
        input_width: usize,
        input_height: usize,
        input_depth: usize,
    ) -> Result<()> {
        let invalid_shape = LayerError::InvalidShape {
            width: input_width,
            height: input_height,
            depth: input_depth,
        };
        if input_width == 0 || input_height == 0 || input_depth == 0 {
            return Err(invalid_shape);
        }
        let input_shape = Shape::new(input_width, input_height, input_depth);
        let input_count = input_shape.checked_element_count().ok_or(invalid_shape)?;
        if input_count != self.class_count {
            return Err(LayerError::ShapeMismatch {
                expected: self.class_count,
                actual: input_count,
            });
        }

        self.input_shape = Some(input_shape);
        self.output_shape = Some(Shape::flat(input_count));
        self.last_forward = None;

        debug!(
            input_width,
            input_height, input_depth, output_depth = input_count, "softmax layer initialized"
        );
        Ok(())
    }

    fn forward(&mut self, input: &Volume, _is_training: bool) -> Result<Volume> {
        let record = self.evaluate(input)?;
        trace!(
            classes = record.class_count(),
            predicted = ?record.predicted_class(),
            "softmax forward"
        );
        let output = record.to_volume();
        self.last_forward = Some(record);
        Ok(output)
    }

    fn input_size(&self) -> usize {
        self.input_shape.map_or(0, |shape| shape.element_count())
    }

    fn output_shape(&self) -> Option<Shape> {
        self.output_shape
    }

    fn parameter_count(&self) -> usize {
        0
    }
}

impl LastLayer for SoftmaxLayer {
    fn backward(&mut self, input: &mut Volume, target: BackwardTarget<'_>) -> Result<f64> {
        match target {
            BackwardTarget::Label(y) => {
                let label = validate_label(y, self.class_count)?;
                let record = self
                    .last_forward
                    .as_ref()
                    .ok_or(LayerError::MissingForwardState)?;
                record.backward(input, label)
            }
            BackwardTarget::Values(_) | BackwardTarget::Upstream => Err(LayerError::Unsupported {
                layer: LAYER_NAME,
                operation: target.describe(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initialized(class_count: usize) -> SoftmaxLayer {
        let mut layer = SoftmaxLayer::new(class_count).unwrap();
        layer.init(1, 1, class_count).unwrap();
        layer
    }

    #[test]
    fn test_new_rejects_zero_classes() {
        assert_eq!(SoftmaxLayer::new(0).unwrap_err(), LayerError::InvalidClassCount);
    }

    #[test]
    fn test_init_flattens_input_shape() {
        let mut layer = SoftmaxLayer::new(12).unwrap();
        layer.init(2, 3, 2).unwrap();
        assert_eq!(layer.input_size(), 12);
        assert_eq!(layer.output_shape(), Some(Shape::new(1, 1, 12)));
        assert_eq!(layer.input_shape(), Some(Shape::new(2, 3, 2)));
        assert_eq!(layer.parameter_count(), 0);
    }

    #[test]
    fn test_init_rejects_zero_dimension() {
        let mut layer = SoftmaxLayer::new(3).unwrap();
        assert!(matches!(
            layer.init(1, 0, 3),
            Err(LayerError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_init_rejects_count_different_from_classes() {
        let mut layer = SoftmaxLayer::new(3).unwrap();
        assert_eq!(
            layer.init(1, 1, 4).unwrap_err(),
            LayerError::ShapeMismatch {
                expected: 3,
                actual: 4
            }
        );
        assert_eq!(layer.output_shape(), None);
    }

    #[test]
    fn test_init_is_idempotent_and_clears_cache() {
        let mut layer = initialized(3);
        layer
            .forward(&Volume::from_values(vec![0.0, 1.0, 2.0]), false)
            .unwrap();
        assert!(layer.last_forward().is_some());

        layer.init(1, 1, 3).unwrap();
        assert_eq!(layer.output_shape(), Some(Shape::flat(3)));
        assert!(layer.last_forward().is_none());
    }

    #[test]
    fn test_forward_before_init() {
        let mut layer = SoftmaxLayer::new(2).unwrap();
        let err = layer.forward(&Volume::from_values(vec![0.0, 0.0]), false);
        assert_eq!(err.unwrap_err(), LayerError::NotInitialized);
    }

    #[test]
    fn test_forward_rejects_wrong_length() {
        let mut layer = initialized(3);
        let err = layer.forward(&Volume::from_values(vec![0.0, 0.0]), false);
        assert_eq!(
            err.unwrap_err(),
            LayerError::ShapeMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_forward_rejects_nan() {
        let mut layer = initialized(3);
        let err = layer
            .forward(&Volume::from_values(vec![0.0, f64::NAN, 1.0]), false)
            .unwrap_err();
        assert!(matches!(err, LayerError::NonFiniteInput { index: 1, .. }));
    }

    #[test]
    fn test_forward_ignores_training_flag() {
        let mut layer = initialized(4);
        let input = Volume::from_values(vec![0.5, -0.5, 2.0, 1.0]);
        let train = layer.forward(&input, true).unwrap();
        let infer = layer.forward(&input, false).unwrap();
        assert_eq!(train, infer);
    }

    #[test]
    fn test_evaluate_does_not_touch_cache() {
        let layer = initialized(2);
        let record = layer.evaluate(&Volume::from_values(vec![0.0, 0.0])).unwrap();
        assert_eq!(record.probabilities(), &[0.5, 0.5]);
        assert!(layer.last_forward().is_none());
    }

    #[test]
    fn test_prediction_follows_last_forward() {
        let mut layer = initialized(3);
        assert_eq!(layer.prediction(), None);
        layer
            .forward(&Volume::from_values(vec![0.1, 5.0, -2.0]), false)
            .unwrap();
        assert_eq!(layer.prediction(), Some(1));
    }

    #[test]
    fn test_validate_label() {
        assert_eq!(validate_label(0.0, 3).unwrap(), 0);
        assert_eq!(validate_label(2.0, 3).unwrap(), 2);
        for bad in [-1.0, 3.0, 1.5, f64::NAN, f64::INFINITY, -0.5] {
            assert!(
                matches!(validate_label(bad, 3), Err(LayerError::InvalidLabel { .. })),
                "label {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_backward_without_forward() {
        let mut layer = initialized(3);
        let mut input = Volume::from_values(vec![0.0; 3]);
        let err = layer
            .backward(&mut input, BackwardTarget::Label(1.0))
            .unwrap_err();
        assert_eq!(err, LayerError::MissingForwardState);
    }

    #[test]
    fn test_backward_rejects_wrong_input_length() {
        let mut layer = initialized(3);
        let input = Volume::from_values(vec![0.0, 1.0, 2.0]);
        layer.forward(&input, true).unwrap();

        let mut other = Volume::from_values(vec![0.0; 4]);
        other.set_gradient(0, 9.0);
        let err = layer
            .backward(&mut other, BackwardTarget::Label(0.0))
            .unwrap_err();
        assert!(matches!(err, LayerError::ShapeMismatch { expected: 3, actual: 4 }));
        assert_eq!(other.get_gradient(0), 9.0);
    }

    #[test]
    fn test_unsupported_targets() {
        let mut layer = initialized(2);
        let mut input = Volume::from_values(vec![0.0, 0.0]);
        layer.forward(&input, true).unwrap();

        let values = [1.0, 0.0];
        for target in [BackwardTarget::Values(&values), BackwardTarget::Upstream] {
            let err = layer.backward(&mut input, target).unwrap_err();
            assert!(matches!(err, LayerError::Unsupported { layer: "softmax", .. }));
        }
        assert_eq!(input.gradients(), &[0.0, 0.0]);
    }

    #[test]
    fn test_non_finite_loss_leaves_gradients_untouched() {
        let record =
            SoftmaxForward::from_parts(vec![0.0, 1.0], vec![f64::NEG_INFINITY, 0.0]);
        let mut input = Volume::from_values(vec![0.0, 0.0]);
        input.set_gradient(0, 7.0);

        assert_eq!(record.loss(0).unwrap_err(), LayerError::NonFiniteLoss { label: 0 });
        let err = record.backward(&mut input, 0).unwrap_err();
        assert_eq!(err, LayerError::NonFiniteLoss { label: 0 });
        assert_eq!(input.gradients(), &[7.0, 0.0]);

        assert_eq!(record.backward(&mut input, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_record_loss_rejects_out_of_range_index() {
        let record = SoftmaxForward::from_logits(&[0.0, 0.0]).unwrap();
        assert!(matches!(record.loss(2), Err(LayerError::InvalidLabel { .. })));
    }
}
