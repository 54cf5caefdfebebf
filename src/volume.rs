//! Activation volumes passed between layers
//!
//! A `Volume` owns a fixed-size block of values laid out as width × height × depth,
//! plus a parallel block of gradients of the same length. Layers read values during
//! the forward pass and write gradients during the backward pass.

/// Three-dimensional shape of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl Shape {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Flat shape `1 × 1 × depth`, the layout of per-class vectors.
    pub fn flat(depth: usize) -> Self {
        Self::new(1, 1, depth)
    }

    /// Total number of elements (width × height × depth).
    pub fn element_count(&self) -> usize {
        self.width * self.height * self.depth
    }

    /// Element count, or `None` if it does not fit in `usize`.
    pub fn checked_element_count(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(self.depth))
    }
}

/// Activation container: values plus one gradient slot per value.
///
/// # Example
///
/// ```
/// use softmax_classifier::volume::Volume;
///
/// let mut vol = Volume::from_values(vec![1.0, 2.0, 3.0]);
/// vol.set_gradient(1, 0.5);
/// assert_eq!(vol.get_weight(2), 3.0);
/// assert_eq!(vol.get_gradient(1), 0.5);
/// vol.zero_gradients();
/// assert_eq!(vol.gradients(), &[0.0, 0.0, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    shape: Shape,
    weights: Vec<f64>,
    weight_gradients: Vec<f64>,
}

impl Volume {
    /// Create a volume with every value set to `fill` and zero gradients.
    pub fn new(width: usize, height: usize, depth: usize, fill: f64) -> Self {
        let shape = Shape::new(width, height, depth);
        let len = shape.element_count();
        Self {
            shape,
            weights: vec![fill; len],
            weight_gradients: vec![0.0; len],
        }
    }

    /// Wrap a vector as a flat `1 × 1 × len` volume with zero gradients.
    pub fn from_values(values: Vec<f64>) -> Self {
        let len = values.len();
        Self {
            shape: Shape::flat(len),
            weights: values,
            weight_gradients: vec![0.0; len],
        }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn get_weight(&self, index: usize) -> f64 {
        self.weights[index]
    }

    pub fn set_weight(&mut self, index: usize, value: f64) {
        self.weights[index] = value;
    }

    pub fn get_gradient(&self, index: usize) -> f64 {
        self.weight_gradients[index]
    }

    pub fn set_gradient(&mut self, index: usize, value: f64) {
        self.weight_gradients[index] = value;
    }

    /// Reset every gradient slot to zero.
    pub fn zero_gradients(&mut self) {
        self.weight_gradients.fill(0.0);
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn gradients(&self) -> &[f64] {
        &self.weight_gradients
    }
}
