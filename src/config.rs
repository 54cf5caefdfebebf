//! Classifier configuration
//!
//! This module loads the shape of a softmax classifier from a JSON file and builds
//! an initialized layer from it.

use crate::error::ConfigError;
use crate::layers::{Layer, SoftmaxLayer};
use crate::volume::Shape;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Configuration for a softmax classification layer.
///
/// `input_width` and `input_height` describe the shape of the upstream layer's
/// output and default to 1. `input_depth` defaults to whatever makes the flattened
/// input count equal `class_count`.
///
/// # Example
///
/// ```json
/// {
///   "class_count": 10,
///   "input_width": 1,
///   "input_height": 1,
///   "input_depth": 10
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassifierConfig {
    /// Number of mutually exclusive classes
    pub class_count: usize,

    /// Width of the upstream output (default 1)
    #[serde(default = "default_dimension")]
    pub input_width: usize,

    /// Height of the upstream output (default 1)
    #[serde(default = "default_dimension")]
    pub input_height: usize,

    /// Depth of the upstream output (default class_count / (width × height))
    pub input_depth: Option<usize>,
}

fn default_dimension() -> usize {
    1
}

fn overflow() -> ConfigError {
    ConfigError::Invalid("input dimensions overflow".to_string())
}

impl ClassifierConfig {
    /// Flat `1 × 1 × class_count` input, the usual case after a fully-connected layer.
    pub fn flat(class_count: usize) -> Self {
        Self {
            class_count,
            input_width: 1,
            input_height: 1,
            input_depth: None,
        }
    }

    /// Upstream shape the layer will be initialized with.
    pub fn input_shape(&self) -> Result<Shape, ConfigError> {
        let plane = self
            .input_width
            .checked_mul(self.input_height)
            .ok_or_else(overflow)?;
        let depth = match self.input_depth {
            Some(depth) => depth,
            None if plane > 0 && self.class_count % plane == 0 => self.class_count / plane,
            None => {
                return Err(ConfigError::Invalid(format!(
                    "class_count {} is not divisible by input_width × input_height = {}",
                    self.class_count, plane
                )))
            }
        };
        Ok(Shape::new(self.input_width, self.input_height, depth))
    }

    /// Construct a softmax layer and run its sizing step.
    pub fn build_layer(&self) -> Result<SoftmaxLayer, ConfigError> {
        let shape = self.input_shape()?;
        let mut layer = SoftmaxLayer::new(self.class_count)?;
        layer.init(shape.width, shape.height, shape.depth)?;
        Ok(layer)
    }
}

/// Loads a classifier configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it into a `ClassifierConfig` and checks
/// that the described shape is usable.
///
/// # Returns
///
/// `Ok(ClassifierConfig)` on success, or an error if the file cannot be read, the
/// JSON is invalid, or the shape is inconsistent.
///
/// # Examples
///
/// ```no_run
/// use softmax_classifier::config::load_config;
///
/// let cfg = load_config("config/softmax_mnist.json").unwrap();
/// assert_eq!(cfg.class_count, 10);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ClassifierConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: ClassifierConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    if config.class_count == 0 {
        return Err(ConfigError::Invalid("class_count must be positive".to_string()));
    }

    if config.input_width == 0 || config.input_height == 0 || config.input_depth == Some(0) {
        return Err(ConfigError::Invalid(
            "input dimensions must be positive".to_string(),
        ));
    }

    let shape = config.input_shape()?;
    let element_count = shape.checked_element_count().ok_or_else(overflow)?;
    if element_count != config.class_count {
        return Err(ConfigError::Invalid(format!(
            "input shape {}x{}x{} has {} elements, expected class_count {}",
            shape.width,
            shape.height,
            shape.depth,
            element_count,
            config.class_count
        )));
    }

    Ok(())
}
