//! Pipeline configuration.

use crate::error::{EigenError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Transform placed in front of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    /// Project normalised pixels onto principal components
    #[default]
    Pca,
    /// Feed normalised pixels directly
    Raw,
    /// Sobel gradient magnitude of each image
    Sobel,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pca => "pca",
            Self::Raw => "raw",
            Self::Sobel => "sobel",
        })
    }
}

impl FromStr for FeatureKind {
    type Err = EigenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pca" => Ok(Self::Pca),
            "raw" => Ok(Self::Raw),
            "sobel" => Ok(Self::Sobel),
            other => Err(EigenError::InvalidHyperparameter {
                param: "feature_kind".to_string(),
                value: other.to_string(),
                constraint: "one of pca, raw, sobel".to_string(),
            }),
        }
    }
}

/// Training configuration of a digit pipeline.
///
/// Missing fields in a JSON file fall back to the defaults below.
///
/// ```
/// use eigendigit::pipeline::{FeatureKind, PipelineConfig};
///
/// let config: PipelineConfig = serde_json::from_str(r#"{"feature_kind": "sobel", "epochs": 50}"#).unwrap();
/// assert_eq!(config.feature_kind, FeatureKind::Sobel);
/// assert_eq!(config.epochs, 50);
/// assert_eq!(config.n_components, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Transform ahead of the classifier
    pub feature_kind: FeatureKind,
    /// PCA components (ignored for other kinds)
    pub n_components: usize,
    /// Gradient descent step size
    pub learning_rate: f64,
    /// Full-batch epochs
    pub epochs: usize,
    /// Number of classes
    pub n_classes: usize,
    /// Side of square input images; inferred from the data when absent
    pub image_side: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feature_kind: FeatureKind::Pca,
            n_components: 100,
            learning_rate: 0.1,
            epochs: 1000,
            n_classes: 10,
            image_side: None,
        }
    }
}

impl PipelineConfig {
    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Checks value ranges that don't depend on the data.
    ///
    /// # Errors
    ///
    /// Returns [`EigenError::InvalidHyperparameter`] for the first bad field.
    pub fn validate(&self) -> Result<()> {
        let bad = |param: &str, value: String, constraint: &str| {
            Err(EigenError::InvalidHyperparameter {
                param: param.to_string(),
                value,
                constraint: constraint.to_string(),
            })
        };
        if self.n_classes == 0 {
            return bad("n_classes", "0".to_string(), ">0");
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return bad("learning_rate", self.learning_rate.to_string(), "finite and >0");
        }
        if self.feature_kind == FeatureKind::Pca && self.n_components == 0 {
            return bad("n_components", "0".to_string(), ">0");
        }
        if self.image_side == Some(0) {
            return bad("image_side", "0".to_string(), ">0");
        }
        Ok(())
    }
}
