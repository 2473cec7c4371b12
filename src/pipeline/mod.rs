//! End-to-end digit pipelines.
//!
//! A [`DigitPipeline`] is the application context: it is built once, from a
//! [`Checkpoint`] or by [`train`], and then passed by reference to whatever
//! needs predictions. It owns the feature transform (PCA, raw pixels or Sobel
//! edges) as a trait object, so the classifier never depends on a concrete
//! reducer.
//!
//! # Example
//!
//! ```
//! use eigendigit::pipeline::{train, FeatureKind, PipelineConfig};
//! use eigendigit::preprocessing::ImageBatch;
//! use eigendigit::primitives::Matrix;
//!
//! // Four 2x2 "images": dark ones are class 0, bright ones class 1
//! let pixels = Matrix::from_vec(4, 4, vec![
//!     0.0, 10.0, 0.0, 5.0,
//!     5.0, 0.0, 10.0, 0.0,
//!     250.0, 240.0, 255.0, 245.0,
//!     255.0, 250.0, 240.0, 255.0,
//! ]).unwrap();
//! let images = ImageBatch::from_matrix(pixels);
//! let labels = [0, 0, 1, 1];
//!
//! let config = PipelineConfig {
//!     feature_kind: FeatureKind::Raw,
//!     n_classes: 2,
//!     epochs: 200,
//!     learning_rate: 0.5,
//!     ..PipelineConfig::default()
//! };
//! let outcome = train(&config, &images, &labels).unwrap();
//! assert_eq!(outcome.pipeline.predict(&images).unwrap(), labels);
//! ```

mod config;
mod dataset;

pub use config::{FeatureKind, PipelineConfig};
pub use dataset::LabeledImages;

use crate::classification::SoftmaxRegression;
use crate::decomposition::PCA;
use crate::error::{EigenError, Result};
use crate::metrics::{evaluate_multiclass, MulticlassReport};
use crate::preprocessing::{normalize_pixels, square_side, ImageBatch, RawPixels, SobelEdges};
use crate::primitives::Matrix;
use crate::serialization::Checkpoint;
use crate::traits::{FeatureTransform, Transformer};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// A trained feature transform plus softmax classifier.
pub struct DigitPipeline {
    transform: Box<dyn FeatureTransform>,
    classifier: SoftmaxRegression,
    checkpoint: Checkpoint,
    input_dim: usize,
}

impl fmt::Debug for DigitPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigitPipeline")
            .field("feature_kind", &self.checkpoint.feature_kind)
            .field("input_dim", &self.input_dim)
            .field("n_classes", &self.classifier.n_classes())
            .finish_non_exhaustive()
    }
}

impl DigitPipeline {
    /// Assembles a pipeline from persisted parameters.
    ///
    /// # Errors
    ///
    /// Returns [`EigenError::MissingKey`] when a PCA checkpoint carries no
    /// mean or basis, and [`EigenError::ShapeError`] when the transform's
    /// output width disagrees with the classifier weights.
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Result<Self> {
        let classifier =
            SoftmaxRegression::from_parameters(checkpoint.weights.clone(), checkpoint.bias.clone())?;
        let n_features = checkpoint.weights.n_rows();

        let (transform, input_dim): (Box<dyn FeatureTransform>, usize) = match checkpoint.feature_kind {
            FeatureKind::Pca => {
                let mean = checkpoint.mean.clone().ok_or_else(|| EigenError::missing_key("mu"))?;
                let basis = checkpoint.basis.clone().ok_or_else(|| EigenError::missing_key("U_m"))?;
                let input_dim = basis.n_rows();
                (Box::new(PCA::from_parameters(mean, basis)?), input_dim)
            }
            FeatureKind::Raw => (Box::new(RawPixels), n_features),
            FeatureKind::Sobel => {
                let side = checkpoint
                    .image_side
                    .or_else(|| square_side(n_features))
                    .ok_or_else(|| {
                        EigenError::format(format!(
                            "sobel checkpoint with {n_features} features has no square image side"
                        ))
                    })?;
                (Box::new(SobelEdges::new(side)), n_features)
            }
        };

        // Every transform must feed exactly the rows of the weight matrix
        let produced = transform.output_dim(input_dim);
        if produced != Some(n_features) {
            return Err(EigenError::ShapeError {
                expected: format!("{n_features} features from the {} transform", checkpoint.feature_kind),
                actual: produced.map_or_else(
                    || "a width that overflows usize".to_string(),
                    |d| format!("{d} features"),
                ),
            });
        }

        debug!(
            feature_kind = %checkpoint.feature_kind,
            input_dim,
            n_features,
            "pipeline assembled"
        );
        Ok(Self {
            transform,
            classifier,
            checkpoint,
            input_dim,
        })
    }

    /// Loads a checkpoint file and assembles the pipeline.
    ///
    /// # Errors
    ///
    /// See [`Checkpoint::load`] and [`Self::from_checkpoint`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_checkpoint(Checkpoint::load(path)?)
    }

    /// Writes the pipeline's checkpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.checkpoint.save(path)
    }

    /// Transform in front of the classifier.
    #[must_use]
    pub fn feature_kind(&self) -> FeatureKind {
        self.checkpoint.feature_kind
    }

    /// Pixels per image the pipeline expects.
    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Side of the square input images, recorded or inferred.
    #[must_use]
    pub fn image_side(&self) -> Option<usize> {
        self.checkpoint.image_side.or_else(|| square_side(self.input_dim))
    }

    /// Number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.classifier.n_classes()
    }

    /// The underlying classifier.
    #[must_use]
    pub fn classifier(&self) -> &SoftmaxRegression {
        &self.classifier
    }

    /// Persistable parameters.
    #[must_use]
    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    /// Normalises pixels and applies the feature transform.
    ///
    /// # Errors
    ///
    /// Returns [`EigenError::ShapeError`] when images have the wrong number
    /// of pixels.
    pub fn features(&self, images: &ImageBatch) -> Result<Matrix<f64>> {
        let mut x = images.pixels().clone();
        if x.n_cols() != self.input_dim {
            return Err(EigenError::shape("pixels per image", self.input_dim, x.n_cols()));
        }
        normalize_pixels(&mut x);
        self.transform.transform(&x)
    }

    /// Predicted class per image.
    ///
    /// # Errors
    ///
    /// See [`Self::features`].
    pub fn predict(&self, images: &ImageBatch) -> Result<Vec<usize>> {
        self.classifier.predict(&self.features(images)?)
    }

    /// Class probabilities per image, `n_images x n_classes`.
    ///
    /// # Errors
    ///
    /// See [`Self::features`].
    pub fn predict_proba(&self, images: &ImageBatch) -> Result<Matrix<f64>> {
        self.classifier.predict_proba(&self.features(images)?)
    }

    /// Predicts `images` and scores the result against `labels`.
    ///
    /// # Errors
    ///
    /// Returns an error on empty input, a label count mismatch, or labels
    /// outside `[0, n_classes)`.
    pub fn evaluate(&self, images: &ImageBatch, labels: &[usize]) -> Result<MulticlassReport> {
        if images.is_empty() {
            return Err(EigenError::empty_input("evaluation images"));
        }
        if labels.len() != images.len() {
            return Err(EigenError::shape("n_labels", images.len(), labels.len()));
        }
        let predictions = self.predict(images)?;
        evaluate_multiclass(&predictions, labels, self.n_classes())
    }
}

/// Result of [`train`].
#[derive(Debug)]
pub struct TrainingOutcome {
    /// Ready-to-use pipeline
    pub pipeline: DigitPipeline,
    /// Cross-entropy of every epoch
    pub loss_history: Vec<f64>,
    /// Share of variance kept by each principal component (PCA only)
    pub explained_variance_ratio: Option<Vec<f64>>,
    /// Accuracy on the training images
    pub train_accuracy: f64,
}

/// Fits the configured transform and classifier on labelled images.
///
/// Pixels are normalised first (divided by 255 when the batch looks raw).
///
/// # Errors
///
/// Returns an error for invalid configuration, empty input, a label count
/// mismatch, out-of-range labels, or a PCA component count larger than the
/// number of pixels.
pub fn train(config: &PipelineConfig, images: &ImageBatch, labels: &[usize]) -> Result<TrainingOutcome> {
    config.validate()?;
    if images.is_empty() {
        return Err(EigenError::empty_input("training images"));
    }
    if labels.len() != images.len() {
        return Err(EigenError::shape("n_labels", images.len(), labels.len()));
    }

    let mut x = images.pixels().clone();
    let scaled = normalize_pixels(&mut x);
    let image_side = config.image_side.or_else(|| images.image_side());
    info!(
        n_samples = x.n_rows(),
        n_pixels = x.n_cols(),
        feature_kind = %config.feature_kind,
        scaled,
        "training pipeline"
    );

    let mut mean = None;
    let mut basis = None;
    let mut explained_variance_ratio = None;
    let features = match config.feature_kind {
        FeatureKind::Pca => {
            let mut pca = PCA::new(config.n_components);
            let z = pca.fit_transform(&x)?;
            explained_variance_ratio = pca.explained_variance_ratio();
            mean = pca.mean().map(<[f64]>::to_vec);
            basis = pca.projection_basis().cloned();
            z
        }
        FeatureKind::Raw => x,
        FeatureKind::Sobel => {
            let side = image_side.ok_or_else(|| {
                EigenError::format(format!(
                    "sobel features need square images, got {} pixels per image",
                    images.pixels().n_cols()
                ))
            })?;
            SobelEdges::new(side).transform(&x)?
        }
    };

    let mut classifier = SoftmaxRegression::new(config.n_classes)
        .with_learning_rate(config.learning_rate)
        .with_epochs(config.epochs);
    classifier.fit(&features, labels)?;
    let train_accuracy = classifier.score(&features, labels)?;

    let (weights, bias) = match (classifier.weights(), classifier.bias()) {
        (Some(w), Some(b)) => (w.clone(), b.clone()),
        _ => return Err(EigenError::NotFitted { model: "SoftmaxRegression" }),
    };
    let checkpoint = Checkpoint {
        weights,
        bias,
        mean,
        basis,
        feature_kind: config.feature_kind,
        image_side,
    };

    Ok(TrainingOutcome {
        pipeline: DigitPipeline::from_checkpoint(checkpoint)?,
        loss_history: classifier.loss_history().to_vec(),
        explained_variance_ratio,
        train_accuracy,
    })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
