//! Trained-pipeline checkpoints.
//!
//! Required arrays:
//! - `weights` (older archives: `W`): softmax weights, `n_features x n_classes`
//! - `b`: softmax bias, `n_classes`
//! - `mu`, `U_m`: PCA mean and projection basis, only for PCA pipelines
//!
//! The feature kind and image side are kept as `__metadata__` strings.
//! Archives without that metadata are read as PCA pipelines.

use super::safetensors::{self, NamedArrays, SafeTensorsFile, UserMetadata};
use crate::error::{EigenError, Result};
use crate::pipeline::FeatureKind;
use crate::primitives::{Matrix, Vector};
use std::path::Path;
use tracing::info;

const KEY_WEIGHTS: &str = "weights";
const KEY_WEIGHTS_LEGACY: &str = "W";
const KEY_BIAS: &str = "b";
const KEY_MEAN: &str = "mu";
const KEY_BASIS: &str = "U_m";
const META_FEATURE_KIND: &str = "feature_kind";
const META_IMAGE_SIDE: &str = "image_side";

/// Parameters of a trained pipeline as persisted on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    /// Softmax weight matrix, `n_features x n_classes`.
    pub weights: Matrix<f64>,
    /// Softmax bias vector.
    pub bias: Vector<f64>,
    /// PCA mean vector (PCA pipelines only).
    pub mean: Option<Vec<f64>>,
    /// PCA projection basis, `n_pixels x n_components` (PCA pipelines only).
    pub basis: Option<Matrix<f64>>,
    /// Transform placed in front of the classifier.
    pub feature_kind: FeatureKind,
    /// Side length of the square input images, when recorded.
    pub image_side: Option<usize>,
}

fn as_matrix(name: &str, values: Vec<f64>, shape: &[usize]) -> Result<Matrix<f64>> {
    match *shape {
        [rows, cols] => Matrix::from_vec(rows, cols, values),
        _ => Err(EigenError::ShapeError {
            expected: format!("2-D array for '{name}'"),
            actual: format!("shape {shape:?}"),
        }),
    }
}

impl Checkpoint {
    /// Extracts a checkpoint from an opened archive.
    ///
    /// # Errors
    ///
    /// Returns [`EigenError::MissingKey`] naming the first absent array
    /// (`"weights/W"` when neither weight key exists), or a shape error when
    /// the arrays disagree with each other.
    pub fn from_archive(archive: &SafeTensorsFile) -> Result<Self> {
        let weights_key = [KEY_WEIGHTS, KEY_WEIGHTS_LEGACY]
            .into_iter()
            .find(|k| archive.contains(k))
            .ok_or_else(|| EigenError::missing_key(format!("{KEY_WEIGHTS}/{KEY_WEIGHTS_LEGACY}")))?;
        let (w_values, w_shape) = archive.get_tensor(weights_key)?;
        let weights = as_matrix(weights_key, w_values, &w_shape)?;

        let (bias_values, _) = archive.get_tensor(KEY_BIAS)?;
        if bias_values.len() != weights.n_cols() {
            return Err(EigenError::ShapeError {
                expected: format!("'{KEY_BIAS}' of length {}", weights.n_cols()),
                actual: format!("length {}", bias_values.len()),
            });
        }

        let metadata = archive.user_metadata();
        let feature_kind = match metadata.get(META_FEATURE_KIND) {
            Some(kind) => kind.parse()?,
            None => FeatureKind::Pca,
        };
        let image_side = metadata
            .get(META_IMAGE_SIDE)
            .map(|s| {
                s.parse::<usize>()
                    .map_err(|e| EigenError::format(format!("bad {META_IMAGE_SIDE} '{s}': {e}")))
            })
            .transpose()?;

        let (mean, basis) = if feature_kind == FeatureKind::Pca {
            let (mean, _) = archive.get_tensor(KEY_MEAN)?;
            let (b_values, b_shape) = archive.get_tensor(KEY_BASIS)?;
            let basis = as_matrix(KEY_BASIS, b_values, &b_shape)?;
            if mean.len() != basis.n_rows() {
                return Err(EigenError::ShapeError {
                    expected: format!("'{KEY_MEAN}' of length {}", basis.n_rows()),
                    actual: format!("length {}", mean.len()),
                });
            }
            (Some(mean), Some(basis))
        } else {
            (None, None)
        };

        Ok(Self {
            weights,
            bias: Vector::from_vec(bias_values),
            mean,
            basis,
            feature_kind,
            image_side,
        })
    }

    /// Reads a checkpoint file.
    ///
    /// # Errors
    ///
    /// See [`Self::from_archive`]; I/O and format errors are passed through.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let checkpoint = Self::from_archive(&safetensors::load_safetensors(path)?)?;
        info!(
            path = %path.display(),
            feature_kind = %checkpoint.feature_kind,
            n_features = checkpoint.weights.n_rows(),
            n_classes = checkpoint.weights.n_cols(),
            "checkpoint loaded"
        );
        Ok(checkpoint)
    }

    /// Arrays and metadata in archive form.
    #[must_use]
    pub fn to_arrays(&self) -> (NamedArrays, UserMetadata) {
        let mut tensors = NamedArrays::new();
        tensors.insert(
            KEY_WEIGHTS.to_string(),
            (
                self.weights.as_slice().to_vec(),
                vec![self.weights.n_rows(), self.weights.n_cols()],
            ),
        );
        tensors.insert(
            KEY_BIAS.to_string(),
            (self.bias.as_slice().to_vec(), vec![self.bias.len()]),
        );
        if let (Some(mean), Some(basis)) = (&self.mean, &self.basis) {
            tensors.insert(KEY_MEAN.to_string(), (mean.clone(), vec![mean.len()]));
            tensors.insert(
                KEY_BASIS.to_string(),
                (
                    basis.as_slice().to_vec(),
                    vec![basis.n_rows(), basis.n_cols()],
                ),
            );
        }

        let mut metadata = UserMetadata::new();
        metadata.insert(META_FEATURE_KIND.to_string(), self.feature_kind.to_string());
        if let Some(side) = self.image_side {
            metadata.insert(META_IMAGE_SIDE.to_string(), side.to_string());
        }
        (tensors, metadata)
    }

    /// Writes the checkpoint as a `SafeTensors` file.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let (tensors, metadata) = self.to_arrays();
        safetensors::save_safetensors(path, &tensors, &metadata)?;
        info!(path = %path.display(), arrays = tensors.len(), "checkpoint saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::safetensors::to_bytes;

    fn pca_checkpoint() -> Checkpoint {
        Checkpoint {
            weights: Matrix::from_vec(2, 3, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).expect("valid"),
            bias: Vector::from_slice(&[1.0, 2.0, 3.0]),
            mean: Some(vec![0.5; 4]),
            basis: Some(Matrix::from_vec(4, 2, vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]).expect("valid")),
            feature_kind: FeatureKind::Pca,
            image_side: Some(2),
        }
    }

    fn reload(tensors: &NamedArrays, metadata: &UserMetadata) -> Result<Checkpoint> {
        let bytes = to_bytes(tensors, metadata)?;
        Checkpoint::from_archive(&SafeTensorsFile::from_bytes(&bytes)?)
    }

    #[test]
    fn test_round_trip() {
        let ckpt = pca_checkpoint();
        let (tensors, metadata) = ckpt.to_arrays();
        assert_eq!(reload(&tensors, &metadata).expect("reload"), ckpt);
    }

    #[test]
    fn test_legacy_weight_key() {
        let (mut tensors, metadata) = pca_checkpoint().to_arrays();
        let w = tensors.remove("weights").expect("present");
        tensors.insert("W".to_string(), w);
        let ckpt = reload(&tensors, &metadata).expect("W accepted");
        assert_eq!(ckpt.weights.shape(), (2, 3));
    }

    #[test]
    fn test_missing_keys_are_named() {
        for (key, expected) in [("weights", "weights/W"), ("b", "b"), ("mu", "mu"), ("U_m", "U_m")] {
            let (mut tensors, metadata) = pca_checkpoint().to_arrays();
            tensors.remove(key);
            let err = reload(&tensors, &metadata).expect_err("missing array");
            match err {
                EigenError::MissingKey { key: missing } => assert_eq!(missing, expected),
                other => panic!("expected MissingKey for {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_no_metadata_means_pca() {
        let (mut tensors, _) = pca_checkpoint().to_arrays();
        tensors.remove("mu");
        let err = reload(&tensors, &UserMetadata::new()).expect_err("pca needs mu");
        assert!(matches!(err, EigenError::MissingKey { .. }));
    }

    #[test]
    fn test_raw_pipeline_needs_no_pca_arrays() {
        let ckpt = Checkpoint {
            mean: None,
            basis: None,
            feature_kind: FeatureKind::Raw,
            ..pca_checkpoint()
        };
        let (tensors, metadata) = ckpt.to_arrays();
        assert!(!tensors.contains_key("mu"));
        let back = reload(&tensors, &metadata).expect("reload");
        assert_eq!(back.feature_kind, FeatureKind::Raw);
        assert!(back.basis.is_none());
    }

    #[test]
    fn test_bias_length_mismatch() {
        let (mut tensors, metadata) = pca_checkpoint().to_arrays();
        tensors.insert("b".to_string(), (vec![1.0], vec![1]));
        assert!(matches!(
            reload(&tensors, &metadata),
            Err(EigenError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_weights_must_be_2d() {
        let (mut tensors, metadata) = pca_checkpoint().to_arrays();
        tensors.insert("weights".to_string(), (vec![0.0; 6], vec![6]));
        assert!(matches!(
            reload(&tensors, &metadata),
            Err(EigenError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_unknown_feature_kind() {
        let (tensors, mut metadata) = pca_checkpoint().to_arrays();
        metadata.insert("feature_kind".to_string(), "hog".to_string());
        assert!(reload(&tensors, &metadata).is_err());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model.safetensors");
        let ckpt = pca_checkpoint();
        ckpt.save(&path).expect("save");
        assert_eq!(Checkpoint::load(&path).expect("load"), ckpt);
    }
}
