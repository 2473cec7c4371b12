//! Labelled image datasets stored as `SafeTensors` archives.
//!
//! A dataset archive holds two arrays: `images` (`[N, d]` or `[N, H, W]`, any
//! readable dtype) and `labels` (`[N]`, non-negative integers).

use crate::error::{EigenError, Result};
use crate::preprocessing::ImageBatch;
use crate::serialization::safetensors::{self, NamedArrays, SafeTensorsFile, UserMetadata};
use std::path::Path;

const KEY_IMAGES: &str = "images";
const KEY_LABELS: &str = "labels";

/// Images paired with their class labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledImages {
    /// Image batch, one row per image
    pub images: ImageBatch,
    /// Class label of each image
    pub labels: Vec<usize>,
}

impl LabeledImages {
    /// Pairs images with labels.
    ///
    /// # Errors
    ///
    /// Returns [`EigenError::ShapeError`] when the counts differ.
    pub fn new(images: ImageBatch, labels: Vec<usize>) -> Result<Self> {
        if images.len() != labels.len() {
            return Err(EigenError::shape("n_labels", images.len(), labels.len()));
        }
        Ok(Self { images, labels })
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the dataset is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Extracts `images` and `labels` from an opened archive.
    ///
    /// # Errors
    ///
    /// Returns [`EigenError::MissingKey`] for an absent array, a format error
    /// for labels that are negative or fractional, and a shape error when the
    /// counts differ.
    pub fn from_archive(archive: &SafeTensorsFile) -> Result<Self> {
        let (pixels, shape) = archive.get_tensor(KEY_IMAGES)?;
        let images = ImageBatch::from_tensor(&shape, pixels)?;

        let (raw_labels, _) = archive.get_tensor(KEY_LABELS)?;
        let labels = raw_labels
            .iter()
            .map(|&v| {
                if v >= 0.0 && v.fract() == 0.0 && v.is_finite() {
                    Ok(v as usize)
                } else {
                    Err(EigenError::format(format!(
                        "label {v} is not a non-negative integer"
                    )))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(images, labels)
    }

    /// Reads a dataset archive from disk.
    ///
    /// # Errors
    ///
    /// See [`Self::from_archive`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_archive(&safetensors::load_safetensors(path)?)
    }

    /// Writes the dataset as a `SafeTensors` archive (flattened images).
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let pixels = self.images.pixels();
        let mut tensors = NamedArrays::new();
        tensors.insert(
            KEY_IMAGES.to_string(),
            (
                pixels.as_slice().to_vec(),
                vec![pixels.n_rows(), pixels.n_cols()],
            ),
        );
        tensors.insert(
            KEY_LABELS.to_string(),
            (
                self.labels.iter().map(|&l| l as f64).collect(),
                vec![self.labels.len()],
            ),
        );
        safetensors::save_safetensors(path, &tensors, &UserMetadata::new())
    }
}
