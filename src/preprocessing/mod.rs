//! Feature front ends for image batches.
//!
//! Everything here turns decoded pixel data into the feature matrix consumed
//! by [`crate::decomposition::PCA`] or [`crate::classification::SoftmaxRegression`].
//!
//! # Example
//!
//! ```
//! use eigendigit::preprocessing::{normalize_pixels, ImageBatch};
//!
//! // Two 2x2 images in raw 0..255 range, stored as [N, H, W]
//! let batch = ImageBatch::from_tensor(&[2, 2, 2], vec![
//!     0.0, 255.0, 128.0, 64.0,
//!     255.0, 255.0, 0.0, 0.0,
//! ]).unwrap();
//! assert_eq!(batch.image_side(), Some(2));
//!
//! let mut features = batch.into_matrix();
//! assert!(normalize_pixels(&mut features));
//! assert!((features.get(0, 1) - 1.0).abs() < 1e-12);
//! ```

mod sobel;

pub use sobel::SobelEdges;

use crate::error::{EigenError, Result};
use crate::primitives::Matrix;
use crate::traits::FeatureTransform;

/// Maximum pixel value above which a batch is treated as raw 0..255 data.
pub const RAW_PIXEL_THRESHOLD: f64 = 1.5;

/// A batch of images flattened to one row per image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBatch {
    pixels: Matrix<f64>,
    height: Option<usize>,
    width: Option<usize>,
}

impl ImageBatch {
    /// Builds a batch from a tensor shaped `[N, d]` or `[N, H, W]`.
    ///
    /// # Errors
    ///
    /// Returns [`EigenError::ShapeError`] for any other rank, or when the data
    /// length disagrees with the shape.
    pub fn from_tensor(shape: &[usize], data: Vec<f64>) -> Result<Self> {
        match *shape {
            [n, d] => Ok(Self {
                pixels: Matrix::from_vec(n, d, data)?,
                height: None,
                width: None,
            }),
            [n, h, w] => {
                let d = h.checked_mul(w).ok_or_else(|| EigenError::ShapeError {
                    expected: "image height * width within usize".to_string(),
                    actual: format!("shape {shape:?}"),
                })?;
                Ok(Self {
                    pixels: Matrix::from_vec(n, d, data)?,
                    height: Some(h),
                    width: Some(w),
                })
            }
            _ => Err(EigenError::ShapeError {
                expected: "image tensor of rank 2 [N, d] or rank 3 [N, H, W]".to_string(),
                actual: format!("shape {shape:?}"),
            }),
        }
    }

    /// Wraps an already flattened matrix.
    #[must_use]
    pub fn from_matrix(pixels: Matrix<f64>) -> Self {
        Self {
            pixels,
            height: None,
            width: None,
        }
    }

    /// Number of images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.n_rows()
    }

    /// Whether the batch holds no images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.n_rows() == 0
    }

    /// Side length of square images: known from an `[N, H, W]` tensor,
    /// otherwise inferred when the row width is a perfect square.
    #[must_use]
    pub fn image_side(&self) -> Option<usize> {
        match (self.height, self.width) {
            (Some(h), Some(w)) if h == w => Some(h),
            (Some(_), Some(_)) => None,
            _ => square_side(self.pixels.n_cols()),
        }
    }

    /// Borrows the flattened pixels.
    #[must_use]
    pub fn pixels(&self) -> &Matrix<f64> {
        &self.pixels
    }

    /// Consumes the batch, returning the flattened `N x d` matrix.
    #[must_use]
    pub fn into_matrix(self) -> Matrix<f64> {
        self.pixels
    }
}

/// Integer square root of `d` when `d` is a perfect square.
#[must_use]
pub fn square_side(d: usize) -> Option<usize> {
    let side = (d as f64).sqrt().round() as usize;
    (side.checked_mul(side) == Some(d)).then_some(side)
}

/// Scales pixels into `[0, 1]` by dividing by 255 when the batch maximum
/// exceeds [`RAW_PIXEL_THRESHOLD`].
///
/// Returns whether scaling was applied. The threshold is a heuristic: a
/// raw batch whose brightest pixel is 1 is left untouched.
pub fn normalize_pixels(x: &mut Matrix<f64>) -> bool {
    match x.max_value() {
        Some(max) if max > RAW_PIXEL_THRESHOLD => {
            for v in x.as_mut_slice() {
                *v /= 255.0;
            }
            true
        }
        _ => false,
    }
}

/// Identity feature map: the classifier sees the pixels themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawPixels;

impl FeatureTransform for RawPixels {
    fn transform(&self, x: &Matrix<f64>) -> Result<Matrix<f64>> {
        Ok(x.clone())
    }

    fn output_dim(&self, input_dim: usize) -> Option<usize> {
        Some(input_dim)
    }
}
