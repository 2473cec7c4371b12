//! Sobel edge-magnitude features.

use crate::error::{EigenError, Result};
use crate::primitives::Matrix;
use crate::traits::FeatureTransform;

/// Horizontal Sobel kernel; the vertical one is its transpose.
const KX: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];

/// Replaces each square image by its Sobel gradient magnitude
/// `sqrt(gx² + gy²)`.
///
/// Borders replicate the nearest pixel, so the output has the same
/// `side * side` width as the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SobelEdges {
    side: usize,
}

impl SobelEdges {
    /// Edge extractor for `side x side` images.
    #[must_use]
    pub fn new(side: usize) -> Self {
        Self { side }
    }

    /// Image side length.
    #[must_use]
    pub fn side(&self) -> usize {
        self.side
    }

    fn magnitude(&self, image: &[f64], out: &mut Vec<f64>) {
        let s = self.side;
        let last = s as isize - 1;
        let pixel = |r: isize, c: isize| image[r.clamp(0, last) as usize * s + c.clamp(0, last) as usize];

        for r in 0..s as isize {
            for c in 0..s as isize {
                let mut gx = 0.0;
                let mut gy = 0.0;
                for (dr, krow) in KX.iter().enumerate() {
                    for (dc, &k) in krow.iter().enumerate() {
                        let v = pixel(r + dr as isize - 1, c + dc as isize - 1);
                        gx += k * v;
                        gy += KX[dc][dr] * v;
                    }
                }
                out.push((gx * gx + gy * gy).sqrt());
            }
        }
    }
}

impl FeatureTransform for SobelEdges {
    fn transform(&self, x: &Matrix<f64>) -> Result<Matrix<f64>> {
        let d = self.output_dim(x.n_cols()).ok_or_else(|| {
            EigenError::format(format!("image side {} is too large", self.side))
        })?;
        if x.n_cols() != d {
            return Err(EigenError::ShapeError {
                expected: format!("{0}x{0}={d} pixels per image", self.side),
                actual: format!("{} pixels", x.n_cols()),
            });
        }

        let mut data = Vec::with_capacity(x.n_rows() * d);
        if d > 0 {
            for image in x.rows_iter() {
                self.magnitude(image, &mut data);
            }
        }
        Matrix::from_vec(x.n_rows(), d, data)
    }

    fn output_dim(&self, _input_dim: usize) -> Option<usize> {
        self.side.checked_mul(self.side)
    }
}
