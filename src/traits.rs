//! Core traits for feature transforms.
//!
//! The classifier never depends on a concrete feature extractor: anything that
//! can map a feature matrix to another feature matrix can sit in front of it.

use crate::error::Result;
use crate::primitives::Matrix;

/// Capability to map a batch of feature rows to new feature rows.
///
/// Implemented by fitted PCA, the raw-pixel identity map and the Sobel edge
/// extractor. Inference-only callers hold a `Box<dyn FeatureTransform>`.
///
/// # Examples
///
/// ```
/// use eigendigit::prelude::*;
/// use eigendigit::preprocessing::RawPixels;
///
/// let x = Matrix::from_vec(1, 2, vec![0.5, 0.25]).unwrap();
/// let features = RawPixels.transform(&x).unwrap();
/// assert_eq!(features, x);
/// ```
pub trait FeatureTransform {
    /// Transforms data using fitted parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform is not fitted or the input width is wrong.
    fn transform(&self, x: &Matrix<f64>) -> Result<Matrix<f64>>;

    /// Width of the output rows for `input_dim`-wide input, when known.
    fn output_dim(&self, input_dim: usize) -> Option<usize>;
}

/// A feature transform that learns its parameters from data.
///
/// ```
/// use eigendigit::prelude::*;
///
/// let x = Matrix::from_vec(4, 2, vec![1.0, 2.0, 2.0, 4.0, 3.0, 6.0, 4.0, 8.0]).unwrap();
/// let mut pca = PCA::new(1);
/// let z = pca.fit_transform(&x).unwrap();
/// assert_eq!(z.shape(), (4, 1));
/// ```
pub trait Transformer: FeatureTransform {
    /// Fits the transformer to data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit(&mut self, x: &Matrix<f64>) -> Result<()>;

    /// Fits and transforms in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit_transform(&mut self, x: &Matrix<f64>) -> Result<Matrix<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EigenError;

    // Mock transformer to test trait default methods
    struct MeanShift {
        shift: Option<f64>,
    }

    impl FeatureTransform for MeanShift {
        fn transform(&self, x: &Matrix<f64>) -> Result<Matrix<f64>> {
            let shift = self.shift.ok_or(EigenError::NotFitted { model: "MeanShift" })?;
            let data = x.as_slice().iter().map(|v| v - shift).collect();
            Matrix::from_vec(x.n_rows(), x.n_cols(), data)
        }

        fn output_dim(&self, input_dim: usize) -> Option<usize> {
            Some(input_dim)
        }
    }

    impl Transformer for MeanShift {
        fn fit(&mut self, x: &Matrix<f64>) -> Result<()> {
            if x.n_rows() == 0 {
                return Err(EigenError::empty_input("MeanShift"));
            }
            let n = x.as_slice().len() as f64;
            self.shift = Some(x.as_slice().iter().sum::<f64>() / n);
            Ok(())
        }
    }

    #[test]
    fn test_fit_transform_default() {
        let mut t = MeanShift { shift: None };
        let x = Matrix::from_vec(2, 2, vec![2.0, 4.0, 6.0, 8.0]).expect("matrix");
        let out = t.fit_transform(&x).expect("fit_transform");
        assert_eq!(out.as_slice(), &[-3.0, -1.0, 1.0, 3.0]);
    }

    #[test]
    fn test_transform_before_fit() {
        let t = MeanShift { shift: None };
        let x = Matrix::zeros(1, 1);
        assert!(matches!(
            t.transform(&x),
            Err(EigenError::NotFitted { .. })
        ));
    }

    #[test]
    fn test_trait_object_dispatch() {
        let mut t = MeanShift { shift: None };
        let x = Matrix::from_vec(1, 2, vec![1.0, 3.0]).expect("matrix");
        t.fit(&x).expect("fit");
        let boxed: Box<dyn FeatureTransform> = Box::new(t);
        assert_eq!(boxed.output_dim(2), Some(2));
        assert_eq!(boxed.transform(&x).expect("transform").as_slice(), &[-1.0, 1.0]);
    }
}
