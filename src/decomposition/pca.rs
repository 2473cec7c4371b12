//! Principal Component Analysis.

use crate::error::{EigenError, Result};
use crate::primitives::Matrix;
use crate::traits::{FeatureTransform, Transformer};
use nalgebra::{DMatrix, SymmetricEigen};

/// Principal Component Analysis (PCA) for dimensionality reduction.
///
/// Fits an orthogonal projection onto the directions of largest variance by
/// eigendecomposition of the population covariance `XcᵀXc / N`.
///
/// # Example
///
/// ```
/// use eigendigit::decomposition::PCA;
/// use eigendigit::traits::Transformer;
/// use eigendigit::primitives::Matrix;
///
/// let data = Matrix::from_vec(4, 3, vec![
///     1.0, 2.0, 3.0,
///     4.0, 5.0, 6.0,
///     7.0, 8.0, 9.5,
///     10.0, 11.0, 12.0,
/// ]).expect("valid matrix dimensions");
///
/// let mut pca = PCA::new(2);
/// let transformed = pca.fit_transform(&data).expect("fit_transform should succeed");
/// assert_eq!(transformed.shape(), (4, 2));
/// assert_eq!(pca.projection_basis().unwrap().shape(), (3, 2));
/// ```
#[derive(Debug, Clone)]
pub struct PCA {
    /// Number of components to keep.
    n_components: usize,
    /// Mean of each feature (computed during fit).
    mean: Option<Vec<f64>>,
    /// Projection basis, `n_features x n_components`, one eigenvector per column.
    basis: Option<Matrix<f64>>,
    /// All covariance eigenvalues, descending.
    eigenvalues: Option<Vec<f64>>,
}

impl PCA {
    /// Creates a new, unfitted PCA.
    ///
    /// # Arguments
    ///
    /// * `n_components` - Number of principal components to keep
    #[must_use]
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            mean: None,
            basis: None,
            eigenvalues: None,
        }
    }

    /// Rebuilds a fitted PCA from persisted parameters.
    ///
    /// The basis is taken as-is: columns are not re-orthonormalised and no
    /// eigenvalues are available afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`EigenError::ShapeError`] if `mean.len()` differs from the
    /// basis row count.
    pub fn from_parameters(mean: Vec<f64>, basis: Matrix<f64>) -> Result<Self> {
        if mean.len() != basis.n_rows() {
            return Err(EigenError::ShapeError {
                expected: format!("mean of length {}", basis.n_rows()),
                actual: format!("length {}", mean.len()),
            });
        }
        Ok(Self {
            n_components: basis.n_cols(),
            mean: Some(mean),
            basis: Some(basis),
            eigenvalues: None,
        })
    }

    /// Number of components this PCA projects onto.
    #[must_use]
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Whether `fit` (or `from_parameters`) has run.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.basis.is_some()
    }

    /// Per-feature mean seen at fit time.
    #[must_use]
    pub fn mean(&self) -> Option<&[f64]> {
        self.mean.as_deref()
    }

    /// Orthonormal projection basis (`n_features x n_components`).
    #[must_use]
    pub fn projection_basis(&self) -> Option<&Matrix<f64>> {
        self.basis.as_ref()
    }

    /// All covariance eigenvalues in descending order.
    #[must_use]
    pub fn sorted_eigenvalues(&self) -> Option<&[f64]> {
        self.eigenvalues.as_deref()
    }

    /// Variance explained by each kept component.
    #[must_use]
    pub fn explained_variance(&self) -> Option<&[f64]> {
        self.eigenvalues
            .as_deref()
            .map(|ev| &ev[..self.n_components.min(ev.len())])
    }

    /// Fraction of total variance explained by each kept component.
    #[must_use]
    pub fn explained_variance_ratio(&self) -> Option<Vec<f64>> {
        let all = self.eigenvalues.as_ref()?;
        // symmetric eigensolvers may return tiny negative values for null directions
        let total: f64 = all.iter().map(|v| v.max(0.0)).sum();
        let kept = self.explained_variance()?;
        Some(
            kept.iter()
                .map(|&v| if total > 0.0 { v.max(0.0) / total } else { 0.0 })
                .collect(),
        )
    }

    fn fitted(&self) -> Result<(&[f64], &Matrix<f64>)> {
        match (&self.mean, &self.basis) {
            (Some(mean), Some(basis)) => Ok((mean, basis)),
            _ => Err(EigenError::NotFitted { model: "PCA" }),
        }
    }

    /// Reconstructs data from principal component space: `Z @ Uᵀ + mean`.
    ///
    /// # Errors
    ///
    /// Returns error if PCA is not fitted or `z` has the wrong width.
    pub fn inverse_transform(&self, z: &Matrix<f64>) -> Result<Matrix<f64>> {
        let (mean, basis) = self.fitted()?;
        if z.n_cols() != basis.n_cols() {
            return Err(EigenError::shape("n_components", basis.n_cols(), z.n_cols()));
        }

        let mut result = z.matmul(&basis.transpose())?;
        let n_features = mean.len();
        for (i, v) in result.as_mut_slice().iter_mut().enumerate() {
            *v += mean[i % n_features];
        }
        Ok(result)
    }
}

impl FeatureTransform for PCA {
    fn transform(&self, x: &Matrix<f64>) -> Result<Matrix<f64>> {
        let (mean, basis) = self.fitted()?;
        let (n_samples, n_features) = x.shape();

        if n_features != mean.len() {
            return Err(EigenError::shape("n_features", mean.len(), n_features));
        }

        let mut centered = Vec::with_capacity(n_samples * n_features);
        for row in x.rows_iter() {
            centered.extend(row.iter().zip(mean).map(|(v, m)| v - m));
        }
        Matrix::from_vec(n_samples, n_features, centered)?.matmul(basis)
    }

    fn output_dim(&self, _input_dim: usize) -> Option<usize> {
        Some(self.n_components)
    }
}

impl Transformer for PCA {
    fn fit(&mut self, x: &Matrix<f64>) -> Result<()> {
        let (n_samples, n_features) = x.shape();

        if n_samples == 0 {
            return Err(EigenError::empty_input("PCA training data"));
        }
        if self.n_components == 0 || self.n_components > n_features {
            return Err(EigenError::InvalidHyperparameter {
                param: "n_components".to_string(),
                value: self.n_components.to_string(),
                constraint: format!("1..={n_features}"),
            });
        }

        let mean = x.column_means();

        let mut centered = DMatrix::<f64>::zeros(n_samples, n_features);
        for (i, row) in x.rows_iter().enumerate() {
            for (j, (&v, &m)) in row.iter().zip(&mean).enumerate() {
                centered[(i, j)] = v - m;
            }
        }

        // Population covariance: C = XcᵀXc / N
        let cov = centered.transpose() * &centered / n_samples as f64;

        let eigen = SymmetricEigen::new(cov);
        let eigenvalues = eigen.eigenvalues;
        let eigenvectors = eigen.eigenvectors;

        // Stable sort keeps the solver's order among equal eigenvalues
        let mut indices: Vec<usize> = (0..n_features).collect();
        indices.sort_by(|&a, &b| {
            eigenvalues[b]
                .partial_cmp(&eigenvalues[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut basis = Matrix::zeros(n_features, self.n_components);
        for (k, &idx) in indices.iter().take(self.n_components).enumerate() {
            for j in 0..n_features {
                basis.set(j, k, eigenvectors[(j, idx)]);
            }
        }

        self.mean = Some(mean);
        self.basis = Some(basis);
        self.eigenvalues = Some(indices.iter().map(|&i| eigenvalues[i]).collect());

        Ok(())
    }
}

#[cfg(test)]
#[path = "pca_tests.rs"]
mod tests;
