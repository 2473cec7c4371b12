//! Multinomial logistic (softmax) regression.

use crate::error::{EigenError, Result};
use crate::primitives::{argmax, Matrix, Vector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Added inside the logarithm of the cross-entropy to avoid `ln(0)`.
const LOG_EPSILON: f64 = 1e-8;

/// Epoch interval between progress log lines.
const LOG_EVERY: usize = 100;

/// Softmax Regression classifier for multi-class problems.
///
/// Trained by full-batch gradient descent on one-hot labels from a zero
/// initialisation. Training always runs exactly `epochs` passes; the loss of
/// every epoch is kept for inspection only.
///
/// # Example
///
/// ```
/// use eigendigit::classification::SoftmaxRegression;
/// use eigendigit::primitives::Matrix;
///
/// let x = Matrix::from_vec(6, 2, vec![
///     0.0, 0.0,  0.1, 0.2,   // class 0
///     5.0, 0.0,  5.2, 0.1,   // class 1
///     0.0, 5.0,  0.1, 5.1,   // class 2
/// ]).unwrap();
/// let y = vec![0, 0, 1, 1, 2, 2];
///
/// let mut model = SoftmaxRegression::new(3)
///     .with_learning_rate(0.1)
///     .with_epochs(500);
/// model.fit(&x, &y).unwrap();
/// assert_eq!(model.predict(&x).unwrap(), y);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxRegression {
    /// Weight matrix, `n_features x n_classes`
    weights: Option<Matrix<f64>>,
    /// Bias vector, one entry per class
    bias: Option<Vector<f64>>,
    /// Learning rate for gradient descent
    learning_rate: f64,
    /// Number of full-batch epochs
    epochs: usize,
    /// Number of classes
    n_classes: usize,
    /// Cross-entropy loss of every training epoch
    losses: Vec<f64>,
}

impl SoftmaxRegression {
    /// Creates an unfitted classifier for `n_classes` classes with
    /// learning rate 0.1 and 1000 epochs.
    #[must_use]
    pub fn new(n_classes: usize) -> Self {
        Self {
            weights: None,
            bias: None,
            learning_rate: 0.1,
            epochs: 1000,
            n_classes,
            losses: Vec::new(),
        }
    }

    /// Sets the learning rate.
    #[must_use]
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Sets the number of training epochs.
    #[must_use]
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Builds a fitted classifier from persisted weights, bypassing training.
    ///
    /// The class count is taken from the weight matrix width.
    ///
    /// # Errors
    ///
    /// Returns [`EigenError::InvalidHyperparameter`] for a weight matrix with
    /// no columns, and [`EigenError::ShapeError`] if `bias.len()` differs
    /// from the number of weight columns.
    pub fn from_parameters(weights: Matrix<f64>, bias: Vector<f64>) -> Result<Self> {
        if weights.n_cols() == 0 {
            return Err(EigenError::InvalidHyperparameter {
                param: "n_classes".to_string(),
                value: "0".to_string(),
                constraint: ">0 weight columns".to_string(),
            });
        }
        if bias.len() != weights.n_cols() {
            return Err(EigenError::ShapeError {
                expected: format!("bias of length {}", weights.n_cols()),
                actual: format!("length {}", bias.len()),
            });
        }
        Ok(Self {
            n_classes: weights.n_cols(),
            weights: Some(weights),
            bias: Some(bias),
            ..Self::new(0)
        })
    }

    /// Number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Learning rate used by `fit`.
    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Epoch count used by `fit`.
    #[must_use]
    pub fn epochs(&self) -> usize {
        self.epochs
    }

    /// Weight matrix (`n_features x n_classes`), if fitted.
    #[must_use]
    pub fn weights(&self) -> Option<&Matrix<f64>> {
        self.weights.as_ref()
    }

    /// Bias vector, if fitted.
    #[must_use]
    pub fn bias(&self) -> Option<&Vector<f64>> {
        self.bias.as_ref()
    }

    /// Per-epoch training loss.
    #[must_use]
    pub fn loss_history(&self) -> &[f64] {
        &self.losses
    }

    /// Whether weights are available.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.weights.is_some()
    }

    /// Row-wise numerically stable softmax, in place.
    fn softmax_rows(z: &mut Matrix<f64>) {
        let n_classes = z.n_cols();
        if n_classes == 0 {
            return;
        }
        for row in z.as_mut_slice().chunks_exact_mut(n_classes) {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mut sum = 0.0;
            for v in row.iter_mut() {
                *v = (*v - max).exp();
                sum += *v;
            }
            for v in row.iter_mut() {
                *v /= sum;
            }
        }
    }

    /// `softmax(X W + b)` for the given parameters.
    fn probabilities(x: &Matrix<f64>, weights: &Matrix<f64>, bias: &Vector<f64>) -> Result<Matrix<f64>> {
        if x.n_cols() != weights.n_rows() {
            return Err(EigenError::shape("n_features", weights.n_rows(), x.n_cols()));
        }
        let mut z = x.matmul(weights)?;
        let n_classes = bias.len();
        if n_classes > 0 {
            for row in z.as_mut_slice().chunks_exact_mut(n_classes) {
                for (v, b) in row.iter_mut().zip(bias.as_slice()) {
                    *v += b;
                }
            }
        }
        Self::softmax_rows(&mut z);
        Ok(z)
    }

    fn validate(&self, x: &Matrix<f64>, y: &[usize]) -> Result<()> {
        let n_samples = x.n_rows();
        if n_samples == 0 {
            return Err(EigenError::empty_input("softmax training data"));
        }
        if y.len() != n_samples {
            return Err(EigenError::shape("n_labels", n_samples, y.len()));
        }
        if self.n_classes == 0 {
            return Err(EigenError::InvalidHyperparameter {
                param: "n_classes".to_string(),
                value: "0".to_string(),
                constraint: ">0".to_string(),
            });
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(EigenError::InvalidHyperparameter {
                param: "learning_rate".to_string(),
                value: self.learning_rate.to_string(),
                constraint: "finite and >0".to_string(),
            });
        }
        if let Some(&label) = y.iter().find(|&&label| label >= self.n_classes) {
            return Err(EigenError::InvalidLabel {
                label,
                n_classes: self.n_classes,
            });
        }
        Ok(())
    }

    /// Trains on `x` (`n_samples x n_features`) and labels `y`.
    ///
    /// Any previous weights and loss history are discarded.
    ///
    /// # Errors
    ///
    /// Returns an error on empty input, mismatched label count, invalid
    /// hyperparameters, or a label outside `[0, n_classes)`. No state is
    /// modified when validation fails.
    pub fn fit(&mut self, x: &Matrix<f64>, y: &[usize]) -> Result<()> {
        self.validate(x, y)?;

        let (n_samples, n_features) = x.shape();
        let k = self.n_classes;
        let n = n_samples as f64;

        let mut weights = Matrix::zeros(n_features, k);
        let mut bias = Vector::zeros(k);
        let mut losses = Vec::with_capacity(self.epochs);
        let xt = x.transpose();

        for epoch in 0..self.epochs {
            let mut delta = Self::probabilities(x, &weights, &bias)?;

            // Cross-entropy only reads the true-class probability of each row
            let mut loss = 0.0;
            for (row, &label) in delta.as_mut_slice().chunks_exact_mut(k).zip(y) {
                loss -= (row[label] + LOG_EPSILON).ln();
                // P - Y_onehot
                row[label] -= 1.0;
            }
            loss /= n;
            losses.push(loss);

            let grad_w = xt.matmul(&delta)?;
            for (w, g) in weights.as_mut_slice().iter_mut().zip(grad_w.as_slice()) {
                *w -= self.learning_rate * g / n;
            }

            let mut grad_b = vec![0.0; k];
            for row in delta.as_slice().chunks_exact(k) {
                for (g, d) in grad_b.iter_mut().zip(row) {
                    *g += d;
                }
            }
            for (b, g) in bias.as_mut_slice().iter_mut().zip(&grad_b) {
                *b -= self.learning_rate * g / n;
            }

            if (epoch + 1) % LOG_EVERY == 0 {
                debug!(epoch = epoch + 1, loss, "softmax training progress");
            }
        }

        info!(
            n_samples,
            n_features,
            n_classes = k,
            epochs = self.epochs,
            final_loss = losses.last().copied(),
            "softmax regression fitted"
        );

        self.weights = Some(weights);
        self.bias = Some(bias);
        self.losses = losses;
        Ok(())
    }

    /// Per-class probabilities, `n_samples x n_classes`; each row sums to 1.
    ///
    /// # Errors
    ///
    /// Returns [`EigenError::NotFitted`] before `fit` and
    /// [`EigenError::ShapeError`] when the feature count differs from training.
    pub fn predict_proba(&self, x: &Matrix<f64>) -> Result<Matrix<f64>> {
        match (&self.weights, &self.bias) {
            (Some(w), Some(b)) => Self::probabilities(x, w, b),
            _ => Err(EigenError::NotFitted {
                model: "SoftmaxRegression",
            }),
        }
    }

    /// Most probable class per row; the lowest index wins on ties.
    ///
    /// # Errors
    ///
    /// Same as [`Self::predict_proba`].
    pub fn predict(&self, x: &Matrix<f64>) -> Result<Vec<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows_iter()
            .map(|row| argmax(row).unwrap_or(0))
            .collect())
    }

    /// Fraction of correctly classified samples.
    ///
    /// # Errors
    ///
    /// Same as [`Self::predict_proba`], plus a shape error when `y` has the
    /// wrong length.
    pub fn score(&self, x: &Matrix<f64>, y: &[usize]) -> Result<f64> {
        let predictions = self.predict(x)?;
        crate::metrics::accuracy(&predictions, y)
    }
}

#[cfg(test)]
#[path = "softmax_tests.rs"]
mod tests;
