//! Classification metrics for evaluating classifier performance.
//!
//! Per-class precision, recall and F1 are smoothed with `1e-8` in every
//! denominator, so classes that never occur yield 0 rather than NaN.

use crate::error::{EigenError, Result};
use crate::primitives::Matrix;
use serde::Serialize;

/// Smoothing term added to metric denominators.
const SMOOTHING: f64 = 1e-8;

fn check_lengths(y_pred: &[usize], y_true: &[usize]) -> Result<()> {
    if y_true.is_empty() {
        return Err(EigenError::empty_input("labels"));
    }
    if y_pred.len() != y_true.len() {
        return Err(EigenError::shape("n_predictions", y_true.len(), y_pred.len()));
    }
    Ok(())
}

/// Compute classification accuracy.
///
/// accuracy = `correct_predictions` / `total_predictions`
///
/// # Errors
///
/// Returns an error if the slices are empty or have different lengths.
///
/// # Examples
///
/// ```
/// use eigendigit::metrics::classification::accuracy;
///
/// let y_true = vec![0, 1, 2, 0, 1, 2];
/// let y_pred = vec![0, 2, 1, 0, 0, 1];
/// let acc = accuracy(&y_pred, &y_true).unwrap();
/// assert!((acc - 1.0 / 3.0).abs() < 1e-12);
/// ```
pub fn accuracy(y_pred: &[usize], y_true: &[usize]) -> Result<f64> {
    check_lengths(y_pred, y_true)?;

    let correct = y_pred
        .iter()
        .zip(y_true.iter())
        .filter(|(p, t)| p == t)
        .count();

    Ok(correct as f64 / y_true.len() as f64)
}

/// Compute the `n_classes x n_classes` confusion matrix.
///
/// Element `[i, j]` counts samples with true label `i` predicted as `j`.
///
/// # Errors
///
/// Returns an error on empty or mismatched input, or
/// [`EigenError::InvalidLabel`] for a label outside `[0, n_classes)`.
///
/// # Examples
///
/// ```
/// use eigendigit::metrics::classification::confusion_matrix;
///
/// let y_true = vec![0, 0, 1, 1, 2, 2];
/// let y_pred = vec![0, 1, 1, 1, 2, 0];
/// let cm = confusion_matrix(&y_pred, &y_true, 3).unwrap();
/// assert_eq!(cm.get(0, 1), 1);
/// assert_eq!(cm.get(1, 1), 2);
/// ```
pub fn confusion_matrix(
    y_pred: &[usize],
    y_true: &[usize],
    n_classes: usize,
) -> Result<Matrix<usize>> {
    check_lengths(y_pred, y_true)?;

    let mut data = vec![0usize; n_classes * n_classes];
    for (&true_label, &pred_label) in y_true.iter().zip(y_pred.iter()) {
        for label in [true_label, pred_label] {
            if label >= n_classes {
                return Err(EigenError::InvalidLabel { label, n_classes });
            }
        }
        data[true_label * n_classes + pred_label] += 1;
    }

    Matrix::from_vec(n_classes, n_classes, data)
}

/// Precision, recall and F1 of a single class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    /// tp / (tp + fp)
    pub precision: f64,
    /// tp / (tp + fn)
    pub recall: f64,
    /// Harmonic mean of precision and recall
    pub f1: f64,
    /// Number of samples whose true label is this class
    pub support: usize,
}

/// Summary of a multi-class evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct MulticlassReport {
    /// Fraction of correct predictions
    pub accuracy: f64,
    /// Unweighted mean of per-class precision
    pub precision_macro: f64,
    /// Unweighted mean of per-class recall
    pub recall_macro: f64,
    /// Unweighted mean of per-class F1
    pub f1_macro: f64,
    /// Per-class breakdown, indexed by class
    pub per_class: Vec<ClassMetrics>,
    /// Confusion matrix, rows = true labels
    pub confusion: Matrix<usize>,
}

/// Per-class metrics derived from a confusion matrix.
#[must_use]
pub fn per_class_metrics(confusion: &Matrix<usize>) -> Vec<ClassMetrics> {
    let k = confusion.n_rows();
    (0..k)
        .map(|c| {
            let tp = confusion.get(c, c) as f64;
            let predicted: usize = (0..k).map(|r| confusion.get(r, c)).sum();
            let actual: usize = confusion.row_slice(c).iter().sum();
            let fp = predicted as f64 - tp;
            let fn_count = actual as f64 - tp;

            let precision = tp / (tp + fp + SMOOTHING);
            let recall = tp / (tp + fn_count + SMOOTHING);
            let f1 = 2.0 * precision * recall / (precision + recall + SMOOTHING);
            ClassMetrics {
                precision,
                recall,
                f1,
                support: actual,
            }
        })
        .collect()
}

/// Accuracy, macro-averaged precision/recall/F1 and the confusion matrix.
///
/// Every class in `[0, n_classes)` contributes to the macro averages, also
/// classes absent from both `y_true` and `y_pred`.
///
/// # Errors
///
/// Same as [`confusion_matrix`].
///
/// # Examples
///
/// ```
/// use eigendigit::metrics::evaluate_multiclass;
///
/// let report = evaluate_multiclass(&[0, 1, 1], &[0, 1, 0], 2).unwrap();
/// assert!((report.accuracy - 2.0 / 3.0).abs() < 1e-12);
/// assert_eq!(report.confusion.get(0, 1), 1);
/// ```
pub fn evaluate_multiclass(
    y_pred: &[usize],
    y_true: &[usize],
    n_classes: usize,
) -> Result<MulticlassReport> {
    let confusion = confusion_matrix(y_pred, y_true, n_classes)?;
    let accuracy = accuracy(y_pred, y_true)?;
    let per_class = per_class_metrics(&confusion);

    let mean = |f: fn(&ClassMetrics) -> f64| {
        if per_class.is_empty() {
            0.0
        } else {
            per_class.iter().map(f).sum::<f64>() / per_class.len() as f64
        }
    };

    Ok(MulticlassReport {
        accuracy,
        precision_macro: mean(|m| m.precision),
        recall_macro: mean(|m| m.recall),
        f1_macro: mean(|m| m.f1),
        per_class,
        confusion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_perfect() {
        assert!((accuracy(&[0, 1, 2], &[0, 1, 2]).expect("valid") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_accuracy_errors() {
        assert!(matches!(
            accuracy(&[], &[]),
            Err(EigenError::EmptyInput { .. })
        ));
        assert!(matches!(
            accuracy(&[0], &[0, 1]),
            Err(EigenError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_confusion_matrix_counts() {
        let cm = confusion_matrix(&[0, 1, 1, 2, 2, 0], &[0, 1, 2, 2, 2, 1], 3).expect("valid");
        assert_eq!(cm.shape(), (3, 3));
        assert_eq!(cm.get(0, 0), 1);
        assert_eq!(cm.get(1, 1), 1);
        assert_eq!(cm.get(1, 0), 1);
        assert_eq!(cm.get(2, 1), 1);
        assert_eq!(cm.get(2, 2), 2);
        assert_eq!(cm.as_slice().iter().sum::<usize>(), 6);
    }

    #[test]
    fn test_confusion_matrix_rejects_out_of_range() {
        let err = confusion_matrix(&[0, 5], &[0, 1], 3).expect_err("5 >= 3");
        assert!(matches!(err, EigenError::InvalidLabel { label: 5, .. }));
    }

    #[test]
    fn test_report_perfect_prediction() {
        let y = [0, 1, 2, 1, 0, 2];
        let report = evaluate_multiclass(&y, &y, 3).expect("valid");
        assert!((report.accuracy - 1.0).abs() < 1e-12);
        assert!((report.precision_macro - 1.0).abs() < 1e-6);
        assert!((report.recall_macro - 1.0).abs() < 1e-6);
        assert!((report.f1_macro - 1.0).abs() < 1e-6);
        assert_eq!(report.per_class[1].support, 2);
    }

    #[test]
    fn test_report_absent_class_counts_as_zero() {
        // Class 2 never appears: its metrics are 0 and drag the macro mean down
        let y = [0, 1, 0, 1];
        let report = evaluate_multiclass(&y, &y, 3).expect("valid");
        assert!(report.per_class[2].precision.abs() < 1e-12);
        assert!((report.precision_macro - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_report_binary_half_right() {
        let report = evaluate_multiclass(&[1, 1, 0, 0], &[1, 0, 1, 0], 2).expect("valid");
        for m in &report.per_class {
            assert!((m.precision - 0.5).abs() < 1e-6);
            assert!((m.recall - 0.5).abs() < 1e-6);
            assert!((m.f1 - 0.5).abs() < 1e-6);
        }
    }
}
