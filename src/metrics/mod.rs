//! Evaluation metrics for classifiers.
//!
//! Accuracy, per-class and macro-averaged precision/recall/F1, and the
//! confusion matrix used to score a trained pipeline against held-out data.

pub mod classification;

pub use classification::{
    accuracy, confusion_matrix, evaluate_multiclass, ClassMetrics, MulticlassReport,
};
