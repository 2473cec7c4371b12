//! Error types for eigendigit operations.
//!
//! Every fallible call in the numerical core returns [`EigenError`]; nothing is
//! retried or logged here, callers decide how to surface failures.

use std::fmt;

/// Main error type for eigendigit operations.
///
/// # Examples
///
/// ```
/// use eigendigit::error::EigenError;
///
/// let err = EigenError::ShapeError {
///     expected: "n_features=784".to_string(),
///     actual: "100".to_string(),
/// };
/// assert!(err.to_string().contains("Shape mismatch"));
/// ```
#[derive(Debug)]
pub enum EigenError {
    /// A model was used before `fit` (or before parameters were loaded).
    NotFitted {
        /// Model name
        model: &'static str,
    },

    /// Dimensionality mismatch between arrays, or ragged input rows.
    ShapeError {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// A persisted checkpoint lacks a required array.
    MissingKey {
        /// Name of the absent array
        key: String,
    },

    /// A class label outside `[0, n_classes)`.
    InvalidLabel {
        /// Offending label
        label: usize,
        /// Number of classes the model was configured with
        n_classes: usize,
    },

    /// Invalid hyperparameter value provided.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Input contained no samples.
    EmptyInput {
        /// What was empty
        context: String,
    },

    /// I/O error (file not found, permission denied, etc.).
    Io(std::io::Error),

    /// Serialization/deserialization error.
    Serialization(String),

    /// Invalid or corrupt archive contents.
    Format {
        /// Error description
        message: String,
    },
}

impl fmt::Display for EigenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EigenError::NotFitted { model } => {
                write!(f, "{model} not fitted: call fit() or load parameters first")
            }
            EigenError::ShapeError { expected, actual } => {
                write!(f, "Shape mismatch: expected {expected}, got {actual}")
            }
            EigenError::MissingKey { key } => {
                write!(f, "Checkpoint missing required array '{key}'")
            }
            EigenError::InvalidLabel { label, n_classes } => {
                write!(
                    f,
                    "Invalid label {label}: expected a value in [0, {n_classes})"
                )
            }
            EigenError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid hyperparameter: {param} = {value}, expected {constraint}"
                )
            }
            EigenError::EmptyInput { context } => write!(f, "Empty input: {context}"),
            EigenError::Io(e) => write!(f, "I/O error: {e}"),
            EigenError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            EigenError::Format { message } => write!(f, "Invalid archive format: {message}"),
        }
    }
}

impl std::error::Error for EigenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EigenError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EigenError {
    fn from(err: std::io::Error) -> Self {
        EigenError::Io(err)
    }
}

impl From<serde_json::Error> for EigenError {
    fn from(err: serde_json::Error) -> Self {
        EigenError::Serialization(err.to_string())
    }
}

impl EigenError {
    /// Create a shape mismatch error with descriptive context
    #[must_use]
    pub fn shape(context: &str, expected: usize, actual: usize) -> Self {
        Self::ShapeError {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Create an empty input error
    #[must_use]
    pub fn empty_input(context: &str) -> Self {
        Self::EmptyInput {
            context: context.to_string(),
        }
    }

    /// Create a missing-key error
    #[must_use]
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    /// Create a format error
    #[must_use]
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, EigenError>;
