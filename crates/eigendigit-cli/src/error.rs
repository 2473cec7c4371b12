//! Error types for the eigendigit CLI.

use eigendigit::EigenError;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Result type alias for CLI operations
pub(crate) type Result<T> = std::result::Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug)]
pub(crate) enum CliError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Not a file (e.g., directory)
    #[error("Not a file: {0}")]
    NotAFile(PathBuf),

    /// Malformed archive, config or checkpoint
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Checkpoint lacks a required array
    #[error("Missing key in checkpoint: {0}")]
    MissingKey(String),

    /// Bad user input: hyperparameters, labels, shapes
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Image could not be decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other library failure
    #[error("Model error: {0}")]
    Model(String),
}

impl CliError {
    /// Get exit code for this error
    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            Self::Model(_) => ExitCode::from(1),
            Self::FileNotFound(_) | Self::NotAFile(_) => ExitCode::from(3),
            Self::InvalidFormat(_) => ExitCode::from(4),
            Self::ValidationFailed(_) => ExitCode::from(5),
            Self::MissingKey(_) => ExitCode::from(6),
            Self::Io(_) => ExitCode::from(7),
            Self::Image(_) => ExitCode::from(8),
        }
    }
}

impl From<EigenError> for CliError {
    fn from(e: EigenError) -> Self {
        match e {
            EigenError::Io(io) => Self::Io(io),
            EigenError::MissingKey { key } => Self::MissingKey(key),
            EigenError::Format { .. } | EigenError::Serialization(_) => {
                Self::InvalidFormat(e.to_string())
            }
            EigenError::ShapeError { .. }
            | EigenError::InvalidLabel { .. }
            | EigenError::InvalidHyperparameter { .. }
            | EigenError::EmptyInput { .. } => Self::ValidationFailed(e.to_string()),
            EigenError::NotFitted { .. } => Self::Model(e.to_string()),
        }
    }
}
