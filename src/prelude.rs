//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use eigendigit::prelude::*;
//! ```

pub use crate::classification::SoftmaxRegression;
pub use crate::decomposition::PCA;
pub use crate::metrics::{accuracy, evaluate_multiclass, MulticlassReport};
pub use crate::pipeline::{train, DigitPipeline, FeatureKind, PipelineConfig};
pub use crate::preprocessing::{normalize_pixels, ImageBatch};
pub use crate::primitives::{Matrix, Vector};
pub use crate::traits::{FeatureTransform, Transformer};
