//! Eigendigit: handwritten-digit classification with PCA and softmax regression.
//!
//! The numerical core is two small models: a closed-form [`decomposition::PCA`]
//! reducer and a full-batch gradient-descent [`classification::SoftmaxRegression`].
//! Around them sit pluggable feature front ends, evaluation metrics, a
//! `SafeTensors` checkpoint format and a [`pipeline::DigitPipeline`] that ties
//! the pieces together.
//!
//! # Quick Start
//!
//! ```
//! use eigendigit::prelude::*;
//!
//! // Two clusters in 3-D
//! let x = Matrix::from_vec(6, 3, vec![
//!     1.0, 1.0, 0.0,
//!     1.1, 0.9, 0.1,
//!     0.9, 1.0, 0.0,
//!     -1.0, -1.0, 0.0,
//!     -1.1, -0.9, 0.1,
//!     -0.9, -1.0, 0.0,
//! ]).unwrap();
//! let y = vec![0, 0, 0, 1, 1, 1];
//!
//! // Reduce to one component, then classify
//! let mut pca = PCA::new(1);
//! let z = pca.fit_transform(&x).unwrap();
//!
//! let mut model = SoftmaxRegression::new(2).with_epochs(200);
//! model.fit(&z, &y).unwrap();
//! assert_eq!(model.predict(&z).unwrap(), y);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Core Vector and Matrix types
//! - [`decomposition`]: PCA
//! - [`classification`]: Softmax regression
//! - [`preprocessing`]: Image batches, pixel normalisation, raw and Sobel features
//! - [`metrics`]: Accuracy, macro precision/recall/F1, confusion matrix
//! - [`serialization`]: `SafeTensors` archives and checkpoints
//! - [`pipeline`]: Training and the load-once inference context

pub mod classification;
pub mod decomposition;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod serialization;
pub mod traits;

pub use error::{EigenError, Result};
pub use primitives::{Matrix, Vector};
pub use traits::{FeatureTransform, Transformer};
