//! Matrix decomposition methods.
//!
//! Currently hosts [`PCA`], the eigendecomposition-based reducer placed in
//! front of the softmax classifier.

mod pca;

pub use pca::PCA;
