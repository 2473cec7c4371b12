//! Core compute primitives (Vector, Matrix).
//!
//! Dense row-major containers shared by every model in the crate.

mod matrix;
mod vector;

pub use matrix::Matrix;
pub use vector::{argmax, Vector};
