//! Classification algorithms.
//!
//! - [`SoftmaxRegression`]: multinomial logistic regression trained by
//!   full-batch gradient descent.
//!
//! # Example
//!
//! ```
//! use eigendigit::classification::SoftmaxRegression;
//! use eigendigit::prelude::*;
//!
//! let x = Matrix::from_vec(4, 2, vec![
//!     0.0, 0.0,
//!     0.0, 1.0,
//!     1.0, 0.0,
//!     1.0, 1.0,
//! ]).expect("Matrix dimensions match data length");
//! let y = vec![0, 0, 0, 1];
//!
//! let mut model = SoftmaxRegression::new(2)
//!     .with_learning_rate(0.1)
//!     .with_epochs(1000);
//! model.fit(&x, &y).expect("Training data is valid with 4 samples");
//! let predictions = model.predict(&x).expect("fitted model");
//!
//! assert_eq!(predictions.len(), 4);
//! assert!(predictions.iter().all(|&p| p < 2));
//! ```

mod softmax;

pub use softmax::SoftmaxRegression;
