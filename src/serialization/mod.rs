//! Model Serialization Module
//!
//! Parameters are persisted as a `SafeTensors` archive of named arrays:
//! ```text
//! [8-byte header: u64 metadata length (little-endian)]
//! [JSON metadata: tensor names, dtypes, shapes, data_offsets, __metadata__]
//! [Raw tensor data: F64 values in little-endian]
//! ```
//!
//! [`Checkpoint`] layers the required-key contract of a trained pipeline on
//! top of the raw archive.
//!
//! Example:
//! ```rust
//! use eigendigit::serialization::safetensors::{load_safetensors, save_safetensors};
//! use std::collections::BTreeMap;
//!
//! let mut tensors = BTreeMap::new();
//! tensors.insert("b".to_string(), (vec![0.5, -0.5], vec![2]));
//! let path = std::env::temp_dir().join("eigendigit_doc_bias.safetensors");
//! save_safetensors(&path, &tensors, &BTreeMap::new()).unwrap();
//!
//! let archive = load_safetensors(&path).unwrap();
//! let (values, shape) = archive.get_tensor("b").unwrap();
//! assert_eq!(values, vec![0.5, -0.5]);
//! assert_eq!(shape, vec![2]);
//! # std::fs::remove_file(&path).ok();
//! ```

mod checkpoint;
pub mod safetensors;
mod safetensors_reader;

pub use checkpoint::Checkpoint;
pub use safetensors::{SafeTensorsFile, SafeTensorsMetadata, TensorMetadata, UserMetadata};
