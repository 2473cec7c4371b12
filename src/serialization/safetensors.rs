//! `SafeTensors` format implementation for parameter archives.
//!
//! Implements the `SafeTensors` format:
//! ```text
//! [8-byte header: u64 metadata length (little-endian)]
//! [JSON metadata: tensor names, dtypes, shapes, data_offsets]
//! [Raw tensor data: little-endian values]
//! ```
//!
//! Arrays are written as `F64`. `F64`, `F32` and `U8` arrays can be read, so
//! archives exported by other tools (float32 weights, uint8 image batches)
//! load without conversion steps.

use super::safetensors_reader::{parse_metadata, validate_and_read_header};
use crate::error::{EigenError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub use super::safetensors_reader::extract_tensor;

/// Metadata for a single tensor in `SafeTensors` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorMetadata {
    /// Data type of the tensor (e.g., "F64").
    pub dtype: String,
    /// Shape of the tensor (e.g., `[n_features, n_classes]`).
    pub shape: Vec<usize>,
    /// Data offsets `[start, end]` in the raw data section.
    pub data_offsets: [usize; 2],
}

/// Tensor metadata keyed by name.
/// Uses `BTreeMap` for deterministic JSON serialization (sorted keys).
pub type SafeTensorsMetadata = BTreeMap<String, TensorMetadata>;

/// String metadata stored under the `__metadata__` header key.
pub type UserMetadata = BTreeMap<String, String>;

/// Named arrays: name -> (row-major values, shape).
pub type NamedArrays = BTreeMap<String, (Vec<f64>, Vec<usize>)>;

/// Number of elements of an array with this shape, `None` on overflow.
pub(crate) fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// Encodes arrays (and optional user metadata) into `SafeTensors` bytes.
///
/// # Errors
///
/// Returns an error if a value count disagrees with its shape or JSON
/// serialization fails.
pub fn to_bytes(tensors: &NamedArrays, user_metadata: &UserMetadata) -> Result<Vec<u8>> {
    let mut header = serde_json::Map::new();

    if !user_metadata.is_empty() {
        let meta_obj: serde_json::Map<String, serde_json::Value> = user_metadata
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        header.insert(
            "__metadata__".to_string(),
            serde_json::Value::Object(meta_obj),
        );
    }

    let mut raw_data = Vec::new();
    let mut current_offset = 0;

    // BTreeMap already provides sorted iteration
    for (name, (data, shape)) in tensors {
        if element_count(shape) != Some(data.len()) {
            return Err(EigenError::format(format!(
                "array '{name}' has {} values but shape {shape:?}",
                data.len()
            )));
        }

        let start_offset = current_offset;
        let end_offset = current_offset + data.len() * 8;

        let tensor_meta = TensorMetadata {
            dtype: "F64".to_string(),
            shape: shape.clone(),
            data_offsets: [start_offset, end_offset],
        };
        header.insert(name.clone(), serde_json::to_value(tensor_meta)?);

        for &value in data {
            raw_data.extend_from_slice(&value.to_le_bytes());
        }
        current_offset = end_offset;
    }

    let metadata_json = serde_json::to_string(&header)?;
    let metadata_bytes = metadata_json.as_bytes();
    let metadata_len = metadata_bytes.len() as u64;

    let mut output = Vec::with_capacity(8 + metadata_bytes.len() + raw_data.len());
    output.extend_from_slice(&metadata_len.to_le_bytes());
    output.extend_from_slice(metadata_bytes);
    output.extend_from_slice(&raw_data);
    Ok(output)
}

/// Saves arrays to a `SafeTensors` file.
///
/// # Errors
///
/// Returns an error if encoding or file writing fails.
pub fn save_safetensors<P: AsRef<Path>>(
    path: P,
    tensors: &NamedArrays,
    user_metadata: &UserMetadata,
) -> Result<()> {
    let bytes = to_bytes(tensors, user_metadata)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Loads a `SafeTensors` file into memory.
///
/// # Errors
///
/// Returns an error if:
/// - File reading fails
/// - Header is invalid (< 8 bytes)
/// - JSON parsing fails
pub fn load_safetensors<P: AsRef<Path>>(path: P) -> Result<SafeTensorsFile> {
    let bytes = fs::read(path)?;
    SafeTensorsFile::from_bytes(&bytes)
}

/// An in-memory `SafeTensors` archive.
#[derive(Debug, Clone)]
pub struct SafeTensorsFile {
    metadata: SafeTensorsMetadata,
    user_metadata: UserMetadata,
    raw_data: Vec<u8>,
}

impl SafeTensorsFile {
    /// Parses an archive from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the header or JSON metadata is malformed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let metadata_len = validate_and_read_header(bytes)?;
        let (metadata, user_metadata) = parse_metadata(bytes, metadata_len)?;
        Ok(Self {
            metadata,
            user_metadata,
            raw_data: bytes[8 + metadata_len..].to_vec(),
        })
    }

    /// Get tensor metadata by name.
    #[must_use]
    pub fn get_metadata(&self, name: &str) -> Option<&TensorMetadata> {
        self.metadata.get(name)
    }

    /// Whether an array with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.metadata.contains_key(name)
    }

    /// Array names in sorted order.
    #[must_use]
    pub fn tensor_names(&self) -> Vec<&str> {
        self.metadata.keys().map(String::as_str).collect()
    }

    /// Reads an array as `f64` values together with its shape.
    ///
    /// # Errors
    ///
    /// Returns [`EigenError::MissingKey`] if no such array exists, or a
    /// format error if its data is malformed.
    pub fn get_tensor(&self, name: &str) -> Result<(Vec<f64>, Vec<usize>)> {
        let meta = self
            .metadata
            .get(name)
            .ok_or_else(|| EigenError::missing_key(name))?;
        let values = extract_tensor(&self.raw_data, meta)?;
        if element_count(&meta.shape) != Some(values.len()) {
            return Err(EigenError::format(format!(
                "array '{name}' holds {} values but declares shape {:?}",
                values.len(),
                meta.shape
            )));
        }
        Ok((values, meta.shape.clone()))
    }

    /// String metadata from the `__metadata__` header section.
    #[must_use]
    pub fn user_metadata(&self) -> &UserMetadata {
        &self.user_metadata
    }

    /// Number of arrays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    /// Whether the archive holds no arrays.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NamedArrays {
        let mut tensors = NamedArrays::new();
        tensors.insert(
            "weights".to_string(),
            (vec![1.0, -2.0, 3.5, 0.25, 1e-12, -7.0], vec![3, 2]),
        );
        tensors.insert("b".to_string(), (vec![0.1, 0.2], vec![2]));
        tensors
    }

    #[test]
    fn test_bytes_round_trip_is_exact() {
        let mut meta = UserMetadata::new();
        meta.insert("feature_kind".to_string(), "pca".to_string());
        let bytes = to_bytes(&sample(), &meta).expect("encode");
        let archive = SafeTensorsFile::from_bytes(&bytes).expect("decode");

        assert_eq!(archive.len(), 2);
        assert_eq!(archive.tensor_names(), vec!["b", "weights"]);
        let (w, shape) = archive.get_tensor("weights").expect("present");
        assert_eq!(shape, vec![3, 2]);
        assert_eq!(w, sample()["weights"].0);
        assert_eq!(archive.user_metadata().get("feature_kind").map(String::as_str), Some("pca"));
    }

    #[test]
    fn test_header_layout() {
        let bytes = to_bytes(&sample(), &UserMetadata::new()).expect("encode");
        let header_len = u64::from_le_bytes(bytes[0..8].try_into().expect("8 bytes")) as usize;
        let json: serde_json::Value =
            serde_json::from_slice(&bytes[8..8 + header_len]).expect("valid json");
        assert_eq!(json["b"]["dtype"], "F64");
        assert_eq!(json["b"]["data_offsets"][0], 0);
        assert_eq!(json["b"]["data_offsets"][1], 16);
        assert_eq!(bytes.len(), 8 + header_len + 8 * 8);
    }

    #[test]
    fn test_missing_tensor_is_missing_key() {
        let bytes = to_bytes(&sample(), &UserMetadata::new()).expect("encode");
        let archive = SafeTensorsFile::from_bytes(&bytes).expect("decode");
        let err = archive.get_tensor("mu").expect_err("absent");
        assert!(matches!(err, EigenError::MissingKey { ref key } if key == "mu"));
    }

    #[test]
    fn test_shape_value_mismatch_rejected_on_write() {
        let mut tensors = NamedArrays::new();
        tensors.insert("x".to_string(), (vec![1.0, 2.0, 3.0], vec![2, 2]));
        assert!(to_bytes(&tensors, &UserMetadata::new()).is_err());
    }

    #[test]
    fn test_overflowing_shape_rejected() {
        let mut tensors = NamedArrays::new();
        tensors.insert("x".to_string(), (vec![], vec![1 << 32, 1 << 32]));
        assert!(to_bytes(&tensors, &UserMetadata::new()).is_err());

        // 2^32 * 2^32 wraps to 0, which would match the empty data section
        let header = br#"{"x":{"dtype":"F64","shape":[4294967296,4294967296],"data_offsets":[0,0]}}"#;
        let mut bytes = (header.len() as u64).to_le_bytes().to_vec();
        bytes.extend_from_slice(header);
        let archive = SafeTensorsFile::from_bytes(&bytes).expect("header parses");
        assert!(matches!(
            archive.get_tensor("x"),
            Err(EigenError::Format { .. })
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("arrays.safetensors");
        save_safetensors(&path, &sample(), &UserMetadata::new()).expect("save");
        let archive = load_safetensors(&path).expect("load");
        assert!(archive.contains("weights"));
        assert!(archive.user_metadata().is_empty());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_safetensors("/nonexistent/eigendigit.safetensors").expect_err("no file");
        assert!(matches!(err, EigenError::Io(_)));
    }
}
