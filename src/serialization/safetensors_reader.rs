use super::safetensors::{SafeTensorsMetadata, TensorMetadata, UserMetadata};
use crate::error::{EigenError, Result};

pub(super) fn validate_and_read_header(bytes: &[u8]) -> Result<usize> {
    if bytes.len() < 8 {
        return Err(EigenError::format(format!(
            "file is {} bytes, need at least 8 bytes for header",
            bytes.len()
        )));
    }

    let header_bytes: [u8; 8] = bytes[0..8]
        .try_into()
        .map_err(|_| EigenError::format("failed to read header bytes"))?;
    let metadata_len = usize::try_from(u64::from_le_bytes(header_bytes))
        .map_err(|_| EigenError::format("metadata length does not fit in memory"))?;

    if metadata_len == 0 {
        return Err(EigenError::format("metadata length is 0"));
    }

    if metadata_len > bytes.len() - 8 {
        return Err(EigenError::format(format!(
            "metadata length {metadata_len} exceeds file size"
        )));
    }

    Ok(metadata_len)
}

pub(super) fn parse_metadata(
    bytes: &[u8],
    metadata_len: usize,
) -> Result<(SafeTensorsMetadata, UserMetadata)> {
    let metadata_json = &bytes[8..8 + metadata_len];
    let metadata_str = std::str::from_utf8(metadata_json)
        .map_err(|e| EigenError::format(format!("metadata is not valid UTF-8: {e}")))?;

    let raw_metadata: serde_json::Value = serde_json::from_str(metadata_str)?;

    let serde_json::Value::Object(map) = raw_metadata else {
        return Err(EigenError::format("metadata header is not a JSON object"));
    };

    let mut metadata = SafeTensorsMetadata::new();
    let mut user_metadata = UserMetadata::new();

    for (key, value) in map {
        if key == "__metadata__" {
            extract_user_metadata(value, &mut user_metadata);
            continue;
        }
        if key.starts_with("__") {
            continue;
        }
        let tensor_meta: TensorMetadata = serde_json::from_value(value)
            .map_err(|e| EigenError::format(format!("bad entry for array '{key}': {e}")))?;
        metadata.insert(key, tensor_meta);
    }

    Ok((metadata, user_metadata))
}

/// Keeps only string values of the `__metadata__` object.
fn extract_user_metadata(value: serde_json::Value, user_metadata: &mut UserMetadata) {
    let serde_json::Value::Object(meta_map) = value else {
        return;
    };
    for (mk, mv) in meta_map {
        if let serde_json::Value::String(s) = mv {
            user_metadata.insert(mk, s);
        }
    }
}

/// Extracts a tensor from the raw data section as `f64` values.
///
/// # Errors
///
/// Returns an error if:
/// - Data offsets are invalid
/// - Data size doesn't match dtype requirements
/// - Unsupported dtype
pub fn extract_tensor(raw_data: &[u8], tensor_meta: &TensorMetadata) -> Result<Vec<f64>> {
    let [start, end] = tensor_meta.data_offsets;

    if end > raw_data.len() {
        return Err(EigenError::format(format!(
            "data offset end={end} exceeds data size={}",
            raw_data.len()
        )));
    }
    if start > end {
        return Err(EigenError::format(format!(
            "data offset start={start} > end={end}"
        )));
    }

    let tensor_bytes = &raw_data[start..end];

    match tensor_meta.dtype.as_str() {
        "F64" => decode::<8>(tensor_bytes, "F64", f64::from_le_bytes),
        "F32" => decode::<4>(tensor_bytes, "F32", |b| f64::from(f32::from_le_bytes(b))),
        "U8" => Ok(tensor_bytes.iter().map(|&b| f64::from(b)).collect()),
        other => Err(EigenError::format(format!(
            "unsupported dtype {other}, supported: F64, F32, U8"
        ))),
    }
}

fn decode<const N: usize>(
    tensor_bytes: &[u8],
    dtype: &str,
    convert: impl Fn([u8; N]) -> f64,
) -> Result<Vec<f64>> {
    if tensor_bytes.len() % N != 0 {
        return Err(EigenError::format(format!(
            "{dtype} tensor data size {} is not a multiple of {N} bytes",
            tensor_bytes.len()
        )));
    }

    Ok(tensor_bytes
        .chunks_exact(N)
        .map(|chunk| {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(chunk);
            convert(bytes)
        })
        .collect())
}
