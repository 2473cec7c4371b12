//! Inspect command implementation

use super::validate_path;
use crate::error::Result;
use crate::output;
use eigendigit::serialization::safetensors::load_safetensors;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Serialize)]
struct ArrayInfo {
    name: String,
    dtype: String,
    shape: Vec<usize>,
}

#[derive(Serialize)]
struct InspectResult {
    file: String,
    size_bytes: u64,
    arrays: Vec<ArrayInfo>,
    metadata: BTreeMap<String, String>,
}

pub(crate) fn run(model: &Path, json: bool) -> Result<()> {
    validate_path(model)?;
    let size_bytes = std::fs::metadata(model)?.len();
    let archive = load_safetensors(model)?;

    let arrays = archive
        .tensor_names()
        .into_iter()
        .filter_map(|name| {
            archive.get_metadata(name).map(|meta| ArrayInfo {
                name: name.to_string(),
                dtype: meta.dtype.clone(),
                shape: meta.shape.clone(),
            })
        })
        .collect();

    let result = InspectResult {
        file: model.display().to_string(),
        size_bytes,
        arrays,
        metadata: archive.user_metadata().clone(),
    };

    if json {
        return output::json(&result);
    }

    output::section("Checkpoint");
    output::kv("File", &result.file);
    output::kv("Size", format!("{} bytes", result.size_bytes));

    output::section("Arrays");
    for array in &result.arrays {
        output::kv(&array.name, format!("{} {:?}", array.dtype, array.shape));
    }

    if !result.metadata.is_empty() {
        output::section("Metadata");
        for (key, value) in &result.metadata {
            output::kv(key, value);
        }
    }
    Ok(())
}
