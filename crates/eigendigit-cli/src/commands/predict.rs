//! Predict command implementation
//!
//! Decodes one image, converts it to grayscale, resizes it to the
//! checkpoint's image side and scales pixels into `[0, 1]` before
//! classification.

use super::validate_path;
use crate::error::{CliError, Result};
use crate::output;
use eigendigit::pipeline::DigitPipeline;
use eigendigit::preprocessing::ImageBatch;
use eigendigit::primitives::argmax;
use image::imageops::FilterType;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

#[derive(Serialize)]
struct PredictResult {
    image: String,
    label: usize,
    probability: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    probabilities: Option<Vec<f64>>,
}

/// Loads an image as a `1 x side x side` batch of `[0, 1]` intensities.
fn load_image(path: &Path, side: usize) -> Result<ImageBatch> {
    let gray = image::open(path)?.to_luma8();
    debug!(
        width = gray.width(),
        height = gray.height(),
        side,
        "image decoded"
    );
    let target = u32::try_from(side)
        .map_err(|_| CliError::ValidationFailed(format!("image side {side} is too large")))?;
    let resized = image::imageops::resize(&gray, target, target, FilterType::CatmullRom);
    let pixels = resized
        .into_raw()
        .into_iter()
        .map(|p| f64::from(p) / 255.0)
        .collect();
    Ok(ImageBatch::from_tensor(&[1, side, side], pixels)?)
}

pub(crate) fn run(model: &Path, image_path: &Path, show_probs: bool, json: bool) -> Result<()> {
    validate_path(model)?;
    validate_path(image_path)?;

    let pipeline = DigitPipeline::load(model)?;
    let side = pipeline.image_side().ok_or_else(|| {
        CliError::ValidationFailed(format!(
            "checkpoint expects {} pixels, which is not a square image",
            pipeline.input_dim()
        ))
    })?;

    let batch = load_image(image_path, side)?;
    let proba = pipeline.predict_proba(&batch)?;
    let row = proba.row_slice(0);
    let label = argmax(row).ok_or_else(|| CliError::Model("empty probability row".to_string()))?;

    let result = PredictResult {
        image: image_path.display().to_string(),
        label,
        probability: row[label],
        probabilities: show_probs.then(|| row.to_vec()),
    };

    if json {
        return output::json(&result);
    }

    output::section("Prediction");
    output::kv("Image", &result.image);
    output::kv("Label", result.label);
    output::kv("Probability", output::percent(result.probability));
    if let Some(probs) = &result.probabilities {
        output::section("Class probabilities");
        for (class, p) in probs.iter().enumerate() {
            output::kv(&class.to_string(), format!("{p:.4}"));
        }
    }
    Ok(())
}
