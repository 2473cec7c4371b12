//! Evaluate command implementation

use super::validate_path;
use crate::error::Result;
use crate::output;
use eigendigit::metrics::{evaluate_multiclass, MulticlassReport};
use eigendigit::pipeline::{DigitPipeline, LabeledImages};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct SamplePrediction {
    index: usize,
    predicted: usize,
    actual: usize,
}

#[derive(Serialize)]
struct EvaluateResult {
    model: String,
    n_samples: usize,
    #[serde(flatten)]
    report: MulticlassReport,
    samples: Vec<SamplePrediction>,
}

pub(crate) fn run(model: &Path, data: &Path, n_samples: usize, json: bool) -> Result<()> {
    validate_path(model)?;
    validate_path(data)?;

    let pipeline = DigitPipeline::load(model)?;
    let dataset = LabeledImages::load(data)?;

    let predictions = pipeline.predict(&dataset.images)?;
    let report = evaluate_multiclass(&predictions, &dataset.labels, pipeline.n_classes())?;
    let samples = predictions
        .iter()
        .zip(&dataset.labels)
        .take(n_samples)
        .enumerate()
        .map(|(index, (&predicted, &actual))| SamplePrediction {
            index,
            predicted,
            actual,
        })
        .collect();

    let result = EvaluateResult {
        model: model.display().to_string(),
        n_samples: dataset.len(),
        report,
        samples,
    };

    if json {
        return output::json(&result);
    }

    output::section("Evaluation");
    output::kv("Model", &result.model);
    output::kv("Features", pipeline.feature_kind());
    output::kv("Samples", result.n_samples);
    output::report(&result.report);

    output::section("Confusion matrix");
    output::confusion(&result.report.confusion);

    if !result.samples.is_empty() {
        output::section("Sample predictions");
        for s in &result.samples {
            output::kv(
                &format!("#{}", s.index),
                format!("predicted {} (actual {})", s.predicted, s.actual),
            );
        }
    }
    Ok(())
}
