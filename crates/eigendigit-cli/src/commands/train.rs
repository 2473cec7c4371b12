//! Train command implementation

use super::validate_path;
use crate::error::Result;
use crate::output;
use eigendigit::pipeline::{self, FeatureKind, LabeledImages, PipelineConfig};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) feature_kind: Option<FeatureKind>,
    pub(crate) n_components: Option<usize>,
    pub(crate) epochs: Option<usize>,
    pub(crate) learning_rate: Option<f64>,
    pub(crate) n_classes: Option<usize>,
}

impl Overrides {
    fn apply(self, config: &mut PipelineConfig) {
        if let Some(kind) = self.feature_kind {
            config.feature_kind = kind;
        }
        if let Some(k) = self.n_components {
            config.n_components = k;
        }
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(lr) = self.learning_rate {
            config.learning_rate = lr;
        }
        if let Some(n) = self.n_classes {
            config.n_classes = n;
        }
    }
}

#[derive(Serialize)]
struct TrainSummary {
    checkpoint: String,
    config: PipelineConfig,
    n_samples: usize,
    train_accuracy: f64,
    first_loss: Option<f64>,
    final_loss: Option<f64>,
    explained_variance: Option<f64>,
}

pub(crate) fn run(
    data: &Path,
    out: &Path,
    config_path: Option<&Path>,
    overrides: Overrides,
    json: bool,
) -> Result<()> {
    validate_path(data)?;
    let mut config = match config_path {
        Some(path) => {
            validate_path(path)?;
            PipelineConfig::from_json_file(path)?
        }
        None => PipelineConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;

    let dataset = LabeledImages::load(data)?;
    info!(samples = dataset.len(), path = %data.display(), "dataset loaded");

    let outcome = pipeline::train(&config, &dataset.images, &dataset.labels)?;
    outcome.pipeline.save(out)?;

    let summary = TrainSummary {
        checkpoint: out.display().to_string(),
        config,
        n_samples: dataset.len(),
        train_accuracy: outcome.train_accuracy,
        first_loss: outcome.loss_history.first().copied(),
        final_loss: outcome.loss_history.last().copied(),
        explained_variance: outcome
            .explained_variance_ratio
            .as_ref()
            .map(|r| r.iter().sum()),
    };

    if json {
        return output::json(&summary);
    }

    output::section("Training");
    output::kv("Samples", summary.n_samples);
    output::kv("Features", summary.config.feature_kind);
    if summary.config.feature_kind == FeatureKind::Pca {
        output::kv("Components", summary.config.n_components);
    }
    output::kv("Epochs", summary.config.epochs);
    output::kv("Learning rate", summary.config.learning_rate);
    if let Some(ratio) = summary.explained_variance {
        output::kv("Explained variance", output::percent(ratio));
    }
    if let (Some(first), Some(last)) = (summary.first_loss, summary.final_loss) {
        output::kv("Loss", format!("{first:.4} -> {last:.4}"));
        if last > first {
            output::warning("loss increased during training; try a smaller learning rate");
        }
    }
    output::kv("Train accuracy", output::percent(summary.train_accuracy));
    output::success(&format!("checkpoint written to {}", summary.checkpoint));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = PipelineConfig::default();
        Overrides {
            feature_kind: Some(FeatureKind::Sobel),
            epochs: Some(5),
            ..Overrides::default()
        }
        .apply(&mut config);
        assert_eq!(config.feature_kind, FeatureKind::Sobel);
        assert_eq!(config.epochs, 5);
        assert_eq!(config.n_components, 100);
    }
}
