//! eigendigit - PCA + softmax digit classifier CLI
//!
//! Usage:
//!   eigendigit train --data train.safetensors --out model.safetensors
//!   eigendigit evaluate --model model.safetensors --data test.safetensors
//!   eigendigit predict --model model.safetensors --image digit.png
//!   eigendigit inspect --model model.safetensors

use clap::{Parser, Subcommand};
use eigendigit::pipeline::FeatureKind;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;

use commands::{evaluate, inspect, predict, train};

/// eigendigit - handwritten digit classification
///
/// Train, evaluate and run PCA + softmax regression pipelines stored as
/// SafeTensors checkpoints.
#[derive(Parser)]
#[command(name = "eigendigit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (debug logs)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a pipeline on a labelled dataset archive
    Train {
        /// Dataset archive with `images` and `labels` arrays
        #[arg(long, value_name = "FILE")]
        data: PathBuf,

        /// Where to write the checkpoint
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,

        /// JSON pipeline configuration; flags below override it
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Feature transform: pca, raw or sobel
        #[arg(long)]
        features: Option<FeatureKind>,

        /// Number of principal components
        #[arg(long)]
        components: Option<usize>,

        /// Training epochs
        #[arg(long)]
        epochs: Option<usize>,

        /// Learning rate
        #[arg(long)]
        lr: Option<f64>,

        /// Number of classes
        #[arg(long)]
        classes: Option<usize>,
    },

    /// Score a checkpoint on a labelled dataset archive
    Evaluate {
        /// Checkpoint file
        #[arg(long, value_name = "FILE")]
        model: PathBuf,

        /// Dataset archive with `images` and `labels` arrays
        #[arg(long, value_name = "FILE")]
        data: PathBuf,

        /// Number of sample predictions to show
        #[arg(long, default_value = "5")]
        samples: usize,
    },

    /// Classify a single image file
    Predict {
        /// Checkpoint file
        #[arg(long, value_name = "FILE")]
        model: PathBuf,

        /// Image file (PNG, JPEG or BMP)
        #[arg(long, value_name = "FILE")]
        image: PathBuf,

        /// Show the full probability vector
        #[arg(long)]
        probs: bool,
    },

    /// List checkpoint arrays, shapes and metadata
    Inspect {
        /// Checkpoint file
        #[arg(long, value_name = "FILE")]
        model: PathBuf,
    },
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Train {
            data,
            out,
            config,
            features,
            components,
            epochs,
            lr,
            classes,
        } => train::run(
            &data,
            &out,
            config.as_deref(),
            train::Overrides {
                feature_kind: features,
                n_components: components,
                epochs,
                learning_rate: lr,
                n_classes: classes,
            },
            cli.json,
        ),

        Commands::Evaluate {
            model,
            data,
            samples,
        } => evaluate::run(&model, &data, samples, cli.json),

        Commands::Predict {
            model,
            image,
            probs,
        } => predict::run(&model, &image, probs, cli.json),

        Commands::Inspect { model } => inspect::run(&model, cli.json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}
