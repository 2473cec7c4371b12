//! CLI integration tests for eigendigit

#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use eigendigit::pipeline::LabeledImages;
use eigendigit::preprocessing::ImageBatch;
use eigendigit::serialization::safetensors::{save_safetensors, NamedArrays, UserMetadata};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

fn eigendigit() -> Command {
    Command::cargo_bin("eigendigit").expect("Failed to find eigendigit binary")
}

/// 4x4 images where class `c` has a bright row `c`, values in 0..255.
fn striped(c: usize) -> Vec<f64> {
    (0..16)
        .map(|i| if i / 4 == c { 230.0 } else { 15.0 })
        .collect()
}

fn write_dataset(dir: &TempDir) -> PathBuf {
    let mut pixels = Vec::new();
    let mut labels = Vec::new();
    for rep in 0..4 {
        for class in 0..3 {
            pixels.extend(striped(class).into_iter().map(|v| v + rep as f64));
            labels.push(class);
        }
    }
    let images = ImageBatch::from_tensor(&[labels.len(), 4, 4], pixels).unwrap();
    let path = dir.path().join("digits.safetensors");
    LabeledImages::new(images, labels).unwrap().save(&path).unwrap();
    path
}

fn train_model(dir: &TempDir, features: &str) -> PathBuf {
    let data = write_dataset(dir);
    let out = dir.path().join(format!("{features}.safetensors"));
    eigendigit()
        .args(["train", "--data"])
        .arg(&data)
        .arg("--out")
        .arg(&out)
        .args(["--features", features, "--components", "3", "--classes", "3"])
        .args(["--epochs", "200", "--lr", "0.1"])
        .assert()
        .success();
    out
}

fn write_png(path: &Path, bright_row: u32) {
    let img = image::GrayImage::from_fn(4, 4, |_, y| {
        image::Luma([if y == bright_row { 230 } else { 15 }])
    });
    img.save(path).unwrap();
}

// ============================================================================
// Help and argument parsing
// ============================================================================

#[test]
fn test_help_lists_subcommands() {
    eigendigit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("evaluate"))
        .stdout(predicate::str::contains("predict"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn test_unknown_feature_kind_rejected() {
    eigendigit()
        .args(["train", "--data", "d", "--out", "o", "--features", "hog"])
        .assert()
        .failure()
        .code(2);
}

// ============================================================================
// Train / evaluate / predict / inspect
// ============================================================================

#[test]
fn test_train_writes_checkpoint() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);
    let out = dir.path().join("model.safetensors");
    eigendigit()
        .args(["train", "--data"])
        .arg(&data)
        .arg("--out")
        .arg(&out)
        .args(["--components", "3", "--classes", "3", "--epochs", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Train accuracy"));
    assert!(out.is_file());
}

#[test]
fn test_train_json_summary() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);
    let out = dir.path().join("model.safetensors");
    let assert = eigendigit()
        .args(["--json", "train", "--data"])
        .arg(&data)
        .arg("--out")
        .arg(&out)
        .args(["--features", "raw", "--classes", "3", "--epochs", "50"])
        .assert()
        .success();
    let json: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(json["config"]["feature_kind"], "raw");
    assert_eq!(json["n_samples"], 12);
}

#[test]
fn test_train_with_config_file() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);
    let config = dir.path().join("config.json");
    std::fs::write(
        &config,
        r#"{"feature_kind": "sobel", "n_classes": 3, "epochs": 50}"#,
    )
    .unwrap();
    let out = dir.path().join("model.safetensors");
    eigendigit()
        .args(["train", "--data"])
        .arg(&data)
        .arg("--out")
        .arg(&out)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    eigendigit()
        .args(["inspect", "--model"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("sobel"));
}

#[test]
fn test_evaluate_reports_metrics() {
    let dir = TempDir::new().unwrap();
    let model = train_model(&dir, "pca");
    let data = dir.path().join("digits.safetensors");
    eigendigit()
        .args(["evaluate", "--model"])
        .arg(&model)
        .arg("--data")
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("Accuracy"))
        .stdout(predicate::str::contains("Confusion matrix"))
        .stdout(predicate::str::contains("Sample predictions"));
}

#[test]
fn test_evaluate_json() {
    let dir = TempDir::new().unwrap();
    let model = train_model(&dir, "raw");
    let data = dir.path().join("digits.safetensors");
    let assert = eigendigit()
        .args(["evaluate", "--json", "--model"])
        .arg(&model)
        .arg("--data")
        .arg(&data)
        .assert()
        .success();
    let json: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert!(json["accuracy"].as_f64().unwrap() > 0.9);
    assert_eq!(json["samples"].as_array().unwrap().len(), 5);
    assert_eq!(json["n_samples"], 12);
}

#[test]
fn test_predict_png() {
    let dir = TempDir::new().unwrap();
    let model = train_model(&dir, "pca");
    let png = dir.path().join("digit.png");
    write_png(&png, 2);

    let assert = eigendigit()
        .args(["--json", "predict", "--probs", "--model"])
        .arg(&model)
        .arg("--image")
        .arg(&png)
        .assert()
        .success();
    let json: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(json["label"], 2);
    let probs = json["probabilities"].as_array().unwrap();
    assert_eq!(probs.len(), 3);
    let total: f64 = probs.iter().map(|p| p.as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_inspect_lists_arrays() {
    let dir = TempDir::new().unwrap();
    let model = train_model(&dir, "pca");
    eigendigit()
        .args(["inspect", "--model"])
        .arg(&model)
        .assert()
        .success()
        .stdout(predicate::str::contains("weights"))
        .stdout(predicate::str::contains("U_m"))
        .stdout(predicate::str::contains("mu"))
        .stdout(predicate::str::contains("feature_kind"));
}

// ============================================================================
// Failure exit codes
// ============================================================================

#[test]
fn test_missing_model_file() {
    eigendigit()
        .args(["inspect", "--model", "/nonexistent/model.safetensors"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_directory_is_not_a_file() {
    let dir = TempDir::new().unwrap();
    eigendigit()
        .args(["inspect", "--model"])
        .arg(dir.path())
        .assert()
        .failure()
        .code(3);
}

#[test]
fn test_checkpoint_missing_basis() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.safetensors");
    let mut tensors = NamedArrays::new();
    tensors.insert("W".to_string(), (vec![0.0; 6], vec![2, 3]));
    tensors.insert("b".to_string(), (vec![0.0; 3], vec![3]));
    tensors.insert("mu".to_string(), (vec![0.0; 4], vec![4]));
    save_safetensors(&path, &tensors, &UserMetadata::new()).unwrap();

    let data = write_dataset(&dir);
    eigendigit()
        .args(["evaluate", "--model"])
        .arg(&path)
        .arg("--data")
        .arg(&data)
        .assert()
        .failure()
        .code(6)
        .stderr(predicate::str::contains("U_m"));
}

#[test]
fn test_garbage_checkpoint() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.safetensors");
    std::fs::write(&path, b"not a safetensors file").unwrap();
    eigendigit()
        .args(["inspect", "--model"])
        .arg(&path)
        .assert()
        .failure()
        .code(4);
}

#[test]
fn test_out_of_range_labels() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);
    let out = dir.path().join("model.safetensors");
    eigendigit()
        .args(["train", "--data"])
        .arg(&data)
        .arg("--out")
        .arg(&out)
        .args(["--features", "raw", "--classes", "2", "--epochs", "5"])
        .assert()
        .failure()
        .code(5)
        .stderr(predicate::str::contains("label"));
}
