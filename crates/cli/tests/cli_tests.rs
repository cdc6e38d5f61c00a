//! CLI integration tests

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const PREDICT: &str = env!("CARGO_BIN_EXE_predict-demand");
const IMPORTANCE: &str = env!("CARGO_BIN_EXE_feature-importance");
const REPACKAGE: &str = env!("CARGO_BIN_EXE_repackage-model");

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../demand-lib/tests/fixtures");

/// Constant graph: raw prediction 100 for every row
const CONSTANT_BUNDLE: &str = r#"{
    "model": "const100_2.onnx",
    "input_cols": ["current_stock", "price"],
    "feature_importance": {"current_stock": 0.25, "price": 0.5, "month": 0.25}
}"#;

fn write_model(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write model");
    path.to_string_lossy().into_owned()
}

/// Place a fixture graph next to the artifacts written into `dir`
fn copy_graph(dir: &Path, name: &str) {
    fs::copy(Path::new(FIXTURES).join(name), dir.join(name)).expect("Failed to copy graph");
}

fn run(bin: &str, args: &[&str]) -> Output {
    Command::new(bin)
        .args(args)
        .env_remove("DEMAND_MODEL_PATH")
        .output()
        .expect("Failed to execute command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Test that the prediction CLI shows help
#[test]
fn test_predict_help() {
    let output = run(PREDICT, &["--help"]);
    let text = stdout(&output);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(text.contains("PRODUCT_ID"), "Should show product_id argument");
    assert!(text.contains("--strict-exit"), "Should show strict-exit flag");
}

#[test]
fn test_predict_with_model() {
    let dir = tempfile::tempdir().unwrap();
    copy_graph(dir.path(), "const100_2.onnx");
    let model = write_model(dir.path(), "model.json", CONSTANT_BUNDLE);

    let output = run(PREDICT, &["7", "5", "10.0", "--model", &model]);

    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "150.0");
    assert!(!stderr(&output).contains("Prediction error"));
}

#[test]
fn test_predict_missing_model_falls_back_and_exits_zero() {
    let output = run(PREDICT, &["7", "5", "10.0", "--model", "/nonexistent/model.json"]);

    assert!(output.status.success(), "Fallback must not fail the process");
    assert_eq!(stdout(&output).trim(), "200");
    assert!(stderr(&output).contains("Prediction error:"));
}

#[test]
fn test_predict_strict_exit_reports_fallback() {
    let output = run(
        PREDICT,
        &["7", "500", "10.0", "--model", "/nonexistent/model.json", "--strict-exit"],
    );

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout(&output).trim(), "50");
}

#[test]
fn test_predict_strict_exit_with_model_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    copy_graph(dir.path(), "const100_2.onnx");
    let model = write_model(dir.path(), "model.json", CONSTANT_BUNDLE);

    let output = run(PREDICT, &["7", "120", "10.0", "--model", &model, "--strict-exit"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "30.0");
}

#[test]
fn test_predict_rejects_non_numeric_arguments() {
    let output = run(PREDICT, &["seven", "5", "10.0"]);
    assert!(!output.status.success());
}

#[test]
fn test_feature_importance_report() {
    let dir = tempfile::tempdir().unwrap();
    copy_graph(dir.path(), "const100_2.onnx");
    let model = write_model(dir.path(), "model.json", CONSTANT_BUNDLE);

    let output = run(IMPORTANCE, &["--model", &model]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["labels"], serde_json::json!(["current_stock", "price", "month"]));
    let sum: f64 = report["values"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .sum();
    assert!((sum - 1.0).abs() < 1e-9);
}

#[test]
fn test_feature_importance_error_payload_exits_zero() {
    let output = run(IMPORTANCE, &["--model", "/nonexistent/model.json"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(report["error"].is_string());
}

#[test]
fn test_repackage_writes_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    copy_graph(dir.path(), "sum2.onnx");
    let input = write_model(
        dir.path(),
        "bundle.json",
        r#"{
            "model": "sum2.onnx",
            "input_cols": ["current_stock", "price"],
            "numeric_cols": ["current_stock", "price"],
            "imputer": {"statistics": [0.0, 0.0]}
        }"#,
    );
    let output_path = dir.path().join("pipeline.json");

    let output = run(
        REPACKAGE,
        &["--input", &input, "--output", &output_path.to_string_lossy()],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(output_path.exists());

    let pipeline: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(pipeline["type"], "pipeline");
    assert_eq!(pipeline["graph"], "sum2.onnx");
}

#[test]
fn test_repackage_fails_on_bare_estimator() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_model(dir.path(), "bare.json", r#"{"type": "onnx", "graph": "sum2.onnx"}"#);
    let output_path = dir.path().join("pipeline.json");

    let output = run(
        REPACKAGE,
        &["--input", &input, "--output", &output_path.to_string_lossy()],
    );
    assert!(!output.status.success());
    assert!(!output_path.exists());
}
