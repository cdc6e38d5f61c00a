//! Legacy bundle to single-pipeline conversion

use anyhow::{Context, Result};
use demand_lib::artifact::repackage_bytes;
use demand_lib::estimator::EstimatorSpec;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Read the bundle at `input`, write the pipeline description to `output`
///
/// A relative graph path is rewritten when the pipeline lands in another
/// directory, and the result is loaded once before anything is written.
pub fn run(input: &Path, output: &Path) -> Result<EstimatorSpec> {
    let bytes = fs::read(input)
        .with_context(|| format!("Failed to read bundle from {}", input.display()))?;
    let mut pipeline = repackage_bytes(&bytes)
        .with_context(|| format!("Failed to repackage {}", input.display()))?;

    let input_dir = directory_of(input);
    let output_dir = directory_of(output);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    if !same_directory(&input_dir, &output_dir) {
        if let EstimatorSpec::Pipeline(spec) = &mut pipeline {
            if spec.graph.is_relative() {
                let source = input_dir.join(&spec.graph);
                spec.graph = fs::canonicalize(&source)
                    .with_context(|| format!("Failed to locate graph {}", source.display()))?;
            }
        }
    }

    pipeline
        .build(&output_dir)
        .with_context(|| format!("Repackaged pipeline from {} does not load", input.display()))?;

    let json = serde_json::to_vec_pretty(&pipeline)?;
    fs::write(output, json)
        .with_context(|| format!("Failed to write pipeline to {}", output.display()))?;

    info!(
        event = "model_repackaged",
        input = %input.display(),
        output = %output.display(),
        estimator = pipeline.name(),
        "Repackaged bundle into a single pipeline"
    );
    Ok(pipeline)
}

fn directory_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demand_lib::artifact::{self, ArtifactKind};
    use demand_lib::estimator::Predictor;
    use demand_lib::models::FeatureValue;

    const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../demand-lib/tests/fixtures");

    const BUNDLE: &str = r#"{
        "model": "sum3.onnx",
        "input_cols": ["price", "current_stock", "location"],
        "numeric_cols": ["price", "current_stock"],
        "categorical_cols": ["location"],
        "imputer": {"statistics": [0.0, 0.0]},
        "scaler": {"mean": [0.0, 0.0], "scale": [1.0, 1.0]},
        "encoder": {"categories": [["Warehouse A", "Warehouse B"]]}
    }"#;

    fn bundle_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::copy(
            Path::new(FIXTURES).join("sum3.onnx"),
            dir.path().join("sum3.onnx"),
        )
        .unwrap();
        fs::write(dir.path().join("bundle.json"), BUNDLE).unwrap();
        dir
    }

    #[test]
    fn test_writes_loadable_pipeline() {
        let dir = bundle_dir();
        let input = dir.path().join("bundle.json");
        let output = dir.path().join("out").join("pipeline.json");

        let pipeline = run(&input, &output).unwrap();
        assert_eq!(pipeline.name(), "pipeline");

        let loaded = artifact::load(&output).unwrap();
        assert_eq!(loaded.kind(), ArtifactKind::BareEstimator);
        let row = vec![
            FeatureValue::Number(2.0),
            FeatureValue::Number(3.0),
            FeatureValue::from("Warehouse B"),
        ];
        assert_eq!(loaded.estimator().predict(&[row]).unwrap(), vec![6.0]);
    }

    #[test]
    fn test_graph_path_kept_relative_in_place() {
        let dir = bundle_dir();
        let input = dir.path().join("bundle.json");
        let output = dir.path().join("pipeline.json");

        match run(&input, &output).unwrap() {
            EstimatorSpec::Pipeline(spec) => assert_eq!(spec.graph, PathBuf::from("sum3.onnx")),
            other => panic!("expected a pipeline, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_graph_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bundle.json");
        fs::write(&input, BUNDLE).unwrap();

        let output = dir.path().join("pipeline.json");
        assert!(run(&input, &output).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_rejects_bare_estimator() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bare.json");
        fs::write(&input, r#"{"type": "onnx", "graph": "sum3.onnx"}"#).unwrap();

        let err = run(&input, &dir.path().join("out.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("expected a mapping"));
        assert!(!dir.path().join("out.json").exists());
    }
}
