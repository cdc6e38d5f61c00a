//! Folds a legacy multi-piece bundle into one self-contained pipeline
//!
//! The legacy bundle stores the estimator next to separately fitted
//! imputer, scaler and encoder objects plus the column lists they apply
//! to. The output is a single `pipeline` description (preprocessing plus the
//! bundle's ONNX graph) that can be loaded as a bare artifact.

use crate::estimator::{
    ColumnTransform, ColumnTransformer, EstimatorSpec, ModelSource, OrdinalEncoder, PipelineSpec,
    SimpleImputer, StandardScaler, Step,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

/// Error type for bundle repackaging
#[derive(Debug, Error)]
pub enum RepackageError {
    #[error("expected a mapping with keys: model, imputer, scaler, encoder, input_cols, numeric_cols, categorical_cols: {0}")]
    NotComposite(String),
    #[error("bundle has no input_cols")]
    MissingInputColumns,
    #[error("column '{0}' is not listed in input_cols")]
    UnknownColumn(String),
    #[error("no transformers could be constructed")]
    NoTransformers,
    #[error("bundle model is already a pipeline")]
    AlreadyPipeline,
    #[error("repackaged pipeline is invalid: {0}")]
    Invalid(String),
}

/// Full legacy bundle document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleDocument {
    pub model: ModelSource,
    #[serde(default)]
    pub input_cols: Option<Vec<String>>,
    #[serde(default)]
    pub numeric_cols: Option<Vec<String>>,
    #[serde(default)]
    pub categorical_cols: Option<Vec<String>>,
    #[serde(default)]
    pub imputer: Option<SimpleImputer>,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    #[serde(default)]
    pub encoder: Option<OrdinalEncoder>,
    #[serde(default)]
    pub feature_importance: Option<Map<String, Value>>,
}

/// Parse a legacy bundle and repackage it
pub fn repackage_bytes(bytes: &[u8]) -> Result<EstimatorSpec, RepackageError> {
    let document: BundleDocument =
        serde_json::from_slice(bytes).map_err(|e| RepackageError::NotComposite(e.to_string()))?;
    repackage(document)
}

/// Build `preprocessing -> estimator` from the bundle's pieces
pub fn repackage(document: BundleDocument) -> Result<EstimatorSpec, RepackageError> {
    let graph = match document.model.into_spec() {
        EstimatorSpec::Onnx { graph } => graph,
        EstimatorSpec::Pipeline(_) => return Err(RepackageError::AlreadyPipeline),
    };

    let input_cols = document
        .input_cols
        .filter(|cols| !cols.is_empty())
        .ok_or(RepackageError::MissingInputColumns)?;

    info!(
        input_cols = ?input_cols,
        numeric_cols = ?document.numeric_cols,
        categorical_cols = ?document.categorical_cols,
        "Repackaging bundle"
    );

    let mut transformers = Vec::new();

    if let Some(numeric_cols) = document.numeric_cols.filter(|c| !c.is_empty()) {
        let mut steps = Vec::new();
        if let Some(imputer) = document.imputer {
            steps.push(Step::Imputer(imputer));
        }
        if let Some(scaler) = document.scaler {
            steps.push(Step::Scaler(scaler));
        }
        if !steps.is_empty() {
            transformers.push(ColumnTransform {
                name: "num".to_string(),
                columns: resolve(&input_cols, &numeric_cols)?,
                steps,
            });
        }
    }

    if let (Some(categorical_cols), Some(encoder)) = (
        document.categorical_cols.filter(|c| !c.is_empty()),
        document.encoder,
    ) {
        transformers.push(ColumnTransform {
            name: "cat".to_string(),
            columns: resolve(&input_cols, &categorical_cols)?,
            steps: vec![Step::OrdinalEncoder(encoder)],
        });
    }

    if transformers.is_empty() {
        return Err(RepackageError::NoTransformers);
    }

    let preprocessing = ColumnTransformer {
        transformers,
        n_features_in: Some(input_cols.len()),
    };
    preprocessing.validate().map_err(RepackageError::Invalid)?;
    Ok(EstimatorSpec::Pipeline(PipelineSpec {
        preprocessing,
        graph,
    }))
}

fn resolve(input_cols: &[String], names: &[String]) -> Result<Vec<usize>, RepackageError> {
    names
        .iter()
        .map(|name| {
            input_cols
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| RepackageError::UnknownColumn(name.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{from_slice, ArtifactKind};
    use crate::models::FeatureValue;
    use crate::test_fixtures::fixtures_dir;

    const LEGACY: &str = r#"{
        "model": "sum3.onnx",
        "input_cols": ["price", "location", "current_stock"],
        "numeric_cols": ["current_stock", "price"],
        "categorical_cols": ["location"],
        "imputer": {"statistics": [50.0, 10.0]},
        "scaler": {"mean": [0.0, 0.0], "scale": [1.0, 2.0]},
        "encoder": {"categories": [["WH_A", "WH_B"]]}
    }"#;

    #[test]
    fn test_repackaged_pipeline_loads_as_bare_estimator() {
        let pipeline = repackage_bytes(LEGACY.as_bytes()).unwrap();
        let bytes = serde_json::to_vec(&pipeline).unwrap();
        let artifact = from_slice(&bytes, &fixtures_dir()).unwrap();
        assert_eq!(artifact.kind(), ArtifactKind::BareEstimator);

        // columns reorder to [current_stock, price / 2, location code]
        let row = vec![
            FeatureValue::Number(8.0),
            FeatureValue::from("WH_B"),
            FeatureValue::Missing,
        ];
        let preds = artifact.estimator().predict(&[row]).unwrap();
        assert_eq!(preds, vec![50.0 + 4.0 + 1.0]);
    }

    #[test]
    fn test_bare_input_rejected() {
        let err = repackage_bytes(br#"{"type": "onnx", "graph": "sum2.onnx"}"#).unwrap_err();
        assert!(matches!(err, RepackageError::NotComposite(_)));
    }

    #[test]
    fn test_pipeline_model_rejected() {
        let doc = r#"{
            "model": {"type": "pipeline", "graph": "sum2.onnx",
                      "preprocessing": {"transformers": []}},
            "input_cols": ["price"]
        }"#;
        assert!(matches!(
            repackage_bytes(doc.as_bytes()),
            Err(RepackageError::AlreadyPipeline)
        ));
    }

    #[test]
    fn test_no_transformers() {
        let doc = r#"{
            "model": "identity1.onnx",
            "input_cols": ["price"],
            "numeric_cols": ["price"]
        }"#;
        let err = repackage_bytes(doc.as_bytes()).unwrap_err();
        assert!(matches!(err, RepackageError::NoTransformers));
    }

    #[test]
    fn test_unknown_column() {
        let doc = r#"{
            "model": "identity1.onnx",
            "input_cols": ["price"],
            "categorical_cols": ["location"],
            "encoder": {"categories": [["WH_A"]]}
        }"#;
        let err = repackage_bytes(doc.as_bytes()).unwrap_err();
        assert!(matches!(err, RepackageError::UnknownColumn(c) if c == "location"));
    }

    #[test]
    fn test_missing_input_cols() {
        let doc = r#"{"model": "identity1.onnx"}"#;
        assert!(matches!(
            repackage_bytes(doc.as_bytes()),
            Err(RepackageError::MissingInputColumns)
        ));
    }

    #[test]
    fn test_mismatched_step_width_is_invalid() {
        let doc = r#"{
            "model": "sum2.onnx",
            "input_cols": ["price", "current_stock"],
            "numeric_cols": ["price", "current_stock"],
            "imputer": {"statistics": [1.0]}
        }"#;
        assert!(matches!(
            repackage_bytes(doc.as_bytes()),
            Err(RepackageError::Invalid(_))
        ));
    }
}
