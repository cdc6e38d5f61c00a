//! Estimators that can be evaluated from a serialized artifact
//!
//! The regression itself always runs as an ONNX graph through tract. A
//! pipeline adds the fitted column preprocessing in front of the graph; it
//! stays on the Rust side because it consumes mixed text and numeric cells
//! before any float tensor exists.

mod onnx;
mod preprocess;

pub use onnx::{split_counts, OnnxEstimator};
pub use preprocess::{ColumnTransform, ColumnTransformer, OrdinalEncoder, SimpleImputer, StandardScaler, Step};

use crate::error::{PredictionError, Result};
use crate::models::{FeatureValue, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Anything that maps a feature matrix to one output per row
pub trait Predictor: Send + Sync + fmt::Debug {
    /// Predict one value per input row
    fn predict(&self, matrix: &[Row]) -> Result<Vec<f64>>;

    /// Native per-feature importance scores, if the estimator has any
    fn native_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

/// Serialized estimator description, tagged by `type`
///
/// Graph paths are resolved against the directory of the document that
/// names them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EstimatorSpec {
    Onnx { graph: PathBuf },
    Pipeline(PipelineSpec),
}

/// Column preprocessing followed by an ONNX graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub preprocessing: ColumnTransformer,
    pub graph: PathBuf,
}

/// How a bundle names its model: a bare graph path or a full description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelSource {
    Path(PathBuf),
    Spec(EstimatorSpec),
}

impl ModelSource {
    pub fn into_spec(self) -> EstimatorSpec {
        match self {
            ModelSource::Path(graph) => EstimatorSpec::Onnx { graph },
            ModelSource::Spec(spec) => spec,
        }
    }
}

impl EstimatorSpec {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            EstimatorSpec::Onnx { .. } => "onnx",
            EstimatorSpec::Pipeline(_) => "pipeline",
        }
    }

    /// Load every referenced graph and check the pieces fit together
    pub fn build(&self, base_dir: &Path) -> Result<Estimator> {
        match self {
            EstimatorSpec::Onnx { graph } => Ok(Estimator::Onnx(OnnxEstimator::from_path(
                &base_dir.join(graph),
            )?)),
            EstimatorSpec::Pipeline(spec) => {
                let model = OnnxEstimator::from_path(&base_dir.join(&spec.graph))?;
                Pipeline::new(spec.preprocessing.clone(), model).map(Estimator::Pipeline)
            }
        }
    }
}

/// A loaded estimator
#[derive(Debug)]
pub enum Estimator {
    Onnx(OnnxEstimator),
    Pipeline(Pipeline),
}

impl Estimator {
    pub fn name(&self) -> &'static str {
        match self {
            Estimator::Onnx(_) => "onnx",
            Estimator::Pipeline(_) => "pipeline",
        }
    }
}

impl Predictor for Estimator {
    fn predict(&self, matrix: &[Row]) -> Result<Vec<f64>> {
        match self {
            Estimator::Onnx(model) => model.predict(matrix),
            Estimator::Pipeline(pipeline) => pipeline.predict(matrix),
        }
    }

    fn native_importances(&self) -> Option<Vec<f64>> {
        match self {
            Estimator::Onnx(model) => model.native_importances(),
            // Scores index the transformed columns, not the raw inputs
            Estimator::Pipeline(_) => None,
        }
    }
}

/// Preprocessing folded in front of an ONNX graph
#[derive(Debug)]
pub struct Pipeline {
    preprocessing: ColumnTransformer,
    model: OnnxEstimator,
}

impl Pipeline {
    pub fn new(preprocessing: ColumnTransformer, model: OnnxEstimator) -> Result<Self> {
        preprocessing
            .validate()
            .map_err(PredictionError::ArtifactUnavailable)?;
        let produced = preprocessing.output_width();
        if produced != model.n_features() {
            return Err(PredictionError::ArtifactUnavailable(format!(
                "preprocessing produces {} features but the ONNX model expects {}",
                produced,
                model.n_features()
            )));
        }
        Ok(Self {
            preprocessing,
            model,
        })
    }

    fn predict(&self, matrix: &[Row]) -> Result<Vec<f64>> {
        matrix
            .iter()
            .map(|row| {
                let values = self.preprocessing.transform(row)?;
                self.model.predict_values(&values)
            })
            .collect()
    }
}

/// Numeric value of a cell, with sklearn's wording for text input
pub(crate) fn numeric(cell: &FeatureValue) -> Result<f64> {
    cell.as_f64().ok_or_else(|| {
        PredictionError::InferenceFailed(format!("could not convert string to float: '{}'", cell))
    })
}

pub(crate) fn check_width(got: usize, expected: usize, estimator: &str) -> Result<()> {
    if got != expected {
        return Err(PredictionError::InferenceFailed(format!(
            "X has {} features, but {} is expecting {} features as input.",
            got, estimator, expected
        )));
    }
    Ok(())
}
