//! ONNX graph evaluation through tract
//!
//! Graphs take a `[batch, features]` float tensor and return one value per
//! row. The plan is optimized for a single row, so batches are run row by
//! row.

use super::{check_width, numeric, Predictor};
use crate::error::{PredictionError, Result};
use crate::models::Row;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use tract_onnx::pb::GraphProto;
use tract_onnx::prelude::*;
use tract_onnx::tract_hir::internal::DimLike;
use tracing::debug;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Tree ensemble operators whose split structure yields importances
const TREE_ENSEMBLE_OPS: [&str; 2] = ["TreeEnsembleRegressor", "TreeEnsembleClassifier"];

/// Runnable ONNX regressor
pub struct OnnxEstimator {
    plan: TractModel,
    n_features: usize,
    split_importances: Option<Vec<f64>>,
}

impl fmt::Debug for OnnxEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxEstimator")
            .field("n_features", &self.n_features)
            .field("has_split_importances", &self.split_importances.is_some())
            .finish()
    }
}

impl OnnxEstimator {
    /// Parse and optimize a serialized ONNX model
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let onnx = tract_onnx::onnx();
        let proto = onnx
            .proto_model_for_read(&mut Cursor::new(bytes))
            .map_err(load_error("Failed to parse ONNX model"))?;
        let model = onnx
            .model_for_proto_model(&proto)
            .map_err(load_error("Failed to build ONNX graph"))?;

        let n_features = declared_width(&model)?;
        let split_importances = proto
            .graph
            .as_ref()
            .and_then(split_counts)
            .map(|counts| normalize_counts(counts, n_features));

        let plan = model
            .with_input_fact(0, f32::fact([1, n_features]).into())
            .map_err(load_error("Failed to set input shape"))?
            .into_optimized()
            .map_err(load_error("Failed to optimize model"))?
            .into_runnable()
            .map_err(load_error("Failed to create runnable model"))?;

        debug!(n_features, "Loaded ONNX graph");
        Ok(Self {
            plan,
            n_features,
            split_importances,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            PredictionError::ArtifactUnavailable(format!(
                "failed to read ONNX model {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Feature count of the graph's input
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Evaluate one already-numeric row
    pub fn predict_values(&self, values: &[f64]) -> Result<f64> {
        check_width(values.len(), self.n_features, "the ONNX model")?;

        let data: Vec<f32> = values.iter().map(|&v| v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.n_features), data)
            .map_err(|e| PredictionError::InferenceFailed(e.to_string()))?
            .into();

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| PredictionError::InferenceFailed(format!("{:#}", e)))?;
        let output = outputs
            .first()
            .ok_or_else(|| PredictionError::InferenceFailed("No output from model".to_string()))?;
        let output = output
            .cast_to::<f32>()
            .map_err(|e| PredictionError::InferenceFailed(format!("{:#}", e)))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| PredictionError::InferenceFailed(format!("{:#}", e)))?;

        view.iter()
            .next()
            .map(|&v| f64::from(v))
            .ok_or_else(|| PredictionError::InferenceFailed("Empty model output".to_string()))
    }
}

impl Predictor for OnnxEstimator {
    fn predict(&self, matrix: &[Row]) -> Result<Vec<f64>> {
        matrix
            .iter()
            .map(|row| {
                check_width(row.len(), self.n_features, "the ONNX model")?;
                let values = row.iter().map(numeric).collect::<Result<Vec<_>>>()?;
                self.predict_values(&values)
            })
            .collect()
    }

    fn native_importances(&self) -> Option<Vec<f64>> {
        self.split_importances.clone()
    }
}

fn load_error(context: &'static str) -> impl Fn(TractError) -> PredictionError {
    move |e| PredictionError::ArtifactUnavailable(format!("{}: {:#}", context, e))
}

/// Feature count from the graph's `[batch, features]` input declaration
fn declared_width(model: &InferenceModel) -> Result<usize> {
    let typed = model
        .clone()
        .into_typed()
        .map_err(load_error("Failed to infer ONNX input shape"))?;
    let fact = typed
        .input_fact(0)
        .map_err(load_error("ONNX model has no input"))?;

    match fact.shape.len() {
        2 => fact.shape[1].to_usize().map_err(|_| {
            PredictionError::ArtifactUnavailable(
                "ONNX model input must have a fixed feature count".to_string(),
            )
        }),
        rank => Err(PredictionError::ArtifactUnavailable(format!(
            "ONNX model input must be [batch, features], got rank {}",
            rank
        ))),
    }
}

/// Per-feature split counts over every tree ensemble node in `graph`
///
/// Returns `None` when the graph has no tree ensemble.
pub fn split_counts(graph: &GraphProto) -> Option<Vec<u32>> {
    let mut counts: Vec<u32> = Vec::new();
    let mut found = false;

    for node in graph
        .node
        .iter()
        .filter(|node| TREE_ENSEMBLE_OPS.contains(&node.op_type.as_str()))
    {
        found = true;
        let features = node.attribute.iter().find(|a| a.name == "nodes_featureids");
        let modes = node.attribute.iter().find(|a| a.name == "nodes_modes");
        let (Some(features), Some(modes)) = (features, modes) else {
            continue;
        };

        for (feature, mode) in features.ints.iter().zip(&modes.strings) {
            if mode.as_slice() == b"LEAF" {
                continue;
            }
            if let Ok(feature) = usize::try_from(*feature) {
                if counts.len() <= feature {
                    counts.resize(feature + 1, 0);
                }
                counts[feature] += 1;
            }
        }
    }

    found.then_some(counts)
}

/// Split counts as fractions of all splits, padded to `n_features`
fn normalize_counts(mut counts: Vec<u32>, n_features: usize) -> Vec<f64> {
    counts.resize(n_features.max(counts.len()), 0);
    let total: u32 = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|&c| c as f64 / total as f64).collect()
}
