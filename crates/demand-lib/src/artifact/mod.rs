//! Artifact loading and classification
//!
//! An artifact at the fixed path is one of:
//! - a serialized ONNX graph (bare estimator)
//! - a JSON estimator description tagged by `type` (bare estimator)
//! - a JSON composite bundle: a mapping with a `model` key plus the ordered
//!   `input_cols` and optional precomputed `feature_importance`
//!
//! Graph paths inside JSON documents are relative to the document.

mod repackage;

pub use repackage::{repackage, repackage_bytes, BundleDocument, RepackageError};

use crate::error::{PredictionError, Result};
use crate::estimator::{EstimatorSpec, ModelSource, OnnxEstimator, Predictor};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Default artifact location, relative to the working directory
pub const DEFAULT_MODEL_PATH: &str = "ml/demand_model.json";

/// Classification of a loaded artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    BareEstimator,
    CompositeBundle,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::BareEstimator => write!(f, "bare_estimator"),
            ArtifactKind::CompositeBundle => write!(f, "composite_bundle"),
        }
    }
}

/// The two artifact shapes
#[derive(Debug, Clone)]
enum Shape {
    Bare(Arc<dyn Predictor>),
    Composite {
        estimator: Arc<dyn Predictor>,
        input_columns: Vec<String>,
        importance_map: Option<Vec<(String, f64)>>,
    },
}

/// A loaded, read-only prediction asset
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    shape: Shape,
    fingerprint: Option<String>,
}

impl ModelArtifact {
    /// Wrap an estimator that carries no metadata
    pub fn bare(estimator: Arc<dyn Predictor>) -> Self {
        Self {
            shape: Shape::Bare(estimator),
            fingerprint: None,
        }
    }

    /// Wrap an estimator with its authoritative column order
    pub fn composite(
        estimator: Arc<dyn Predictor>,
        input_columns: Vec<String>,
        importance_map: Option<Vec<(String, f64)>>,
    ) -> Result<Self> {
        if input_columns.is_empty() {
            return Err(PredictionError::ArtifactUnavailable(
                "composite bundle has empty input_cols".to_string(),
            ));
        }
        Ok(Self {
            shape: Shape::Composite {
                estimator,
                input_columns,
                importance_map,
            },
            fingerprint: None,
        })
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn kind(&self) -> ArtifactKind {
        match self.shape {
            Shape::Bare(_) => ArtifactKind::BareEstimator,
            Shape::Composite { .. } => ArtifactKind::CompositeBundle,
        }
    }

    pub fn estimator(&self) -> &dyn Predictor {
        match &self.shape {
            Shape::Bare(estimator) => estimator.as_ref(),
            Shape::Composite { estimator, .. } => estimator.as_ref(),
        }
    }

    /// Ordered input columns; present only for composite bundles
    pub fn input_columns(&self) -> Option<&[String]> {
        match &self.shape {
            Shape::Bare(_) => None,
            Shape::Composite { input_columns, .. } => Some(input_columns),
        }
    }

    /// Precomputed importances saved with the bundle, in saved order
    pub fn importance_map(&self) -> Option<&[(String, f64)]> {
        match &self.shape {
            Shape::Bare(_) => None,
            Shape::Composite { importance_map, .. } => importance_map.as_deref(),
        }
    }

    /// Hex SHA-256 of the artifact bytes, when loaded from disk
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }
}

/// Load and classify the artifact at `path`
pub fn load(path: impl AsRef<Path>) -> Result<ModelArtifact> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        PredictionError::ArtifactUnavailable(format!("failed to read {}: {}", path.display(), e))
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let artifact = from_slice(&bytes, base_dir)?;

    info!(
        event = "artifact_loaded",
        path = %path.display(),
        kind = %artifact.kind(),
        checksum = artifact.fingerprint().unwrap_or_default(),
        "Loaded model artifact"
    );
    Ok(artifact)
}

/// Classify artifact bytes already in memory
///
/// Bytes that are not JSON are taken to be an ONNX graph.
pub fn from_slice(bytes: &[u8], base_dir: &Path) -> Result<ModelArtifact> {
    let fingerprint = compute_checksum(bytes);

    let artifact = match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) if map.contains_key("model") => composite_from_map(map, base_dir)?,
        Ok(other) => {
            let spec: EstimatorSpec = serde_json::from_value(other).map_err(|e| {
                unavailable(format!(
                    "artifact is neither a bundle with a 'model' key nor an estimator: {}",
                    e
                ))
            })?;
            let estimator = spec.build(base_dir)?;
            debug!(estimator = estimator.name(), "Classified bare estimator");
            ModelArtifact::bare(Arc::new(estimator))
        }
        Err(_) => {
            let estimator = OnnxEstimator::from_bytes(bytes).map_err(|e| {
                unavailable(format!("artifact is neither JSON nor an ONNX model: {}", e))
            })?;
            debug!(n_features = estimator.n_features(), "Classified bare ONNX graph");
            ModelArtifact::bare(Arc::new(estimator))
        }
    };

    Ok(artifact.with_fingerprint(fingerprint))
}

fn composite_from_map(mut map: Map<String, Value>, base_dir: &Path) -> Result<ModelArtifact> {
    let model = map.remove("model").unwrap_or(Value::Null);
    let spec = serde_json::from_value::<ModelSource>(model)
        .map_err(|e| unavailable(format!("bundle 'model' is not an estimator: {}", e)))?
        .into_spec();

    let input_columns: Vec<String> = match map.remove("input_cols") {
        Some(cols) => serde_json::from_value(cols)
            .map_err(|e| unavailable(format!("bundle 'input_cols' is malformed: {}", e)))?,
        None => return Err(unavailable("bundle has no 'input_cols'".to_string())),
    };

    let importance_map = match map.remove("feature_importance") {
        None | Some(Value::Null) => None,
        Some(Value::Object(entries)) => Some(
            entries
                .into_iter()
                .map(|(label, score)| match score.as_f64() {
                    Some(v) => Ok((label, v)),
                    None => Err(unavailable(format!(
                        "feature_importance['{}'] is not a number",
                        label
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        Some(_) => {
            return Err(unavailable(
                "bundle 'feature_importance' must be a mapping".to_string(),
            ))
        }
    };

    let estimator = spec.build(base_dir)?;
    debug!(
        estimator = estimator.name(),
        columns = input_columns.len(),
        has_importance = importance_map.is_some(),
        "Classified composite bundle"
    );
    ModelArtifact::composite(Arc::new(estimator), input_columns, importance_map)
}

fn unavailable(message: String) -> PredictionError {
    PredictionError::ArtifactUnavailable(message)
}

/// Compute SHA256 checksum of artifact bytes
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
