//! Normalization of raw HTTP feature payloads into a feature matrix
//!
//! List payloads are trusted to match the training column order; only the
//! mapping form is reordered, and only against a composite bundle.

use crate::artifact::ModelArtifact;
use crate::error::{PredictionError, Result};
use crate::models::{FeatureValue, Matrix, RawFeatureRequest};

/// Convert `raw` into the matrix the artifact's estimator consumes
pub fn normalize(raw: RawFeatureRequest, artifact: &ModelArtifact) -> Result<Matrix> {
    match raw {
        RawFeatureRequest::Mapping(values) => {
            let columns = artifact
                .input_columns()
                .ok_or(PredictionError::SchemaUnavailable)?;
            let row = columns
                .iter()
                .map(|column| values.get(column).cloned().unwrap_or(FeatureValue::Missing))
                .collect();
            Ok(vec![row])
        }
        RawFeatureRequest::Vector(row) => Ok(vec![row]),
        RawFeatureRequest::Matrix(rows) => Ok(rows),
    }
}
