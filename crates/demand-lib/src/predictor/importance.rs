//! Feature-importance reporting
//!
//! Importances come from the bundle's saved map when present, otherwise from
//! the estimator's native scores labelled by the bundle's input columns.
//! Price is damped and stock amplified before renormalizing.

use crate::artifact::{self, ModelArtifact};
use crate::error::{PredictionError, Result};
use crate::models::ImportanceReport;
use std::path::Path;

/// Multiplier applied to the `price` importance
pub const PRICE_WEIGHT: f64 = 0.1;

/// Multiplier applied to the `current_stock` importance
pub const STOCK_WEIGHT: f64 = 2.0;

/// Apply the label overrides and renormalize to sum to 1.0
///
/// An all-zero (or non-finite) total has no meaningful distribution and is
/// reported as `ImportanceUnavailable`.
pub fn reweight<I>(importance: I) -> Result<ImportanceReport>
where
    I: IntoIterator<Item = (String, f64)>,
{
    let (labels, mut values): (Vec<String>, Vec<f64>) = importance
        .into_iter()
        .map(|(label, value)| {
            let weight = match label.as_str() {
                "price" => PRICE_WEIGHT,
                "current_stock" => STOCK_WEIGHT,
                _ => 1.0,
            };
            (label, value * weight)
        })
        .unzip();

    let total: f64 = values.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return Err(PredictionError::ImportanceUnavailable(format!(
            "importance scores sum to {}",
            total
        )));
    }
    for value in &mut values {
        *value /= total;
    }

    Ok(ImportanceReport { labels, values })
}

/// Build the reweighted report for a loaded artifact
pub fn importance_report(artifact: &ModelArtifact) -> Result<ImportanceReport> {
    if let Some(saved) = artifact.importance_map() {
        return reweight(saved.iter().cloned());
    }

    let columns = artifact.input_columns().ok_or_else(|| {
        PredictionError::ImportanceUnavailable(
            "artifact has no input columns to label importances".to_string(),
        )
    })?;
    let scores = artifact.estimator().native_importances().ok_or_else(|| {
        PredictionError::ImportanceUnavailable(
            "estimator exposes no native importances".to_string(),
        )
    })?;
    if scores.len() != columns.len() {
        return Err(PredictionError::ImportanceUnavailable(format!(
            "{} importance scores for {} input columns",
            scores.len(),
            columns.len()
        )));
    }

    reweight(columns.iter().cloned().zip(scores))
}

/// Load the artifact at `path` and report its importances
pub fn load_importance_report(path: impl AsRef<Path>) -> Result<ImportanceReport> {
    let artifact = artifact::load(path)
        .map_err(|e| PredictionError::ImportanceUnavailable(e.to_string()))?;
    importance_report(&artifact)
}
