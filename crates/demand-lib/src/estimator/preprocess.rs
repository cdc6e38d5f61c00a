//! Column preprocessing applied in front of a pipeline's estimator

use super::numeric;
use crate::error::{PredictionError, Result};
use crate::models::FeatureValue;
use serde::{Deserialize, Serialize};

/// Replaces missing cells with per-column fill values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleImputer {
    pub statistics: Vec<FeatureValue>,
}

impl SimpleImputer {
    fn transform(&self, cells: Vec<FeatureValue>) -> Result<Vec<FeatureValue>> {
        Ok(cells
            .into_iter()
            .zip(&self.statistics)
            .map(|(cell, fill)| if cell.is_missing() { fill.clone() } else { cell })
            .collect())
    }
}

/// Standardizes numeric columns to `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn transform(&self, cells: Vec<FeatureValue>) -> Result<Vec<FeatureValue>> {
        cells
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(cell, (mean, scale))| {
                let x = numeric(cell)?;
                // Constant columns are stored with zero scale
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                Ok(FeatureValue::Number((x - mean) / scale))
            })
            .collect()
    }
}

/// Maps categories to their index in the fitted category list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    pub categories: Vec<Vec<String>>,
    /// Code for unseen categories; unseen input fails when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_value: Option<f64>,
}

impl OrdinalEncoder {
    fn transform(&self, cells: Vec<FeatureValue>) -> Result<Vec<FeatureValue>> {
        cells
            .into_iter()
            .zip(&self.categories)
            .enumerate()
            .map(|(column, (cell, categories))| {
                if cell.is_missing() {
                    return Ok(FeatureValue::Missing);
                }
                let key = cell.to_string();
                match categories.iter().position(|c| *c == key) {
                    Some(code) => Ok(FeatureValue::Number(code as f64)),
                    None => self.unknown_value.map(FeatureValue::Number).ok_or_else(|| {
                        PredictionError::InferenceFailed(format!(
                            "Found unknown categories ['{}'] in column {} during transform",
                            key, column
                        ))
                    }),
                }
            })
            .collect()
    }
}

/// One preprocessing step, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    Imputer(SimpleImputer),
    Scaler(StandardScaler),
    OrdinalEncoder(OrdinalEncoder),
}

impl Step {
    /// Number of columns the step was fitted on
    pub fn width(&self) -> usize {
        match self {
            Step::Imputer(imputer) => imputer.statistics.len(),
            Step::Scaler(scaler) => scaler.mean.len(),
            Step::OrdinalEncoder(encoder) => encoder.categories.len(),
        }
    }

    fn transform(&self, cells: Vec<FeatureValue>) -> Result<Vec<FeatureValue>> {
        match self {
            Step::Imputer(imputer) => imputer.transform(cells),
            Step::Scaler(scaler) => scaler.transform(cells),
            Step::OrdinalEncoder(encoder) => encoder.transform(cells),
        }
    }
}

/// Steps applied to a positional subset of the input row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransform {
    pub name: String,
    pub columns: Vec<usize>,
    pub steps: Vec<Step>,
}

/// Runs each transform over its columns and concatenates the results;
/// columns not named by any transform are dropped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    pub transformers: Vec<ColumnTransform>,
    /// Expected input width, when known at fit time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_features_in: Option<usize>,
}

impl ColumnTransformer {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.transformers.is_empty() {
            return Err("column transformer has no transformers".to_string());
        }
        for transform in &self.transformers {
            if let (Some(width), Some(max)) = (self.n_features_in, transform.columns.iter().max()) {
                if *max >= width {
                    return Err(format!(
                        "transformer '{}' selects column {} of {}",
                        transform.name, max, width
                    ));
                }
            }
            for step in &transform.steps {
                if let Step::Scaler(scaler) = step {
                    if scaler.mean.len() != scaler.scale.len() {
                        return Err(format!(
                            "transformer '{}' has mismatched scaler arrays",
                            transform.name
                        ));
                    }
                }
                if step.width() != transform.columns.len() {
                    return Err(format!(
                        "transformer '{}' selects {} columns but a step was fitted on {}",
                        transform.name,
                        transform.columns.len(),
                        step.width()
                    ));
                }
            }
        }
        Ok(())
    }

    /// Width of a transformed row; every step is one-to-one per column
    pub fn output_width(&self) -> usize {
        self.transformers.iter().map(|t| t.columns.len()).sum()
    }

    /// Transform one row into the numeric row the estimator consumes
    pub fn transform(&self, row: &[FeatureValue]) -> Result<Vec<f64>> {
        if let Some(width) = self.n_features_in {
            if row.len() != width {
                return Err(PredictionError::InferenceFailed(format!(
                    "X has {} features, but ColumnTransformer is expecting {} features as input.",
                    row.len(),
                    width
                )));
            }
        }

        let mut out = Vec::new();
        for transform in &self.transformers {
            let mut cells = transform
                .columns
                .iter()
                .map(|&idx| {
                    row.get(idx).cloned().ok_or_else(|| {
                        PredictionError::InferenceFailed(format!(
                            "column index {} out of range for row of {} features",
                            idx,
                            row.len()
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            for step in &transform.steps {
                cells = step.transform(cells)?;
            }
            for cell in &cells {
                out.push(numeric(cell)?);
            }
        }
        Ok(out)
    }
}
