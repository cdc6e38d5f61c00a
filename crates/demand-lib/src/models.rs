//! Core data models for the demand prediction workflow

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single cell of a feature row
///
/// On the wire a cell is a JSON number, a string, or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FeatureValue {
    pub fn is_missing(&self) -> bool {
        match self {
            FeatureValue::Missing => true,
            FeatureValue::Number(v) => v.is_nan(),
            FeatureValue::Text(_) => false,
        }
    }

    /// Numeric view of the cell; missing becomes NaN, text is rejected
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(v) => Some(*v),
            FeatureValue::Missing => Some(f64::NAN),
            FeatureValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(v) => write!(f, "{}", v),
            FeatureValue::Text(s) => write!(f, "{}", s),
            FeatureValue::Missing => write!(f, "nan"),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Number(v)
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Number(v as f64)
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        FeatureValue::Text(s.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(s: String) -> Self {
        FeatureValue::Text(s)
    }
}

/// One ordered input row for an estimator
pub type Row = Vec<FeatureValue>;

/// Ordered rows presented to an estimator
pub type Matrix = Vec<Row>;

/// Logical intent to predict demand for one product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub product_id: i64,
    pub current_stock: f64,
    pub price: f64,
    /// Reference instant for every time-derived feature
    #[serde(default = "local_now")]
    pub reference_time: NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl PredictionRequest {
    /// Create a request referenced at the current local time
    pub fn new(product_id: i64, current_stock: f64, price: f64) -> Self {
        Self {
            product_id,
            current_stock,
            price,
            reference_time: local_now(),
        }
    }

    pub fn with_reference_time(mut self, reference_time: NaiveDateTime) -> Self {
        self.reference_time = reference_time;
        self
    }
}

/// Raw feature payload accepted by the HTTP inference endpoint
///
/// Variant order matters for untagged decoding: a nested list must be
/// tried before a flat one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFeatureRequest {
    Matrix(Matrix),
    Vector(Row),
    Mapping(HashMap<String, FeatureValue>),
}

/// Renormalized feature importances, paired positionally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceReport {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}
