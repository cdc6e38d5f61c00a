//! Error taxonomy for the prediction workflow

use thiserror::Error;

/// Failures raised anywhere between loading the artifact and producing a
/// raw prediction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    /// File missing, unreadable, or not a recognized artifact shape
    #[error("artifact unavailable: {0}")]
    ArtifactUnavailable(String),

    /// The assembled row lacks a column the artifact requires
    #[error("missing feature: {0}")]
    MissingFeature(String),

    /// A column-keyed operation was requested but the artifact carries no
    /// column ordering
    #[error("Model does not expose input_cols; send features as list")]
    SchemaUnavailable,

    /// The estimator rejected the input
    #[error("{0}")]
    InferenceFailed(String),

    /// No importance signal could be obtained from the artifact
    #[error("feature importance unavailable: {0}")]
    ImportanceUnavailable(String),
}

pub type Result<T> = std::result::Result<T, PredictionError>;
