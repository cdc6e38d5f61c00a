//! Demand prediction library
//!
//! This crate provides the core functionality for:
//! - Loading and classifying model artifacts
//! - Evaluating ONNX graphs and their column preprocessing
//! - Assembling feature rows from logical prediction requests
//! - Normalizing raw HTTP feature payloads
//! - Post-processing, fallback estimation and importance reporting
//! - Metrics and structured logging

pub mod artifact;
pub mod error;
pub mod estimator;
pub mod models;
pub mod observability;
pub mod predictor;

pub use artifact::{ArtifactKind, ModelArtifact};
pub use error::{PredictionError, Result};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
