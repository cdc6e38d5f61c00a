//! Single-request demand forecasting with fallback
//!
//! Chains feature assembly, inference and demand adjustment. Any failure in
//! the chain, including an artifact that never loaded, is absorbed into the
//! rule-based fallback so callers always get a non-negative number.

use super::features::FeatureAssembler;
use super::fallback::FallbackPredictor;
use super::inference::infer;
use super::output::{adjust, StockBand};
use crate::artifact::ModelArtifact;
use crate::error::{PredictionError, Result};
use crate::models::PredictionRequest;
use rand::rngs::ThreadRng;
use rand::Rng;
use std::fmt;
use tracing::{debug, warn};

/// Outcome of one forecast
#[derive(Debug, Clone, PartialEq)]
pub enum Forecast {
    /// Adjusted model output
    Model(f64),
    /// Rule-based estimate substituted after `error`
    Fallback { estimate: u64, error: PredictionError },
}

impl Forecast {
    pub fn value(&self) -> f64 {
        match self {
            Forecast::Model(demand) => *demand,
            Forecast::Fallback { estimate, .. } => *estimate as f64,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Forecast::Fallback { .. })
    }

    pub fn error(&self) -> Option<&PredictionError> {
        match self {
            Forecast::Model(_) => None,
            Forecast::Fallback { error, .. } => Some(error),
        }
    }
}

/// Model output prints as a float, fallback as an integer
impl fmt::Display for Forecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Forecast::Model(demand) => f.write_str(&format_demand(*demand)),
            Forecast::Fallback { estimate, .. } => write!(f, "{}", estimate),
        }
    }
}

/// Shortest round-trip float text, switching to scientific notation below
/// 1e-4 and from 1e16 up with a signed two-digit exponent. Clamped, zero and
/// NaN demand print as the integer `0`.
fn format_demand(demand: f64) -> String {
    if demand.is_nan() || demand <= 0.0 {
        return "0".to_string();
    }
    if demand.is_infinite() {
        return "inf".to_string();
    }

    let scientific = format!("{:e}", demand);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if (-4..16).contains(&exponent) {
        let plain = demand.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{}.0", plain)
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

/// Runs the CLI prediction path for one request at a time
pub struct DemandForecaster<R: Rng> {
    assembler: FeatureAssembler<R>,
}

impl DemandForecaster<ThreadRng> {
    pub fn new() -> Self {
        Self::with_assembler(FeatureAssembler::new())
    }
}

impl Default for DemandForecaster<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> DemandForecaster<R> {
    pub fn with_assembler(assembler: FeatureAssembler<R>) -> Self {
        Self { assembler }
    }

    /// Forecast demand, substituting the fallback on any failure
    pub fn forecast(
        &mut self,
        artifact: std::result::Result<&ModelArtifact, PredictionError>,
        request: &PredictionRequest,
    ) -> Forecast {
        match artifact.and_then(|artifact| self.model_forecast(artifact, request)) {
            Ok(demand) => Forecast::Model(demand),
            Err(error) => {
                let estimate = FallbackPredictor::estimate(request.current_stock);
                warn!(
                    event = "fallback_used",
                    product_id = request.product_id,
                    current_stock = request.current_stock,
                    estimate = estimate,
                    error = %error,
                    "Model path failed, using fallback estimate"
                );
                Forecast::Fallback { estimate, error }
            }
        }
    }

    /// The model path alone: assemble, infer, adjust
    pub fn model_forecast(
        &mut self,
        artifact: &ModelArtifact,
        request: &PredictionRequest,
    ) -> Result<f64> {
        let columns = artifact
            .input_columns()
            .ok_or(PredictionError::SchemaUnavailable)?;
        let row = self.assembler.assemble(request, columns)?;
        let raw = infer(artifact, std::slice::from_ref(&row))?
            .first()
            .copied()
            .ok_or_else(|| PredictionError::InferenceFailed("estimator returned no output".to_string()))?;

        let demand = adjust(raw, request.current_stock);
        debug!(
            product_id = request.product_id,
            raw_prediction = raw,
            band = ?StockBand::for_stock(request.current_stock),
            demand = demand,
            "Adjusted model output"
        );
        Ok(demand)
    }
}
