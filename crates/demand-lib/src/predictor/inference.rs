//! Uniform estimator invocation over both artifact shapes

use crate::artifact::ModelArtifact;
use crate::error::{PredictionError, Result};
use crate::models::Row;
use std::time::Instant;
use tracing::{debug, warn};

/// Latency above which an inference call is logged as slow
const SLOW_INFERENCE_MS: u128 = 50;

/// Run the artifact's estimator over `matrix`, one output per row
pub fn infer(artifact: &ModelArtifact, matrix: &[Row]) -> Result<Vec<f64>> {
    let start = Instant::now();

    let predictions = artifact.estimator().predict(matrix)?;

    if predictions.len() != matrix.len() {
        return Err(PredictionError::InferenceFailed(format!(
            "estimator returned {} predictions for {} rows",
            predictions.len(),
            matrix.len()
        )));
    }

    // NaN inputs flow through a graph without an imputer
    if let Some(row) = predictions.iter().position(|p| !p.is_finite()) {
        return Err(PredictionError::InferenceFailed(format!(
            "Input X contains NaN or the model produced a non-finite prediction for row {}.",
            row
        )));
    }

    let elapsed = start.elapsed();
    if elapsed.as_millis() > SLOW_INFERENCE_MS {
        warn!(
            elapsed_ms = elapsed.as_millis(),
            rows = matrix.len(),
            "Inference exceeded {}ms",
            SLOW_INFERENCE_MS
        );
    } else {
        debug!(
            elapsed_us = elapsed.as_micros(),
            rows = matrix.len(),
            kind = %artifact.kind(),
            "Inference completed"
        );
    }

    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::Predictor;
    use crate::models::FeatureValue;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Fixed(Vec<f64>);

    impl Predictor for Fixed {
        fn predict(&self, _matrix: &[Row]) -> Result<Vec<f64>> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug)]
    struct Failing;

    impl Predictor for Failing {
        fn predict(&self, _matrix: &[Row]) -> Result<Vec<f64>> {
            Err(PredictionError::InferenceFailed("boom".to_string()))
        }
    }

    fn rows(n: usize) -> Vec<Row> {
        vec![vec![FeatureValue::Number(0.0)]; n]
    }

    #[test]
    fn test_both_shapes_delegate() {
        let bare = ModelArtifact::bare(Arc::new(Fixed(vec![1.0, 2.0])));
        assert_eq!(infer(&bare, &rows(2)).unwrap(), vec![1.0, 2.0]);

        let bundle =
            ModelArtifact::composite(Arc::new(Fixed(vec![3.0])), vec!["a".into()], None).unwrap();
        assert_eq!(infer(&bundle, &rows(1)).unwrap(), vec![3.0]);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let bare = ModelArtifact::bare(Arc::new(Fixed(vec![1.0])));
        assert!(matches!(
            infer(&bare, &rows(2)),
            Err(PredictionError::InferenceFailed(_))
        ));
    }

    #[test]
    fn test_non_finite_output_rejected() {
        let bare = ModelArtifact::bare(Arc::new(Fixed(vec![1.0, f64::NAN])));
        let err = infer(&bare, &rows(2)).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_estimator_error_propagates_verbatim() {
        let bare = ModelArtifact::bare(Arc::new(Failing));
        let err = infer(&bare, &rows(1)).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
