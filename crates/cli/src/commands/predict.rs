//! Single-product demand prediction

use anyhow::Result;
use demand_lib::{
    artifact,
    predictor::{DemandForecaster, Forecast},
    PredictionRequest,
};
use std::io::Write;
use std::path::Path;

/// Forecast demand for one product and print it to `out`
///
/// Failures anywhere in the model path are absorbed into the fallback
/// estimate; the error detail goes to `diagnostics`. Only write failures on
/// the two streams are returned as errors.
pub fn run(
    model_path: &Path,
    request: &PredictionRequest,
    out: &mut impl Write,
    diagnostics: &mut impl Write,
) -> Result<Forecast> {
    let loaded = artifact::load(model_path);
    let forecast = DemandForecaster::new().forecast(loaded.as_ref().map_err(Clone::clone), request);

    writeln!(out, "{}", forecast)?;
    if let Some(error) = forecast.error() {
        writeln!(diagnostics, "Prediction error: {}", error)?;
    }

    Ok(forecast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write as _;

    const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../demand-lib/tests/fixtures");

    fn run_with(model_path: &Path, stock: f64) -> (Forecast, String, String) {
        let request = PredictionRequest::new(42, stock, 10.0);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let forecast = run(model_path, &request, &mut out, &mut err).unwrap();
        (
            forecast,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    fn artifact_file(document: serde_json::Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", document).unwrap();
        file
    }

    #[test]
    fn test_missing_artifact_prints_fallback() {
        let (forecast, out, err) = run_with(Path::new("/nonexistent/model.json"), 5.0);
        assert!(forecast.is_fallback());
        assert_eq!(out, "200\n");
        assert!(err.starts_with("Prediction error: artifact unavailable"));
    }

    #[test]
    fn test_composite_artifact_prints_adjusted_value() {
        // The graph predicts 100 regardless of its two inputs
        let file = artifact_file(json!({
            "model": format!("{}/const100_2.onnx", FIXTURES),
            "input_cols": ["current_stock", "price"]
        }));

        let (forecast, out, err) = run_with(file.path(), 5.0);
        assert_eq!(forecast, Forecast::Model(150.0));
        assert_eq!(out, "150.0\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_bare_artifact_falls_back() {
        let file = artifact_file(json!({
            "type": "onnx",
            "graph": format!("{}/identity1.onnx", FIXTURES)
        }));

        let (forecast, out, err) = run_with(file.path(), 500.0);
        assert!(forecast.is_fallback());
        assert_eq!(out, "50\n");
        assert!(err.contains("input_cols"));
    }

    #[test]
    fn test_unrecognized_document_falls_back() {
        let file = artifact_file(json!({"weights": [1]}));

        let (forecast, out, err) = run_with(file.path(), 5.0);
        assert!(forecast.is_fallback());
        assert_eq!(out, "200\n");
        assert!(err.contains("neither a bundle"));
    }
}
