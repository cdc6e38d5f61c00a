//! Feature-importance report

use anyhow::Result;
use demand_lib::predictor::load_importance_report;
use serde_json::json;
use std::io::Write;
use std::path::Path;

/// Print the reweighted importances as JSON, or `{"error": ...}` on failure
///
/// Returns whether a report was produced.
pub fn run(model_path: &Path, out: &mut impl Write) -> Result<bool> {
    let (payload, ok) = match load_importance_report(model_path) {
        Ok(report) => (serde_json::to_value(&report)?, true),
        Err(e) => (json!({ "error": e.to_string() }), false),
    };
    writeln!(out, "{}", payload)?;
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io::Write as _;

    const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../demand-lib/tests/fixtures");

    #[test]
    fn test_report_from_saved_map() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let bundle = json!({
            "model": format!("{}/sum2.onnx", FIXTURES),
            "input_cols": ["price", "current_stock"],
            "feature_importance": {"price": 0.5, "current_stock": 0.5}
        });
        write!(file, "{}", bundle).unwrap();

        let mut out = Vec::new();
        assert!(run(file.path(), &mut out).unwrap());

        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["labels"][0], "price");
        let price = value["values"][0].as_f64().unwrap();
        assert!((price - 0.05 / 1.05).abs() < 1e-9);
    }

    #[test]
    fn test_error_payload() {
        let mut out = Vec::new();
        assert!(!run(Path::new("/nonexistent/model.json"), &mut out).unwrap());

        let value: Value = serde_json::from_slice(&out).unwrap();
        assert!(value["error"].as_str().unwrap().contains("unavailable"));
        assert!(value.get("labels").is_none());
    }
}
