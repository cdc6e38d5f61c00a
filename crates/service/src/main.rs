//! Demand service - HTTP inference for inventory demand predictions
//!
//! Loads the model artifact once at startup and serves predictions until
//! interrupted. A failed load leaves the service up with inference disabled.

use anyhow::{Context, Result};
use demand_lib::{observability, ServiceMetrics, StructuredLogger};
use demand_service::api::{self, AppState, ModelState};
use demand_service::config::ServiceConfig;
use std::sync::Arc;
use tracing::info;

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_json_tracing();

    info!("Starting demand-service");

    let config = ServiceConfig::load().context("Failed to load configuration")?;
    info!(model_path = %config.model_path, port = config.port, "Service configured");

    let metrics = ServiceMetrics::new();
    let logger = StructuredLogger::new("demand-service");

    let model = ModelState::load(&config.model_path);
    match &model {
        ModelState::Loaded(artifact) => {
            metrics.set_model_loaded(artifact.fingerprint(), Some(&artifact.kind().to_string()));
        }
        ModelState::Unavailable(reason) => {
            logger.log_model_unavailable(&config.model_path, reason);
            metrics.set_model_loaded(None, None);
        }
    }
    logger.log_startup(SERVICE_VERSION, &config.model_path, model.is_loaded());

    let app_state = Arc::new(AppState::new(model, metrics, logger.clone()));
    let addr = config.bind_addr();

    tokio::select! {
        result = api::serve(&addr, app_state) => {
            result.context("API server failed")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
