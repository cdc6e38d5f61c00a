//! HTTP API for inference, health checks and Prometheus metrics

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use demand_lib::{
    artifact,
    predictor::{importance_report, infer, normalize, DemandForecaster, Forecast},
    ImportanceReport, ModelArtifact, PredictionError, PredictionRequest, RawFeatureRequest,
    ServiceMetrics, StructuredLogger,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Outcome of loading the artifact at startup; never reloaded
#[derive(Debug, Clone)]
pub enum ModelState {
    Loaded(Arc<ModelArtifact>),
    Unavailable(String),
}

impl ModelState {
    /// Load the artifact, absorbing failure into `Unavailable`
    pub fn load(path: impl AsRef<Path>) -> Self {
        match artifact::load(path) {
            Ok(artifact) => ModelState::Loaded(Arc::new(artifact)),
            Err(e) => ModelState::Unavailable(e.to_string()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelState::Loaded(_))
    }

    pub fn artifact(&self) -> Option<&ModelArtifact> {
        match self {
            ModelState::Loaded(artifact) => Some(artifact.as_ref()),
            ModelState::Unavailable(_) => None,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub model: ModelState,
    pub metrics: ServiceMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(model: ModelState, metrics: ServiceMetrics, logger: StructuredLogger) -> Self {
        Self {
            model,
            metrics,
            logger,
        }
    }
}

/// Failures surfaced to HTTP clients as `{"detail": ...}`
#[derive(Debug)]
pub enum ApiError {
    ModelNotLoaded,
    InvalidRequest(String),
    Prediction(PredictionError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::Prediction(PredictionError::SchemaUnavailable) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ModelNotLoaded | ApiError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ApiError::ModelNotLoaded => "Model not loaded".to_string(),
            ApiError::InvalidRequest(reason) => reason.clone(),
            ApiError::Prediction(e) => e.to_string(),
        }
    }
}

impl From<PredictionError> for ApiError {
    fn from(e: PredictionError) -> Self {
        ApiError::Prediction(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub model_loaded: bool,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub features: RawFeatureRequest,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predictions: Vec<f64>,
}

/// Body of `/demand`; the reference time is always the server's clock
#[derive(Debug, Deserialize)]
pub struct DemandRequest {
    pub product_id: i64,
    pub current_stock: f64,
    pub price: f64,
}

impl DemandRequest {
    /// Stock and price must be finite and non-negative
    pub fn validate(&self) -> Result<PredictionRequest, ApiError> {
        for (name, value) in [("current_stock", self.current_stock), ("price", self.price)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ApiError::InvalidRequest(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(PredictionRequest::new(
            self.product_id,
            self.current_stock,
            self.price,
        ))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DemandResponse {
    pub demand: f64,
    pub fallback: bool,
}

/// Liveness; answers even when the model failed to load
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        model_loaded: state.model.is_loaded(),
    })
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let start = Instant::now();

    let result = state
        .model
        .artifact()
        .ok_or(ApiError::ModelNotLoaded)
        .and_then(|artifact| {
            let matrix = normalize(request.features, artifact)?;
            Ok(infer(artifact, &matrix)?)
        });

    match result {
        Ok(predictions) => {
            let elapsed = start.elapsed();
            state.metrics.observe_prediction_latency(elapsed.as_secs_f64());
            state.metrics.inc_predictions(predictions.len() as u64);
            state
                .logger
                .log_prediction(predictions.len(), elapsed.as_micros() as u64);
            Ok(Json(PredictResponse { predictions }))
        }
        Err(e) => {
            state.metrics.inc_prediction_errors();
            state
                .logger
                .log_prediction_failure(e.status().as_u16(), &e.detail());
            Err(e)
        }
    }
}

/// Full forecasting workflow for one product; falls back instead of failing
async fn demand(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DemandRequest>,
) -> Result<Json<DemandResponse>, ApiError> {
    let request = request.validate()?;
    let forecast = forecast_demand(&state.model, &request);
    if forecast.is_fallback() {
        state.metrics.inc_fallbacks();
    }
    Ok(Json(DemandResponse {
        demand: forecast.value(),
        fallback: forecast.is_fallback(),
    }))
}

fn forecast_demand(model: &ModelState, request: &PredictionRequest) -> Forecast {
    let artifact = match model {
        ModelState::Loaded(artifact) => Ok(artifact.as_ref()),
        ModelState::Unavailable(reason) => Err(PredictionError::ArtifactUnavailable(reason.clone())),
    };
    DemandForecaster::new().forecast(artifact, request)
}

async fn feature_importance(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ImportanceReport>, ApiError> {
    let artifact = state.model.artifact().ok_or(ApiError::ModelNotLoaded)?;
    Ok(Json(importance_report(artifact)?))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/demand", post(demand))
        .route("/feature-importance", get(feature_importance))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
