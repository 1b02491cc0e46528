//! HTTP API for predictions, model metadata and Prometheus metrics

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use predictor_lib::{
    request::{batch_items, parse_hourly_options, parse_json_body, parse_prediction_request},
    PredictionError, PredictionService, ValidationError,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
}

impl AppState {
    pub fn new(service: PredictionService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Error response; client errors carry no `success` flag
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<PredictionError> for ApiError {
    fn from(e: PredictionError) -> Self {
        if e.is_client_error() {
            ApiError::BadRequest(e.to_string())
        } else {
            ApiError::Internal(e.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                debug!(error = %message, "Rejected request");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": message, "timestamp": timestamp()})),
                )
                    .into_response()
            }
            ApiError::Internal(message) => {
                error!(error = %message, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"success": false, "error": message, "timestamp": timestamp()})),
                )
                    .into_response()
            }
        }
    }
}

fn timestamp() -> String {
    Local::now().to_rfc3339()
}

/// Run CPU-bound scoring off the async executor
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, PredictionError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("Prediction task failed: {}", e)))?
        .map_err(ApiError::from)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "model_loaded": state.service.gateway().is_loaded(),
        "timestamp": timestamp(),
    }))
}

async fn predict(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let input = parse_json_body(&body)?;
    let request = parse_prediction_request(&input)?;

    let service = state.service.clone();
    let prediction = run_blocking(move || service.predict(&request)).await?;

    Ok(Json(json!({
        "success": true,
        "prediction": prediction,
        "input": input,
        "timestamp": timestamp(),
    })))
}

async fn predict_batch(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = parse_json_body(&body)?;
    let items = batch_items(&body)?.to_vec();

    let service = state.service.clone();
    let predictions =
        run_blocking(move || Ok::<_, PredictionError>(service.predict_batch(&items))).await?;

    Ok(Json(json!({
        "success": true,
        "count": predictions.len(),
        "predictions": predictions,
        "timestamp": timestamp(),
    })))
}

async fn predict_hourly(
    State(state): State<AppState>,
    Path(route_id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let options = parse_hourly_options(&parse_json_body(&body)?)?;

    let service = state.service.clone();
    let sweep = run_blocking(move || {
        service.predict_hourly(&route_id, options.day_of_week, options.vehicle_count)
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "route_id": sweep.route_id,
        "day_of_week": sweep.day_of_week,
        "predictions": sweep.predictions,
        "timestamp": timestamp(),
    })))
}

async fn model_info(State(state): State<AppState>) -> impl IntoResponse {
    let gateway = state.service.gateway();
    let mut info = json!({
        "model_loaded": gateway.is_loaded(),
        "model_path": gateway.model_path().display().to_string(),
        "artifact_version": gateway.artifact_version(),
        "timestamp": timestamp(),
    });
    if let (Some(route_count), Some(feature_order)) = (gateway.route_count(), gateway.feature_order()) {
        info["route_count"] = json!(route_count);
        info["feature_order"] = json!(feature_order);
    }
    Json(info)
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Internal(format!("Failed to encode metrics: {}", e)))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "Endpoint not found", "timestamp": timestamp()})),
    )
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/predict/batch", post(predict_batch))
        .route("/predict/hourly/:route_id", post(predict_hourly))
        .route("/model/info", get(model_info))
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
