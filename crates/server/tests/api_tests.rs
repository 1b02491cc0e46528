//! Integration tests for the prediction API endpoints

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use predictor_lib::{
    predictor::{ModelArtifact, RouteEncoder, ScoringModel, DEFAULT_FEATURE_ORDER},
    ModelGateway, PredictionService, ServiceMetrics,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use traffic_predictor::api::{create_router, AppState};

fn app_with<M: ScoringModel + 'static>(model: M) -> Router {
    let encoder = RouteEncoder::from_labels(["R1", "R2", "R3"]).unwrap();
    let artifact = ModelArtifact::new(
        Box::new(model),
        encoder,
        DEFAULT_FEATURE_ORDER.to_vec(),
        "2024.06-test",
    );
    let gateway = ModelGateway::with_artifact("/models/traffic_model", artifact);
    create_router(AppState::new(PredictionService::new(gateway)))
}

/// Router backed by a stub model that returns the hour column plus `offset`,
/// counting every invocation
fn setup_test_app(offset: f64) -> (Router, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let model = move |row: &[f32]| -> Result<f64> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(row[1] as f64 + offset)
    };
    (app_with(model), calls)
}

/// Router whose stub scores `is_weekend * 10 + is_rush_hour`
fn setup_flag_app() -> Router {
    app_with(|row: &[f32]| -> Result<f64> { Ok((row[3] * 10.0 + row[4]) as f64) })
}

fn setup_app_without_model() -> Router {
    let gateway = ModelGateway::unavailable("/models/missing");
    create_router(AppState::new(PredictionService::new(gateway)))
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_reports_model_state() {
    let (app, _) = setup_test_app(0.0);
    let (status, body) = send(app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["model_loaded"], true);
    assert!(body["timestamp"].is_string());

    let (status, body) = send(setup_app_without_model(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn test_predict_round_trip() {
    // hour 8 + 37 = 45 -> Medium
    let (app, calls) = setup_test_app(37.0);
    let input = json!({"route_id": "R1", "hour": 8, "day_of_week": 3, "vehicle_count": 50});
    let (status, body) = send(app, "POST", "/predict", Some(input.clone())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["prediction"],
        json!({"congestion_index": 45.0, "congestion_level": "Medium", "confidence": 0.8})
    );
    assert_eq!(body["input"], input);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_predict_honours_flag_overrides() {
    // day 1 at hour 8 derives both flags
    let base = json!({"route_id": "R1", "hour": 8, "day_of_week": 1, "vehicle_count": 5});
    let (status, body) = send(setup_flag_app(), "POST", "/predict", Some(base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"]["congestion_index"], 11.0);

    let overridden = json!({
        "route_id": "R1", "hour": 8, "day_of_week": 1, "vehicle_count": 5, "is_weekend": 0
    });
    let (status, body) = send(setup_flag_app(), "POST", "/predict", Some(overridden)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"]["congestion_index"], 1.0);
    assert_eq!(body["input"]["is_weekend"], 0);
}

#[tokio::test]
async fn test_batch_honours_flag_overrides() {
    let (status, body) = send(
        setup_flag_app(),
        "POST",
        "/predict/batch",
        Some(json!({"predictions": [
            {"route_id": "R1", "hour": 8, "day_of_week": 1, "vehicle_count": 5},
            {"route_id": "R1", "hour": 8, "day_of_week": 1, "vehicle_count": 5,
             "is_weekend": 0, "is_rush_hour": 0}
        ]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"][0]["congestion_index"], 11.0);
    assert_eq!(body["predictions"][1]["congestion_index"], 0.0);
}

#[tokio::test]
async fn test_predict_missing_field_never_reaches_model() {
    let (app, calls) = setup_test_app(0.0);
    let (status, body) = send(
        app,
        "POST",
        "/predict",
        Some(json!({"route_id": "R1", "hour": 8, "day_of_week": 3})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: vehicle_count");
    assert!(body.get("success").is_none());
    assert!(body["timestamp"].is_string());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_predict_invalid_values_are_bad_requests() {
    let (app, calls) = setup_test_app(0.0);
    let (status, body) = send(
        app.clone(),
        "POST",
        "/predict",
        Some(json!({"route_id": "R1", "hour": 25, "day_of_week": 3, "vehicle_count": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("hour"));

    let (status, _) = send(app.clone(), "POST", "/predict", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_predict_unknown_route_is_bad_request() {
    let (app, _) = setup_test_app(0.0);
    let (status, body) = send(
        app,
        "POST",
        "/predict",
        Some(json!({"route_id": "R404", "hour": 8, "day_of_week": 3, "vehicle_count": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown route: R404");
}

#[tokio::test]
async fn test_predict_without_model_is_server_error() {
    let (status, body) = send(
        setup_app_without_model(),
        "POST",
        "/predict",
        Some(json!({"route_id": "R1", "hour": 8, "day_of_week": 3, "vehicle_count": 50})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Model not loaded");
}

#[tokio::test]
async fn test_batch_mixes_results_and_errors() {
    let (app, _) = setup_test_app(60.0);
    let (status, body) = send(
        app,
        "POST",
        "/predict/batch",
        Some(json!({"predictions": [
            {"route_id": "R1", "hour": 8, "day_of_week": 3, "vehicle_count": 50},
            {"route_id": "R2", "hour": 9},
            {"route_id": "R3", "hour": 0, "day_of_week": 7, "vehicle_count": 5}
        ]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 3);

    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 3);
    assert_eq!(predictions[0]["route_id"], "R1");
    assert_eq!(predictions[0]["hour"], 8);
    assert_eq!(predictions[0]["congestion_level"], "High");
    assert_eq!(
        predictions[1],
        json!({"route_id": "R2", "error": "Missing required field: day_of_week"})
    );
    assert_eq!(predictions[2]["congestion_index"], 60.0);
}

#[tokio::test]
async fn test_batch_requires_predictions_array() {
    let (app, _) = setup_test_app(0.0);
    let (status, body) = send(app.clone(), "POST", "/predict/batch", Some(json!({"items": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "predictions array is required");

    let (status, body) = send(app, "POST", "/predict/batch", Some(json!({"predictions": []}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_hourly_sweep_returns_24_hours() {
    let (app, calls) = setup_test_app(10.0);
    let (status, body) = send(
        app,
        "POST",
        "/predict/hourly/R2",
        Some(json!({"day_of_week": 6, "vehicle_count": 120})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["route_id"], "R2");
    assert_eq!(body["day_of_week"], 6);

    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 24);
    for (hour, p) in predictions.iter().enumerate() {
        assert_eq!(p["hour"], hour);
        assert_eq!(p["congestion_index"], hour as f64 + 10.0);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 24);
}

#[tokio::test]
async fn test_hourly_sweep_with_empty_body_uses_defaults() {
    let (app, _) = setup_test_app(0.0);
    let (status, body) = send(app, "POST", "/predict/hourly/R1", None).await;
    assert_eq!(status, StatusCode::OK);
    let day = body["day_of_week"].as_u64().unwrap();
    assert!((1..=7).contains(&day));
}

#[tokio::test]
async fn test_hourly_sweep_failures() {
    let (app, _) = setup_test_app(0.0);
    let (status, _) = send(
        app.clone(),
        "POST",
        "/predict/hourly/R1",
        Some(json!({"day_of_week": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(setup_app_without_model(), "POST", "/predict/hourly/R1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_model_info() {
    let (app, _) = setup_test_app(0.0);
    let (status, body) = send(app, "GET", "/model/info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["model_path"], "/models/traffic_model");
    assert_eq!(body["artifact_version"], "2024.06-test");
    assert_eq!(body["route_count"], 3);
    assert_eq!(body["feature_order"][0], "route_index");

    let (_, body) = send(setup_app_without_model(), "GET", "/model/info", None).await;
    assert_eq!(body["model_loaded"], false);
    assert!(body["artifact_version"].is_null());
    assert!(body.get("route_count").is_none());
}

#[tokio::test]
async fn test_unknown_endpoint() {
    let (app, _) = setup_test_app(0.0);
    let (status, body) = send(app, "GET", "/predictions", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Endpoint not found");
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _) = setup_test_app(0.0);
    ServiceMetrics::new().set_model(Some("2024.06-test"));

    // Produce at least one prediction so every series has a sample
    send(
        app.clone(),
        "POST",
        "/predict",
        Some(json!({"route_id": "R1", "hour": 8, "day_of_week": 3, "vehicle_count": 50})),
    )
    .await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("traffic_predictor_prediction_latency_seconds_bucket"));
    assert!(metrics_text.contains("traffic_predictor_predictions_total"));
    assert!(metrics_text.contains("traffic_predictor_model_loaded"));
    assert!(metrics_text.contains("traffic_predictor_model_version_info"));
}
