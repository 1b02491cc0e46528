//! Prediction orchestration
//!
//! Composes feature derivation, scoring and classification into a single
//! prediction, and fans that out over batches and 24-hour sweeps. Batch items
//! fail independently; a sweep fails as a whole on its first failing hour.

use super::{CongestionClassifier, FeatureDeriver, ModelGateway};
use crate::error::{PredictionError, ValidationError};
use crate::models::{
    BatchItemError, BatchItemResult, BatchPrediction, HourlyPrediction, HourlySweep,
    PredictionRequest, PredictionResult,
};
use crate::observability::{ServiceMetrics, StructuredLogger};
use crate::request::{parse_prediction_request, raw_route_id};
use chrono::{Datelike, Local, NaiveDate};
use rayon::prelude::*;
use serde_json::Value;
use std::time::Instant;

/// Vehicle count assumed by an hourly sweep when the caller gives none
pub const DEFAULT_VEHICLE_COUNT: u32 = 80;

pub const HOURS_PER_DAY: u8 = 24;

/// Shared, read-only prediction pipeline. Built once at startup.
pub struct PredictionService {
    deriver: FeatureDeriver,
    gateway: ModelGateway,
    classifier: CongestionClassifier,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
}

impl PredictionService {
    pub fn new(gateway: ModelGateway) -> Self {
        Self {
            deriver: FeatureDeriver::new(),
            gateway,
            classifier: CongestionClassifier::new(),
            metrics: ServiceMetrics::new(),
            logger: StructuredLogger::new("traffic-predictor"),
        }
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn gateway(&self) -> &ModelGateway {
        &self.gateway
    }

    /// Derive, score and classify one request
    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, PredictionError> {
        let start = Instant::now();
        let features = self.deriver.derive(request);

        match self.gateway.score(&features) {
            Ok(score) => {
                let result = self.classifier.to_result(score);
                let elapsed = start.elapsed();
                self.metrics.observe_prediction_latency(elapsed.as_secs_f64());
                self.metrics.inc_predictions();
                self.logger.log_prediction(
                    &request.route_id,
                    request.hour,
                    request.day_of_week,
                    result.congestion_index,
                    result.congestion_level.as_str(),
                    elapsed.as_micros(),
                );
                Ok(result)
            }
            Err(e) => {
                self.metrics.inc_prediction_errors();
                self.logger.log_prediction_failure(
                    &request.route_id,
                    Some(request.hour),
                    &e.to_string(),
                    e.is_client_error(),
                );
                Err(e)
            }
        }
    }

    /// Score every item independently. The output has the same length and
    /// order as `items`; a failing item becomes an error record.
    pub fn predict_batch(&self, items: &[Value]) -> Vec<BatchItemResult> {
        let results: Vec<BatchItemResult> =
            items.par_iter().map(|item| self.predict_item(item)).collect();

        let failed = results.iter().filter(|r| r.is_failed()).count();
        self.metrics.add_batch_failures(failed as u64);
        self.logger.log_batch(results.len(), failed);
        results
    }

    fn predict_item(&self, item: &Value) -> BatchItemResult {
        let request = match parse_prediction_request(item) {
            Ok(request) => request,
            Err(e) => {
                let route_id = raw_route_id(item);
                self.logger.log_prediction_failure(
                    route_id.as_deref().unwrap_or("<missing>"),
                    None,
                    &e.to_string(),
                    true,
                );
                return BatchItemResult::Failed(BatchItemError {
                    route_id,
                    error: e.to_string(),
                });
            }
        };

        match self.predict(&request) {
            Ok(prediction) => BatchItemResult::Scored(BatchPrediction {
                route_id: request.route_id,
                hour: request.hour,
                prediction,
            }),
            Err(e) => BatchItemResult::Failed(BatchItemError {
                route_id: Some(request.route_id),
                error: e.to_string(),
            }),
        }
    }

    /// Predict all 24 hours of one day for a route. `day_of_week` defaults to
    /// today (Monday = 1), `vehicle_count` to [`DEFAULT_VEHICLE_COUNT`].
    pub fn predict_hourly(
        &self,
        route_id: &str,
        day_of_week: Option<u8>,
        vehicle_count: Option<u32>,
    ) -> Result<HourlySweep, PredictionError> {
        let day_of_week = day_of_week.unwrap_or_else(|| weekday_number(Local::now().date_naive()));
        self.predict_hourly_for_day(
            route_id,
            day_of_week,
            vehicle_count.unwrap_or(DEFAULT_VEHICLE_COUNT),
        )
    }

    pub fn predict_hourly_for_day(
        &self,
        route_id: &str,
        day_of_week: u8,
        vehicle_count: u32,
    ) -> Result<HourlySweep, PredictionError> {
        if !(1..=7).contains(&day_of_week) {
            return Err(ValidationError::invalid(
                "day_of_week",
                format!("must be between 1 and 7, got {}", day_of_week),
            )
            .into());
        }

        let predictions = (0..HOURS_PER_DAY)
            .into_par_iter()
            .map(|hour| {
                let request = PredictionRequest::new(route_id, hour, day_of_week, vehicle_count);
                self.predict(&request)
                    .map(|prediction| HourlyPrediction { hour, prediction })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.logger.log_hourly_sweep(route_id, day_of_week, vehicle_count);
        Ok(HourlySweep {
            route_id: route_id.to_string(),
            day_of_week,
            predictions,
        })
    }
}

/// 1-based weekday with Monday = 1 and Sunday = 7
pub fn weekday_number(date: NaiveDate) -> u8 {
    date.weekday().number_from_monday() as u8
}
