//! Core data models for the prediction service

use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated single-route prediction request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub route_id: String,
    pub hour: u8,
    pub day_of_week: u8,
    pub vehicle_count: u32,
    pub is_weekend: Option<u8>,
    pub is_rush_hour: Option<u8>,
}

impl PredictionRequest {
    pub fn new(route_id: impl Into<String>, hour: u8, day_of_week: u8, vehicle_count: u32) -> Self {
        Self {
            route_id: route_id.into(),
            hour,
            day_of_week,
            vehicle_count,
            is_weekend: None,
            is_rush_hour: None,
        }
    }

    pub fn with_weekend(mut self, is_weekend: u8) -> Self {
        self.is_weekend = Some(is_weekend);
        self
    }

    pub fn with_rush_hour(mut self, is_rush_hour: u8) -> Self {
        self.is_rush_hour = Some(is_rush_hour);
        self
    }
}

/// Model-ready features derived from a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedFeatureVector {
    pub route_id: String,
    pub hour: u8,
    pub day_of_week: u8,
    pub is_weekend: u8,
    pub is_rush_hour: u8,
    pub vehicle_count: u32,
    /// Placeholder: equal to `vehicle_count` until historical state is available
    pub rolling_vehicle_count: u32,
}

/// Discrete congestion classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CongestionLevel {
    Low,
    Medium,
    High,
}

impl CongestionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CongestionLevel::Low => "Low",
            CongestionLevel::Medium => "Medium",
            CongestionLevel::High => "High",
        }
    }
}

impl fmt::Display for CongestionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified output of a single prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub congestion_index: f64,
    pub congestion_level: CongestionLevel,
    pub confidence: f64,
}

/// Prediction for one hour of an hourly sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyPrediction {
    pub hour: u8,
    #[serde(flatten)]
    pub prediction: PredictionResult,
}

/// Result of a 24-hour sweep for one route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySweep {
    pub route_id: String,
    pub day_of_week: u8,
    pub predictions: Vec<HourlyPrediction>,
}

/// Successful batch item, tagged with the identifiers it was requested for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPrediction {
    pub route_id: String,
    pub hour: u8,
    #[serde(flatten)]
    pub prediction: PredictionResult,
}

/// Failed batch item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemError {
    /// The caller's route_id if it was a string, otherwise null
    pub route_id: Option<String>,
    pub error: String,
}

/// Outcome of one batch item; the batch response is positional with its input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchItemResult {
    Scored(BatchPrediction),
    Failed(BatchItemError),
}

impl BatchItemResult {
    pub fn is_failed(&self) -> bool {
        matches!(self, BatchItemResult::Failed(_))
    }
}
