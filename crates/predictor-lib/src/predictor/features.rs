//! Feature derivation for ML inference
//!
//! Fills in the calendar/traffic flags the caller left out and lays the
//! resulting vector out as a model input row.

use crate::models::{DerivedFeatureVector, PredictionRequest};
use serde::{Deserialize, Serialize};

/// Hours treated as commute traffic
pub const RUSH_HOURS: [u8; 6] = [7, 8, 9, 17, 18, 19];

/// Days treated as the weekend (1-7 scale, both ends of the week)
pub const WEEKEND_DAYS: [u8; 2] = [1, 7];

/// A column of the model input row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureColumn {
    RouteIndex,
    Hour,
    DayOfWeek,
    IsWeekend,
    IsRushHour,
    VehicleCount,
    RollingVehicleCount,
}

/// Column order used when the artifact manifest does not specify one
pub const DEFAULT_FEATURE_ORDER: [FeatureColumn; 7] = [
    FeatureColumn::RouteIndex,
    FeatureColumn::Hour,
    FeatureColumn::DayOfWeek,
    FeatureColumn::IsWeekend,
    FeatureColumn::IsRushHour,
    FeatureColumn::VehicleCount,
    FeatureColumn::RollingVehicleCount,
];

/// Derives model features from a validated request
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureDeriver;

impl FeatureDeriver {
    pub fn new() -> Self {
        Self
    }

    /// Caller-supplied flags win; absent ones are computed
    pub fn derive(&self, request: &PredictionRequest) -> DerivedFeatureVector {
        DerivedFeatureVector {
            route_id: request.route_id.clone(),
            hour: request.hour,
            day_of_week: request.day_of_week,
            is_weekend: request
                .is_weekend
                .unwrap_or_else(|| is_weekend(request.day_of_week)),
            is_rush_hour: request
                .is_rush_hour
                .unwrap_or_else(|| is_rush_hour(request.hour)),
            vehicle_count: request.vehicle_count,
            rolling_vehicle_count: request.vehicle_count,
        }
    }
}

pub fn is_weekend(day_of_week: u8) -> u8 {
    u8::from(WEEKEND_DAYS.contains(&day_of_week))
}

pub fn is_rush_hour(hour: u8) -> u8 {
    u8::from(RUSH_HOURS.contains(&hour))
}

impl DerivedFeatureVector {
    /// Lay the vector out as a model input row
    pub fn to_row(&self, route_index: usize, order: &[FeatureColumn]) -> Vec<f32> {
        order
            .iter()
            .map(|column| match column {
                FeatureColumn::RouteIndex => route_index as f32,
                FeatureColumn::Hour => self.hour as f32,
                FeatureColumn::DayOfWeek => self.day_of_week as f32,
                FeatureColumn::IsWeekend => self.is_weekend as f32,
                FeatureColumn::IsRushHour => self.is_rush_hour as f32,
                FeatureColumn::VehicleCount => self.vehicle_count as f32,
                FeatureColumn::RollingVehicleCount => self.rolling_vehicle_count as f32,
            })
            .collect()
    }
}
