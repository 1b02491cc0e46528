//! Congestion prediction engine

mod classifier;
mod encoding;
mod features;
mod gateway;
mod inference;
mod service;

pub use classifier::{
    round_index, CongestionClassifier, HIGH_CONFIDENCE, HIGH_THRESHOLD, LOW_CONFIDENCE,
    MEDIUM_CONFIDENCE, MEDIUM_THRESHOLD,
};
pub use encoding::RouteEncoder;
pub use features::{
    is_rush_hour, is_weekend, FeatureColumn, FeatureDeriver, DEFAULT_FEATURE_ORDER, RUSH_HOURS,
    WEEKEND_DAYS,
};
pub use gateway::{ArtifactManifest, ModelArtifact, ModelGateway, MANIFEST_FILE, MODEL_FILE};
pub use inference::{OnnxScoringModel, ScoringModel};
pub use service::{weekday_number, PredictionService, DEFAULT_VEHICLE_COUNT, HOURS_PER_DAY};
