//! Congestion classification
//!
//! Maps a raw congestion index to a level and a fixed per-level confidence.
//! The tiers are half-open: 30 and 60 belong to the tier above.

use crate::models::{CongestionLevel, PredictionResult};

/// Lowest score classified as Medium
pub const MEDIUM_THRESHOLD: f64 = 30.0;

/// Lowest score classified as High
pub const HIGH_THRESHOLD: f64 = 60.0;

pub const LOW_CONFIDENCE: f64 = 0.85;
pub const MEDIUM_CONFIDENCE: f64 = 0.80;
pub const HIGH_CONFIDENCE: f64 = 0.75;

impl CongestionLevel {
    /// Static confidence for the tier; not derived from model uncertainty
    pub fn confidence(&self) -> f64 {
        match self {
            CongestionLevel::Low => LOW_CONFIDENCE,
            CongestionLevel::Medium => MEDIUM_CONFIDENCE,
            CongestionLevel::High => HIGH_CONFIDENCE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CongestionClassifier;

impl CongestionClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Total over all scores. NaN fails both comparisons and lands in High.
    pub fn classify(&self, score: f64) -> (CongestionLevel, f64) {
        let level = if score < MEDIUM_THRESHOLD {
            CongestionLevel::Low
        } else if score < HIGH_THRESHOLD {
            CongestionLevel::Medium
        } else {
            CongestionLevel::High
        };
        (level, level.confidence())
    }

    pub fn to_result(&self, score: f64) -> PredictionResult {
        let (congestion_level, confidence) = self.classify(score);
        PredictionResult {
            congestion_index: round_index(score),
            congestion_level,
            confidence,
        }
    }
}

/// Round to 2 decimal places, ties to even
pub fn round_index(score: f64) -> f64 {
    (score * 100.0).round_ties_even() / 100.0
}
