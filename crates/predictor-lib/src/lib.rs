//! Core library for traffic congestion prediction
//!
//! This crate provides the core functionality for:
//! - Request validation for loosely typed JSON bodies
//! - Calendar/traffic feature derivation
//! - ONNX scoring with a fixed route encoding
//! - Congestion classification
//! - Single, batch and hourly-sweep prediction orchestration
//! - Metrics and structured logging

pub mod error;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod request;

pub use error::{PredictionError, ValidationError};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use predictor::{ModelGateway, PredictionService};
