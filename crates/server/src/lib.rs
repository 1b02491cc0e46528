//! Traffic predictor HTTP service
//!
//! Exposes the prediction engine from `predictor-lib` over axum.

pub mod api;
pub mod config;
