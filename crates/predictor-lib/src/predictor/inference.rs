//! ONNX Runtime inference using tract
//!
//! Runs the exported congestion regressor: one f32 row in, one scalar
//! congestion index out.

use crate::observability::ServiceMetrics;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// The opaque scoring artifact: maps a feature row to a raw congestion index
pub trait ScoringModel: Send + Sync {
    fn score(&self, row: &[f32]) -> Result<f64>;
}

impl<F> ScoringModel for F
where
    F: Fn(&[f32]) -> Result<f64> + Send + Sync,
{
    fn score(&self, row: &[f32]) -> Result<f64> {
        self(row)
    }
}

/// ONNX-based scoring model using tract for lightweight inference
pub struct OnnxScoringModel {
    model: TractModel,
    num_features: usize,
    metrics: ServiceMetrics,
}

impl OnnxScoringModel {
    pub fn from_path(path: &Path, num_features: usize) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read ONNX model {}", path.display()))?;
        Self::from_bytes(&bytes, num_features)
    }

    pub fn from_bytes(model_bytes: &[u8], num_features: usize) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, num_features]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(Self {
            model,
            num_features,
            metrics: ServiceMetrics::new(),
        })
    }
}

impl ScoringModel for OnnxScoringModel {
    fn score(&self, row: &[f32]) -> Result<f64> {
        if row.len() != self.num_features {
            anyhow::bail!(
                "Feature row has {} values, model expects {}",
                row.len(),
                self.num_features
            );
        }

        let start = Instant::now();
        let input: Tensor =
            tract_ndarray::Array2::from_shape_vec((1, self.num_features), row.to_vec())?.into();

        let result = self.model.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;
        let scores = output.cast_to::<f64>()?;
        let score = scores
            .to_array_view::<f64>()?
            .iter()
            .next()
            .copied()
            .context("Model output is empty")?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.metrics.inc_slow_inferences();
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(score)
    }
}
