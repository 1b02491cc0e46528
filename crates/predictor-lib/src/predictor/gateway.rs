//! Model gateway
//!
//! Owns the scoring artifact and its route encoding. Both are loaded once at
//! startup from an artifact directory and are read-only afterwards:
//!
//! ```text
//! <model_path>/
//!   model.onnx
//!   manifest.json   {"version", "routes", "feature_order"?, "model_sha256"?}
//! ```

use super::encoding::RouteEncoder;
use super::features::{FeatureColumn, DEFAULT_FEATURE_ORDER};
use super::inference::{OnnxScoringModel, ScoringModel};
use crate::error::PredictionError;
use crate::models::DerivedFeatureVector;
use anyhow::{Context, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const MODEL_FILE: &str = "model.onnx";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Metadata shipped next to the ONNX graph
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactManifest {
    pub version: String,
    /// Training-time route labels; position is the numeric code
    pub routes: Vec<String>,
    #[serde(default)]
    pub feature_order: Option<Vec<FeatureColumn>>,
    #[serde(default)]
    pub model_sha256: Option<String>,
}

impl ArtifactManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))
    }

    pub fn feature_order(&self) -> Vec<FeatureColumn> {
        self.feature_order
            .clone()
            .unwrap_or_else(|| DEFAULT_FEATURE_ORDER.to_vec())
    }
}

/// A loaded artifact: scoring model, fixed encoding and column order
pub struct ModelArtifact {
    model: Box<dyn ScoringModel>,
    encoder: RouteEncoder,
    feature_order: Vec<FeatureColumn>,
    version: String,
}

impl ModelArtifact {
    pub fn new(
        model: Box<dyn ScoringModel>,
        encoder: RouteEncoder,
        feature_order: Vec<FeatureColumn>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            model,
            encoder,
            feature_order,
            version: version.into(),
        }
    }

    /// Load and validate an artifact directory
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest = ArtifactManifest::load(&dir.join(MANIFEST_FILE))?;
        let model_path = dir.join(MODEL_FILE);

        if let Some(expected) = &manifest.model_sha256 {
            verify_checksum(&model_path, expected)?;
        }

        let feature_order = manifest.feature_order();
        if feature_order.is_empty() {
            anyhow::bail!("Manifest feature_order must not be empty");
        }
        let encoder = RouteEncoder::from_labels(manifest.routes)?;
        let model = OnnxScoringModel::from_path(&model_path, feature_order.len())?;

        Ok(Self::new(Box::new(model), encoder, feature_order, manifest.version))
    }
}

fn verify_checksum(path: &Path, expected: &str) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let actual = hex::encode(Sha256::digest(&bytes));
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        anyhow::bail!(
            "Checksum mismatch for {}: expected {}, got {}",
            path.display(),
            expected,
            actual
        );
    }
    debug!(path = %path.display(), "Model checksum verified");
    Ok(())
}

/// Converts a derived feature vector into a raw congestion score
pub struct ModelGateway {
    model_path: PathBuf,
    artifact: Option<ModelArtifact>,
}

impl ModelGateway {
    /// Load the artifact at `model_path`. Never fails: a missing or invalid
    /// artifact leaves the gateway unavailable and every score call errors.
    pub fn load(model_path: impl Into<PathBuf>) -> Self {
        let model_path = model_path.into();

        if !model_path.join(MODEL_FILE).exists() {
            warn!(model_path = %model_path.display(), "Model not found, serving without a model");
            return Self::unavailable(model_path);
        }

        match ModelArtifact::load(&model_path) {
            Ok(artifact) => {
                info!(
                    model_path = %model_path.display(),
                    version = %artifact.version,
                    routes = artifact.encoder.len(),
                    "Model loaded"
                );
                Self::with_artifact(model_path, artifact)
            }
            Err(e) => {
                error!(model_path = %model_path.display(), error = %format!("{:#}", e), "Failed to load model");
                Self::unavailable(model_path)
            }
        }
    }

    pub fn unavailable(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            artifact: None,
        }
    }

    pub fn with_artifact(model_path: impl Into<PathBuf>, artifact: ModelArtifact) -> Self {
        Self {
            model_path: model_path.into(),
            artifact: Some(artifact),
        }
    }

    pub fn score(&self, features: &DerivedFeatureVector) -> Result<f64, PredictionError> {
        let artifact = self.artifact.as_ref().ok_or(PredictionError::ModelUnavailable)?;

        let route_index = artifact
            .encoder
            .encode(&features.route_id)
            .ok_or_else(|| PredictionError::UnknownRoute(features.route_id.clone()))?;

        let row = features.to_row(route_index, &artifact.feature_order);
        artifact.model.score(&row).map_err(PredictionError::Inference)
    }

    pub fn is_loaded(&self) -> bool {
        self.artifact.is_some()
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn artifact_version(&self) -> Option<&str> {
        self.artifact.as_ref().map(|a| a.version.as_str())
    }

    pub fn feature_order(&self) -> Option<&[FeatureColumn]> {
        self.artifact.as_ref().map(|a| a.feature_order.as_slice())
    }

    pub fn route_count(&self) -> Option<usize> {
        self.artifact.as_ref().map(|a| a.encoder.len())
    }
}
