//! Error types for request validation and prediction

/// A caller supplied a body that does not match the request schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Malformed JSON body: {0}")]
    MalformedJson(String),

    #[error("predictions array is required")]
    MissingPredictions,
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors raised while producing a prediction.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Inference failed: {0:#}")]
    Inference(anyhow::Error),
}

impl PredictionError {
    /// True when the caller can fix the request; false for service-side faults.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::UnknownRoute(_))
    }
}
