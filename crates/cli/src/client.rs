//! API client for communicating with the traffic prediction service

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Error returned by the service with a non-success status
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// API client for the prediction service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get(self.endpoint("health")?).await
    }

    pub async fn model_info(&self) -> Result<ModelInfo> {
        self.get(self.endpoint("model/info")?).await
    }

    pub async fn predict(&self, request: &PredictRequest) -> Result<PredictResponse> {
        self.post(self.endpoint("predict")?, request).await
    }

    pub async fn predict_batch(&self, items: Vec<Value>) -> Result<BatchResponse> {
        let body = BatchRequest { predictions: items };
        self.post(self.endpoint("predict/batch")?, &body).await
    }

    pub async fn predict_hourly(&self, route_id: &str, request: &HourlyRequest) -> Result<HourlyResponse> {
        self.post(self.hourly_endpoint(route_id)?, request).await
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).context("Invalid path")
    }

    /// The route id is pushed as one percent-encoded path segment
    fn hourly_endpoint(&self, route_id: &str) -> Result<Url> {
        let mut url = self.endpoint("predict/hourly/")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API URL cannot be used as a base: {}", self.base_url))?
            .pop_if_empty()
            .push(route_id);
        Ok(url)
    }

    /// Make a GET request
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    /// Make a POST request with JSON body
    async fn post<T: DeserializeOwned, B: Serialize>(&self, url: Url, body: &B) -> Result<T> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Prefer the service's own error message over the raw body
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        response.json().await.context("Failed to parse response")
    }
}

// API request and response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_loaded: bool,
    pub model_path: String,
    pub artifact_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_order: Option<Vec<String>>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub route_id: String,
    pub hour: u8,
    pub day_of_week: u8,
    pub vehicle_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_weekend: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_rush_hour: Option<u8>,
}

/// Classified prediction; a non-finite index arrives as null
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub congestion_index: Option<f64>,
    pub congestion_level: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub success: bool,
    pub prediction: Prediction,
    pub input: Value,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub predictions: Vec<Value>,
}

/// One positional batch result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchItem {
    Failed {
        route_id: Option<String>,
        error: String,
    },
    Scored {
        route_id: String,
        hour: u8,
        #[serde(flatten)]
        prediction: Prediction,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    pub predictions: Vec<BatchItem>,
    pub count: usize,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyEntry {
    pub hour: u8,
    #[serde(flatten)]
    pub prediction: Prediction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyResponse {
    pub success: bool,
    pub route_id: String,
    pub day_of_week: u8,
    pub predictions: Vec<HourlyEntry>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
