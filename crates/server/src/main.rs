//! Traffic Predictor - congestion prediction service
//!
//! Loads the scoring artifact once at startup and serves single, batch and
//! hourly-sweep predictions over HTTP.

use anyhow::Result;
use predictor_lib::{ModelGateway, PredictionService, ServiceMetrics, StructuredLogger};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use traffic_predictor::{api, config::ServerConfig};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::load()?;

    // RUST_LOG wins; otherwise DEBUG picks the default level
    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().json())
        .init();

    info!(config = ?config, "Starting traffic-predictor");

    let addr = config.bind_addr()?;
    let logger = StructuredLogger::new("traffic-predictor");

    // Load the artifact before the listener binds; a missing model is not fatal
    let gateway = ModelGateway::load(&config.model_path);
    let metrics = ServiceMetrics::new();
    metrics.set_model(gateway.artifact_version());
    logger.log_model_state(&config.model_path.display().to_string(), gateway.artifact_version());

    let service = PredictionService::new(gateway).with_logger(logger.clone());
    let state = api::AppState::new(service);

    logger.log_startup(SERVICE_VERSION, &addr.to_string(), config.debug);

    let api_handle = tokio::spawn(api::serve(addr, state));

    tokio::select! {
        result = api_handle => {
            result??;
            logger.log_shutdown("server stopped");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
