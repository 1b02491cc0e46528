//! Traffic Congestion Predictor CLI
//!
//! A command-line tool for checking the prediction service and requesting
//! single, batch and hourly congestion predictions.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{value_parser, Parser, Subcommand};
use commands::{predict, service};
use std::path::PathBuf;

/// Traffic Congestion Predictor CLI
#[derive(Parser)]
#[command(name = "tpc")]
#[command(author, version, about = "CLI for the Traffic Congestion Predictor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via TPC_API_URL env var)
    #[arg(long, env = "TPC_API_URL", default_value = "http://localhost:5001")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check service health and whether a model is loaded
    Health,

    /// Show metadata of the loaded scoring artifact
    ModelInfo,

    /// Predict congestion for one route and time slot
    Predict {
        /// Route identifier
        #[arg(long)]
        route: String,

        /// Hour of day (0-23)
        #[arg(long, value_parser = value_parser!(u8).range(0..=23))]
        hour: u8,

        /// Day of week (1-7, Monday = 1)
        #[arg(long, value_parser = value_parser!(u8).range(1..=7))]
        day: u8,

        /// Observed vehicle count
        #[arg(long)]
        vehicles: u32,

        /// Override the derived weekend flag
        #[arg(long, value_parser = value_parser!(u8).range(0..=1))]
        weekend: Option<u8>,

        /// Override the derived rush-hour flag
        #[arg(long, value_parser = value_parser!(u8).range(0..=1))]
        rush_hour: Option<u8>,
    },

    /// Submit a batch of predictions from a JSON file
    Batch {
        /// File holding a JSON array or {"predictions": [...]}
        file: PathBuf,
    },

    /// Predict all 24 hours of a day for one route
    Hourly {
        /// Route identifier
        route: String,

        /// Day of week (1-7, Monday = 1); defaults to today on the server
        #[arg(long, value_parser = value_parser!(u8).range(1..=7))]
        day: Option<u8>,

        /// Vehicle count assumed for every hour (server default: 80)
        #[arg(long)]
        vehicles: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize client
    let client = client::ApiClient::new(&cli.api_url)?;

    // Execute command
    match cli.command {
        Commands::Health => service::health(&client, cli.format).await?,
        Commands::ModelInfo => service::model_info(&client, cli.format).await?,
        Commands::Predict {
            route,
            hour,
            day,
            vehicles,
            weekend,
            rush_hour,
        } => {
            let request = client::PredictRequest {
                route_id: route,
                hour,
                day_of_week: day,
                vehicle_count: vehicles,
                is_weekend: weekend,
                is_rush_hour: rush_hour,
            };
            predict::predict(&client, request, cli.format).await?;
        }
        Commands::Batch { file } => predict::batch(&client, &file, cli.format).await?,
        Commands::Hourly {
            route,
            day,
            vehicles,
        } => {
            let request = client::HourlyRequest {
                day_of_week: day,
                vehicle_count: vehicles,
            };
            predict::hourly(&client, &route, request, cli.format).await?;
        }
    }

    Ok(())
}
