//! Service status commands

use anyhow::Result;
use colored::Colorize;

use crate::client::ApiClient;
use crate::output::{color_flag, format_timestamp, print_json, print_warning, OutputFormat};

/// Show service health
pub async fn health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", "Service Health".bold());
            println!("{}", "=".repeat(40));
            println!("Status:        {}", result.status.green());
            println!("Model loaded:  {}", color_flag(result.model_loaded));
            println!("Checked at:    {}", format_timestamp(&result.timestamp).dimmed());

            if !result.model_loaded {
                println!();
                print_warning("No model loaded; predictions will fail until one is deployed");
            }
        }
    }

    Ok(())
}

/// Show metadata of the loaded scoring artifact
pub async fn model_info(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result = client.model_info().await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", "Model Info".bold());
            println!("{}", "=".repeat(40));
            println!("Loaded:        {}", color_flag(result.model_loaded));
            println!("Path:          {}", result.model_path.cyan());
            println!(
                "Version:       {}",
                result.artifact_version.as_deref().unwrap_or("-")
            );
            if let Some(routes) = result.route_count {
                println!("Routes:        {}", routes);
            }
            if let Some(columns) = &result.feature_order {
                println!("Features:      {}", columns.join(", "));
            }
        }
    }

    Ok(())
}
