//! Prediction commands

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;
use std::path::Path;
use tabled::Tabled;

use crate::client::{ApiClient, BatchItem, HourlyRequest, PredictRequest};
use crate::output::{
    color_level, format_confidence, format_day, format_hour, format_index, print_error,
    print_json, print_success, print_table, print_warning, OutputFormat,
};

/// Row for a single prediction
#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "Route")]
    route: String,
    #[tabled(rename = "Hour")]
    hour: String,
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Vehicles")]
    vehicles: u32,
    #[tabled(rename = "Index")]
    index: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

/// Row for batch results
#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Route")]
    route: String,
    #[tabled(rename = "Hour")]
    hour: String,
    #[tabled(rename = "Index")]
    index: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Error")]
    error: String,
}

/// Row for hourly sweep
#[derive(Tabled)]
struct HourlyRow {
    #[tabled(rename = "Hour")]
    hour: String,
    #[tabled(rename = "Index")]
    index: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

/// Predict congestion for one route and time slot
pub async fn predict(client: &ApiClient, request: PredictRequest, format: OutputFormat) -> Result<()> {
    let result = client.predict(&request).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            let prediction = &result.prediction;
            print_table(vec![PredictionRow {
                route: request.route_id.clone(),
                hour: format_hour(request.hour),
                day: format_day(request.day_of_week),
                vehicles: request.vehicle_count,
                index: format_index(prediction.congestion_index),
                level: color_level(&prediction.congestion_level),
                confidence: format_confidence(prediction.confidence),
            }]);
        }
    }

    Ok(())
}

/// Load batch items from a file holding either a JSON array or
/// `{"predictions": [...]}`
pub fn load_batch_file(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Batch file {} is not valid JSON", path.display()))?;

    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut body) => match body.remove("predictions") {
            Some(Value::Array(items)) => Ok(items),
            _ => anyhow::bail!("Batch file object must contain a predictions array"),
        },
        _ => anyhow::bail!("Batch file must contain a JSON array or an object with a predictions array"),
    }
}

/// Submit a batch of predictions from a file
pub async fn batch(client: &ApiClient, path: &Path, format: OutputFormat) -> Result<()> {
    let items = load_batch_file(path)?;
    let result = client.predict_batch(items).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            let rows: Vec<BatchRow> = result
                .predictions
                .iter()
                .enumerate()
                .map(|(i, item)| batch_row(i + 1, item))
                .collect();
            print_table(rows);

            let failed = result
                .predictions
                .iter()
                .filter(|item| matches!(item, BatchItem::Failed { .. }))
                .count();
            println!();
            if failed == 0 {
                print_success(&format!("{} predictions", result.count));
            } else if failed == result.count {
                print_error(&format!("All {} items failed", failed));
            } else {
                print_warning(&format!(
                    "{} predictions, {} failed",
                    result.count - failed,
                    failed
                ));
            }
        }
    }

    Ok(())
}

fn batch_row(position: usize, item: &BatchItem) -> BatchRow {
    match item {
        BatchItem::Scored {
            route_id,
            hour,
            prediction,
        } => BatchRow {
            position,
            route: route_id.clone(),
            hour: format_hour(*hour),
            index: format_index(prediction.congestion_index),
            level: color_level(&prediction.congestion_level),
            confidence: format_confidence(prediction.confidence),
            error: String::new(),
        },
        BatchItem::Failed { route_id, error } => BatchRow {
            position,
            route: route_id.clone().unwrap_or_else(|| "-".to_string()),
            hour: "-".to_string(),
            index: "-".to_string(),
            level: "-".to_string(),
            confidence: "-".to_string(),
            error: error.red().to_string(),
        },
    }
}

/// Predict all 24 hours of a day for one route
pub async fn hourly(
    client: &ApiClient,
    route_id: &str,
    request: HourlyRequest,
    format: OutputFormat,
) -> Result<()> {
    let result = client.predict_hourly(route_id, &request).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!(
                "{} {} ({})",
                "Hourly forecast for".bold(),
                result.route_id.cyan(),
                format_day(result.day_of_week)
            );

            let rows: Vec<HourlyRow> = result
                .predictions
                .iter()
                .map(|entry| HourlyRow {
                    hour: format_hour(entry.hour),
                    index: format_index(entry.prediction.congestion_index),
                    level: color_level(&entry.prediction.congestion_level),
                    confidence: format_confidence(entry.prediction.confidence),
                })
                .collect();
            print_table(rows);

            let peak = result
                .predictions
                .iter()
                .filter_map(|entry| entry.prediction.congestion_index.map(|index| (entry.hour, index)))
                .max_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((hour, index)) = peak {
                println!("Peak: {} at {:.2}", format_hour(hour).bold(), index);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Prediction;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn write_batch(content: &str) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn test_load_batch_array() {
        let file = write_batch(r#"[{"route_id": "R1"}, {"route_id": "R2"}]"#);
        let items = load_batch_file(file.path()).unwrap();
        assert_eq!(items, vec![json!({"route_id": "R1"}), json!({"route_id": "R2"})]);
    }

    #[test]
    fn test_load_batch_wrapped() {
        let file = write_batch(r#"{"predictions": [{"route_id": "R1"}]}"#);
        assert_eq!(load_batch_file(file.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_load_batch_rejects_other_shapes() {
        let file = write_batch(r#"{"items": []}"#);
        assert!(load_batch_file(file.path()).is_err());

        let file = write_batch("42");
        assert!(load_batch_file(file.path()).is_err());

        let file = write_batch("{oops");
        let err = load_batch_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_load_batch_missing_file() {
        assert!(load_batch_file(Path::new("/nonexistent/batch.json")).is_err());
    }

    #[test]
    fn test_batch_rows() {
        let scored = BatchItem::Scored {
            route_id: "R1".into(),
            hour: 8,
            prediction: Prediction {
                congestion_index: Some(45.0),
                congestion_level: "Medium".into(),
                confidence: 0.8,
            },
        };
        let row = batch_row(1, &scored);
        assert_eq!(row.hour, "08:00");
        assert_eq!(row.index, "45.00");
        assert!(row.error.is_empty());

        let failed = BatchItem::Failed {
            route_id: None,
            error: "Missing required field: route_id".into(),
        };
        let row = batch_row(2, &failed);
        assert_eq!(row.route, "-");
        assert!(row.error.contains("route_id"));
    }
}
