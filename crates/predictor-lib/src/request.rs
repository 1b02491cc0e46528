//! Request schema validation
//!
//! Callers send loosely typed JSON. Everything is checked here, at the
//! boundary, before a [`PredictionRequest`] exists:
//! - required fields are checked in a fixed order so the first missing one is reported
//! - numeric fields are coerced to integers (integer, finite float truncated,
//!   integer string, boolean) and range checked
//! - the 0/1 flags accept the same inputs but only coerce to 0 or 1

use crate::error::ValidationError;
use crate::models::PredictionRequest;
use serde_json::{Map, Value};

/// Required fields of a prediction body, in the order they are checked
pub const REQUIRED_FIELDS: [&str; 4] = ["route_id", "hour", "day_of_week", "vehicle_count"];

/// Optional overrides accepted by the hourly sweep endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HourlyOptions {
    pub day_of_week: Option<u8>,
    pub vehicle_count: Option<u32>,
}

/// Parse a raw request body; an empty body is treated as `{}`
pub fn parse_json_body(bytes: &[u8]) -> Result<Value, ValidationError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes).map_err(|e| ValidationError::MalformedJson(e.to_string()))
}

/// Validate a single prediction body
pub fn parse_prediction_request(body: &Value) -> Result<PredictionRequest, ValidationError> {
    let fields = as_object(body)?;

    for name in REQUIRED_FIELDS {
        if present(fields, name).is_none() {
            return Err(ValidationError::MissingField(name));
        }
    }

    let route_id = route_id(fields)?;
    let hour = bounded(fields, "hour", 0, Some(23))?.unwrap_or_default() as u8;
    let day_of_week = bounded(fields, "day_of_week", 1, Some(7))?.unwrap_or_default() as u8;
    let vehicle_count = vehicle_count(fields)?.unwrap_or_default();

    Ok(PredictionRequest {
        route_id,
        hour,
        day_of_week,
        vehicle_count,
        is_weekend: flag(fields, "is_weekend")?,
        is_rush_hour: flag(fields, "is_rush_hour")?,
    })
}

/// Validate the optional body of an hourly sweep
pub fn parse_hourly_options(body: &Value) -> Result<HourlyOptions, ValidationError> {
    let fields = as_object(body)?;
    Ok(HourlyOptions {
        day_of_week: bounded(fields, "day_of_week", 1, Some(7))?.map(|v| v as u8),
        vehicle_count: vehicle_count(fields)?,
    })
}

/// Extract the `predictions` array of a batch body
pub fn batch_items(body: &Value) -> Result<&[Value], ValidationError> {
    body.get("predictions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or(ValidationError::MissingPredictions)
}

/// The caller's route_id when it is a string, for tagging failed batch items
pub fn raw_route_id(item: &Value) -> Option<String> {
    item.get("route_id").and_then(Value::as_str).map(str::to_string)
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ValidationError> {
    body.as_object().ok_or(ValidationError::NotAnObject)
}

/// A field counts as absent when missing or explicitly null
fn present<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    fields.get(name).filter(|v| !v.is_null())
}

fn route_id(fields: &Map<String, Value>) -> Result<String, ValidationError> {
    match present(fields, "route_id") {
        None => Err(ValidationError::MissingField("route_id")),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(ValidationError::invalid("route_id", "must not be empty")),
        Some(other) => Err(ValidationError::invalid(
            "route_id",
            format!("expected a string, got {}", kind(other)),
        )),
    }
}

fn bounded(
    fields: &Map<String, Value>,
    name: &'static str,
    min: i64,
    max: Option<i64>,
) -> Result<Option<i64>, ValidationError> {
    let Some(value) = present(fields, name) else {
        return Ok(None);
    };
    let n = coerce_integer(name, value)?;
    match max {
        Some(max) if n < min || n > max => Err(ValidationError::invalid(
            name,
            format!("must be between {} and {}, got {}", min, max, n),
        )),
        None if n < min => Err(ValidationError::invalid(
            name,
            format!("must be at least {}, got {}", min, n),
        )),
        _ => Ok(Some(n)),
    }
}

fn vehicle_count(fields: &Map<String, Value>) -> Result<Option<u32>, ValidationError> {
    bounded(fields, "vehicle_count", 0, None)?
        .map(|n| {
            u32::try_from(n).map_err(|_| {
                ValidationError::invalid("vehicle_count", format!("{} is out of range", n))
            })
        })
        .transpose()
}

fn flag(fields: &Map<String, Value>, name: &'static str) -> Result<Option<u8>, ValidationError> {
    let Some(value) = present(fields, name) else {
        return Ok(None);
    };
    match coerce_integer(name, value)? {
        0 => Ok(Some(0)),
        1 => Ok(Some(1)),
        n => Err(ValidationError::invalid(name, format!("must be 0 or 1, got {}", n))),
    }
}

/// Coerce a JSON value to an integer
pub fn coerce_integer(name: &'static str, value: &Value) -> Result<i64, ValidationError> {
    match value {
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(f) = n.as_f64().filter(|f| f.is_finite()) {
                let truncated = f.trunc();
                if truncated < i64::MIN as f64 || truncated > i64::MAX as f64 {
                    Err(ValidationError::invalid(name, format!("{} is out of range", n)))
                } else {
                    Ok(truncated as i64)
                }
            } else {
                Err(ValidationError::invalid(name, format!("{} is out of range", n)))
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
            ValidationError::invalid(name, format!("expected an integer, got {:?}", s))
        }),
        other => Err(ValidationError::invalid(
            name,
            format!("expected an integer, got {}", kind(other)),
        )),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
