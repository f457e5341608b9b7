//! Retype operation
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::{preview, CastOptions, OperationError};
use crate::field::FieldType;
use crate::path::{find_mut, kind_name, FindOptions, Path};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use std::fmt::Write;

pub(super) fn apply(options: &CastOptions, inputs: &[Path], doc: &mut Value) -> Result<(), OperationError> {
    for input in inputs {
        find_mut(doc, input, FindOptions::default(), |location: &Path, slot: &mut Value| -> Result<(), OperationError> {
            if slot.is_null() {
                return Ok(());
            }
            let cast = cast_value(slot, options.to, options.format.as_deref()).map_err(|reason| {
                OperationError::Conversion {
                    location: location.clone(),
                    found: kind_name(slot),
                    value: preview(slot),
                    to: options.to,
                    reason,
                }
            })?;
            *slot = cast;
            Ok(())
        })?;
    }
    Ok(())
}

pub(super) fn is_valid_format(format: &str) -> bool {
    StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

/// Parse the date shapes the engine recognizes: RFC 3339, ISO date-time
/// without offset (taken as UTC), `YYYY-MM-DD` and `MM/DD/YYYY`.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(parsed) = NaiveDate::parse_from_str(text, format) {
            return parsed.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

fn format_date(date: DateTime<Utc>, format: Option<&str>) -> Result<String, String> {
    match format {
        None => Ok(date.to_rfc3339_opts(SecondsFormat::Millis, true)),
        Some(format) => {
            let mut out = String::new();
            write!(out, "{}", date.format(format)).map_err(|_| format!("invalid date format '{}'", format))?;
            Ok(out)
        }
    }
}

fn number_from_f64(n: f64) -> Result<Value, String> {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| format!("{} is not a finite number", n))
}

fn parse_number(text: &str) -> Result<Value, String> {
    let text = text.trim();
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Value::from(n));
    }
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => number_from_f64(n),
        _ => Err(format!("'{}' is not a number", text)),
    }
}

fn truncate_to_integer(n: f64) -> Result<Value, String> {
    if n.is_finite() && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Ok(Value::from(n.trunc() as i64))
    } else {
        Err(format!("{} does not fit an integer", n))
    }
}

/// Convert a single non-null value to `to`
pub fn cast_value(value: &Value, to: FieldType, format: Option<&str>) -> Result<Value, String> {
    match to {
        FieldType::String => Ok(match value {
            Value::String(s) => Value::String(s.clone()),
            other => Value::String(other.to_string()),
        }),
        FieldType::Number => match value {
            Value::Number(_) => Ok(value.clone()),
            Value::Bool(b) => Ok(Value::from(u8::from(*b))),
            Value::String(s) => parse_number(s),
            _ => Err("only numbers, booleans and numeric strings become numbers".to_string()),
        },
        FieldType::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            Value::Number(n) => truncate_to_integer(n.as_f64().unwrap_or(f64::NAN)),
            Value::Bool(b) => Ok(Value::from(u8::from(*b))),
            Value::String(s) => match parse_number(s)? {
                Value::Number(n) if n.is_i64() => Ok(Value::Number(n)),
                Value::Number(n) => truncate_to_integer(n.as_f64().unwrap_or(f64::NAN)),
                _ => Err(format!("'{}' is not a number", s)),
            },
            _ => Err("only numbers, booleans and numeric strings become integers".to_string()),
        },
        FieldType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|n| n != 0.0))),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(format!("'{}' is not a boolean", s)),
            },
            _ => Err("only booleans, numbers and 'true'/'false' become booleans".to_string()),
        },
        FieldType::Date => {
            let date = match value {
                Value::String(s) => parse_date(s).ok_or_else(|| format!("'{}' is not a recognized date", s))?,
                Value::Number(n) => n
                    .as_i64()
                    .and_then(DateTime::from_timestamp_millis)
                    .ok_or_else(|| format!("{} is not a millisecond timestamp", n))?,
                _ => return Err("only strings and timestamps become dates".to_string()),
            };
            format_date(date, format).map(Value::String)
        }
        FieldType::Array => Ok(match value {
            Value::Array(_) => value.clone(),
            other => Value::Array(vec![other.clone()]),
        }),
        FieldType::Object => match value {
            Value::Object(_) => Ok(value.clone()),
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(parsed @ Value::Object(_)) => Ok(parsed),
                _ => Err("the text is not a JSON object".to_string()),
            },
            _ => Err("only objects and JSON object text become objects".to_string()),
        },
        FieldType::GeoPoint => match value {
            Value::Object(map) if map.contains_key("lat") && map.contains_key("lon") => {
                let mut point = Map::new();
                point.insert("lat".to_string(), map["lat"].clone());
                point.insert("lon".to_string(), map["lon"].clone());
                Ok(Value::Object(point))
            }
            Value::String(s) => {
                let mut parts = s.split(',').map(|part| part.trim().parse::<f64>());
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(Ok(lat)), Some(Ok(lon)), None) => Ok(json!({"lat": lat, "lon": lon})),
                    _ => Err(format!("'{}' is not a 'lat,lon' pair", s)),
                }
            }
            _ => Err("only lat/lon objects and 'lat,lon' text become geo points".to_string()),
        },
    }
}
