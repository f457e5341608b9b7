//! Type inference from sampled values
//!
//! A [`TypeTracker`] watches every value seen at one generalized path and
//! keeps a running base kind plus a set of refinement flags. Flags start out
//! possible and are switched off by the first value that rules them out; they
//! never come back. A value whose base kind disagrees with the running kind
//! coerces the tracker to plain string for good and is reported once through
//! the caller's conflict callback.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::field::FieldType;
use crate::path::Path;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::OnceLock;

/// Longest value prefix quoted in conflict messages
const MESSAGE_VALUE_LENGTH: usize = 20;

static DATE_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn date_patterns() -> &'static [Regex] {
    DATE_PATTERNS.get_or_init(|| {
        [
            r"^(0?[1-9]|1[0-2])/(0?[1-9]|[12][0-9]|3[01])/[0-9]{4}$",
            r"^[0-9]{4}-[01][0-9]-[0-3][0-9]$",
            r"^[0-9]{4}-[01][0-9]-[0-3][0-9][ T]?[0-2][0-9]:?[0-5][0-9]:?[0-9]{2}(\.[0-9]{3,6}|[-+]?[0-9]{2}:[0-9]{2})?Z?$",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("date pattern is valid"))
        .collect()
    })
}

/// True for the textual date shapes the tracker recognizes
pub fn looks_like_date(text: &str) -> bool {
    date_patterns().iter().any(|pattern| pattern.is_match(text))
}

fn is_geo_object(map: &Map<String, Value>) -> bool {
    map.len() == 2 && map.contains_key("lat") && map.contains_key("lon")
}

/// True for objects (or JSON object text) holding exactly `lat` and `lon`
pub fn looks_like_geo_point(value: &Value) -> bool {
    match value {
        Value::Object(map) => is_geo_object(map),
        Value::String(text) => matches!(
            serde_json::from_str::<Value>(text),
            Ok(Value::Object(map)) if is_geo_object(&map)
        ),
        _ => false,
    }
}

/// Base kind of a JSON value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl SimpleKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => SimpleKind::Null,
            Value::Bool(_) => SimpleKind::Boolean,
            Value::Number(_) => SimpleKind::Number,
            Value::String(_) => SimpleKind::String,
            Value::Array(_) => SimpleKind::Array,
            Value::Object(_) => SimpleKind::Object,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SimpleKind::Null => "null",
            SimpleKind::Boolean => "boolean",
            SimpleKind::Number => "number",
            SimpleKind::String => "string",
            SimpleKind::Array => "array",
            SimpleKind::Object => "object",
        }
    }
}

impl fmt::Display for SimpleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two values of different base kinds seen at the same path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeConflict {
    pub path: Path,
    /// Kind of the value that caused the conflict
    pub incoming: SimpleKind,
    /// Kind established by earlier values
    pub established: SimpleKind,
    pub incoming_value: String,
    pub previous_value: String,
}

fn quote(value: &str) -> String {
    if value.chars().count() > MESSAGE_VALUE_LENGTH {
        let cut: String = value.chars().take(MESSAGE_VALUE_LENGTH).collect();
        format!("\"{}...\"", cut)
    } else {
        format!("\"{}\"", value)
    }
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for TypeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Conflict between type '{}' and type '{}' from values {} and {}",
            self.incoming,
            self.established,
            quote(&self.incoming_value),
            quote(&self.previous_value)
        )
    }
}

/// Accumulates values seen at one path and guesses the best-fit type
#[derive(Debug, Clone)]
pub struct TypeTracker {
    path: Path,
    interpret_strings: bool,
    values_seen: usize,
    last_value: Option<Value>,
    kind: SimpleKind,
    coerced: bool,
    strings_checked: bool,
    numbers_checked: bool,
    string_numbers_checked: bool,
    objects_checked: bool,
    could_be_int: bool,
    could_be_date: bool,
    could_be_geo: bool,
    could_be_string_number: bool,
    could_be_string_integer: bool,
    could_be_string_boolean: bool,
}

impl TypeTracker {
    /// With `interpret_strings`, string-encoded numbers and booleans refine
    /// the inferred type.
    pub fn new(path: Path, interpret_strings: bool) -> Self {
        Self {
            path,
            interpret_strings,
            values_seen: 0,
            last_value: None,
            kind: SimpleKind::Null,
            coerced: false,
            strings_checked: false,
            numbers_checked: false,
            string_numbers_checked: false,
            objects_checked: false,
            could_be_int: true,
            could_be_date: true,
            could_be_geo: true,
            could_be_string_number: true,
            could_be_string_integer: true,
            could_be_string_boolean: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn values_seen(&self) -> usize {
        self.values_seen
    }

    pub fn was_coerced(&self) -> bool {
        self.coerced
    }

    /// Record a value without listening for conflicts
    pub fn observe(&mut self, value: &Value) {
        self.push(value, &mut |_| {});
    }

    /// Record a value; `on_conflict` hears about the first kind clash
    pub fn push(&mut self, value: &Value, on_conflict: &mut dyn FnMut(&TypeConflict)) {
        let kind = self.merge_kind(value, on_conflict);
        if !self.coerced {
            match value {
                Value::Number(n) => self.check_number(n),
                Value::String(text) => self.check_string(text),
                Value::Object(map) => self.check_object(map),
                _ => {}
            }
        }
        self.kind = kind;
        self.last_value = Some(value.clone());
        self.values_seen += 1;
    }

    fn merge_kind(&mut self, value: &Value, on_conflict: &mut dyn FnMut(&TypeConflict)) -> SimpleKind {
        let incoming = SimpleKind::of(value);
        if self.coerced {
            return SimpleKind::String;
        }
        if incoming == SimpleKind::Null {
            return self.kind;
        }
        if incoming == self.kind || self.kind == SimpleKind::Null {
            return incoming;
        }
        on_conflict(&TypeConflict {
            path: self.path.clone(),
            incoming,
            established: self.kind,
            incoming_value: message_text(value),
            previous_value: self.last_value.as_ref().map(message_text).unwrap_or_default(),
        });
        self.coerced = true;
        SimpleKind::String
    }

    fn check_number(&mut self, n: &serde_json::Number) {
        self.numbers_checked = true;
        if self.could_be_int {
            self.could_be_int = n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0);
        }
    }

    fn check_object(&mut self, map: &Map<String, Value>) {
        self.objects_checked = true;
        if self.could_be_geo {
            self.could_be_geo = is_geo_object(map);
        }
    }

    fn check_string(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.strings_checked = true;
        if self.could_be_date {
            self.could_be_date = looks_like_date(text);
        }
        if self.could_be_geo {
            self.could_be_geo = looks_like_geo_point(&Value::String(text.to_string()));
        }
        if self.interpret_strings {
            if self.could_be_string_number {
                match text.trim().parse::<f64>() {
                    Ok(n) if n.is_finite() => {
                        if self.could_be_string_integer {
                            self.string_numbers_checked = true;
                            self.could_be_string_integer = n.fract() == 0.0;
                        }
                    }
                    _ => self.could_be_string_number = false,
                }
            }
            if self.could_be_string_boolean {
                self.could_be_string_boolean = matches!(text, "true" | "false");
            }
        }
    }

    /// Most specific type every value seen so far fits
    pub fn field_type(&self) -> FieldType {
        if self.coerced {
            return FieldType::String;
        }
        match self.kind {
            SimpleKind::Array => FieldType::Array,
            SimpleKind::Object if self.objects_checked && self.could_be_geo => FieldType::GeoPoint,
            SimpleKind::Object => FieldType::Object,
            SimpleKind::Boolean => FieldType::Boolean,
            SimpleKind::Number if self.numbers_checked && self.could_be_int => FieldType::Integer,
            SimpleKind::Number => FieldType::Number,
            SimpleKind::String if !self.strings_checked => FieldType::String,
            SimpleKind::String if self.could_be_date => FieldType::Date,
            SimpleKind::String if self.could_be_geo => FieldType::GeoPoint,
            SimpleKind::String if self.interpret_strings && self.could_be_string_number => {
                if self.string_numbers_checked && self.could_be_string_integer {
                    FieldType::Integer
                } else {
                    FieldType::Number
                }
            }
            SimpleKind::String if self.interpret_strings && self.could_be_string_boolean => FieldType::Boolean,
            SimpleKind::String | SimpleKind::Null => FieldType::String,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tracker(values: &[Value]) -> TypeTracker {
        let mut tracker = TypeTracker::new(Path::from("f"), false);
        for value in values {
            tracker.observe(value);
        }
        tracker
    }

    #[test]
    fn test_conflict_coerces_to_string_once() {
        let mut conflicts = Vec::new();
        let mut tracker = TypeTracker::new(Path::from("f"), false);
        for value in [json!(5), json!("hi"), json!(7), json!(true)] {
            tracker.push(&value, &mut |conflict| conflicts.push(conflict.to_string()));
        }
        assert_eq!(tracker.field_type(), FieldType::String);
        assert_eq!(
            conflicts,
            vec!["Conflict between type 'string' and type 'number' from values \"hi\" and \"5\"".to_string()]
        );
        assert!(tracker.was_coerced());
    }

    #[test]
    fn test_numeric_refinement() {
        assert_eq!(tracker(&[json!(1), json!(2)]).field_type(), FieldType::Integer);
        assert_eq!(tracker(&[json!(1), json!(2.5)]).field_type(), FieldType::Number);
        assert_eq!(tracker(&[json!(2.5), json!(1)]).field_type(), FieldType::Number);
        assert_eq!(tracker(&[json!(3.0)]).field_type(), FieldType::Integer);
    }

    #[test]
    fn test_nulls_do_not_decide() {
        assert_eq!(tracker(&[]).field_type(), FieldType::String);
        assert_eq!(tracker(&[json!(null)]).field_type(), FieldType::String);
        assert_eq!(tracker(&[json!(null), json!(true), json!(null)]).field_type(), FieldType::Boolean);
    }

    #[test]
    fn test_dates_and_geo_points() {
        assert_eq!(
            tracker(&[json!("2018-03-04"), json!("3/14/2019"), json!("2019-01-02T10:20:30Z")]).field_type(),
            FieldType::Date
        );
        assert_eq!(tracker(&[json!("2018-03-04"), json!("later")]).field_type(), FieldType::String);
        assert_eq!(tracker(&[json!({"lat": 1.5, "lon": 2})]).field_type(), FieldType::GeoPoint);
        assert_eq!(tracker(&[json!("{\"lat\": 1, \"lon\": 2}")]).field_type(), FieldType::GeoPoint);
        assert_eq!(tracker(&[json!({"lat": 1, "lon": 2, "alt": 3})]).field_type(), FieldType::Object);
    }

    #[test]
    fn test_interpreted_strings() {
        let mut numbers = TypeTracker::new(Path::from("f"), true);
        numbers.observe(&json!("12"));
        numbers.observe(&json!(" 40 "));
        assert_eq!(numbers.field_type(), FieldType::Integer);
        numbers.observe(&json!("1.5"));
        assert_eq!(numbers.field_type(), FieldType::Number);

        let mut flags = TypeTracker::new(Path::from("f"), true);
        flags.observe(&json!("true"));
        flags.observe(&json!("false"));
        assert_eq!(flags.field_type(), FieldType::Boolean);

        // without interpretation the same values stay strings
        assert_eq!(tracker(&[json!("12")]).field_type(), FieldType::String);
    }

    #[test]
    fn test_refinement_is_never_regained() {
        let mut tracker = TypeTracker::new(Path::from("f"), true);
        tracker.observe(&json!("x"));
        tracker.observe(&json!("12"));
        assert_eq!(tracker.field_type(), FieldType::String);
        assert_eq!(tracker.values_seen(), 2);
    }

    #[test]
    fn test_long_values_are_truncated_in_messages() {
        let conflict = TypeConflict {
            path: Path::from("f"),
            incoming: SimpleKind::String,
            established: SimpleKind::Array,
            incoming_value: "abcdefghijklmnopqrstuvwxyz".to_string(),
            previous_value: "[]".to_string(),
        };
        assert_eq!(
            conflict.to_string(),
            "Conflict between type 'string' and type 'array' from values \"abcdefghijklmnopqrst...\" and \"[]\""
        );
    }
}
