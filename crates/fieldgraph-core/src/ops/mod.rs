//! Transform operations
//!
//! The operation set is a closed enum: each variant carries its own options
//! record and is dispatched by an exhaustive match. Operations act on the
//! working document in *input* coordinates; mapping values to their output
//! addresses happens once, after the whole pipeline has run.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

mod cast;
mod duplicate;
mod split;

pub use cast::{cast_value, parse_date};

use crate::error::ValidationError;
use crate::field::FieldType;
use crate::path::{Path, TraversalError};
use crate::topology::Relation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Options of a retype operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastOptions {
    pub to: FieldType,
    /// strftime-style output format, only meaningful for dates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// How a split cuts its input string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Delimiter {
    Text(String),
    Regex(String),
    /// Cut at a character position
    Index(usize),
}

/// Options of a split operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitOptions {
    pub delimiter: Delimiter,
    /// Output paths of the fields receiving the pieces, in order
    pub new_field_paths: Vec<Path>,
}

/// Options of a duplicate operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateOptions {
    pub new_field_path: Path,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    Cast(CastOptions),
    Split(SplitOptions),
    Duplicate(DuplicateOptions),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Cast,
    Split,
    Duplicate,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Cast => "cast",
            OperationKind::Split => "split",
            OperationKind::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one operation while it runs over a document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error("cannot convert {found} {value} at '{location}' to {to}: {reason}")]
    Conversion {
        location: Path,
        found: &'static str,
        value: String,
        to: FieldType,
        reason: String,
    },

    #[error("expected a string at '{location}', found {found}")]
    NotAString { location: Path, found: &'static str },

    #[error("'{from}' and '{to}' do not share a wildcard structure")]
    Shape { from: Path, to: Path },

    #[error("{0}-to-{1} copies are not supported")]
    Relation(Relation, Relation),

    #[error("invalid regular expression '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    #[error(transparent)]
    Traversal(#[from] TraversalError),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Cast(_) => OperationKind::Cast,
            Operation::Split(_) => OperationKind::Split,
            Operation::Duplicate(_) => OperationKind::Duplicate,
        }
    }

    /// Output paths of the synthetic fields this operation asks for
    pub fn requested_paths(&self) -> Vec<Path> {
        match self {
            Operation::Cast(_) => Vec::new(),
            Operation::Split(options) => options.new_field_paths.clone(),
            Operation::Duplicate(options) => vec![options.new_field_path.clone()],
        }
    }

    /// Checks that depend only on the options and the number of input fields
    pub(crate) fn validate_options(&self, field_count: usize) -> Result<(), ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidOptions {
            operation: self.kind(),
            reason: reason.to_string(),
        };

        match self {
            Operation::Cast(options) => {
                if field_count == 0 {
                    return Err(invalid("at least one field is required"));
                }
                if let Some(format) = &options.format {
                    if options.to != FieldType::Date {
                        return Err(invalid("a format is only accepted for date casts"));
                    }
                    if !cast::is_valid_format(format) {
                        return Err(invalid("the date format is not a valid strftime pattern"));
                    }
                }
            }
            Operation::Split(options) => {
                if field_count != 1 {
                    return Err(invalid("split takes exactly one field"));
                }
                if options.new_field_paths.is_empty() {
                    return Err(invalid("at least one new field path is required"));
                }
                if options.new_field_paths.iter().any(Path::is_root) {
                    return Err(invalid("new field paths must not be the root"));
                }
                match &options.delimiter {
                    Delimiter::Text(text) if text.is_empty() => {
                        return Err(invalid("the text delimiter must not be empty"));
                    }
                    Delimiter::Regex(pattern) => {
                        if let Err(err) = regex::Regex::new(pattern) {
                            return Err(invalid(&format!("invalid regular expression: {}", err)));
                        }
                    }
                    _ => {}
                }
            }
            Operation::Duplicate(options) => {
                if field_count != 1 {
                    return Err(invalid("duplicate takes exactly one field"));
                }
                if options.new_field_path.is_root() {
                    return Err(invalid("the new field path must not be the root"));
                }
            }
        }
        Ok(())
    }

    /// Run the operation. `inputs` are the input paths of the consumed
    /// fields and `outputs` those of the produced fields, both in the order
    /// the node records them.
    pub(crate) fn apply(
        &self,
        inputs: &[Path],
        outputs: &[Path],
        doc: &mut Value,
    ) -> Result<(), OperationError> {
        match self {
            Operation::Cast(options) => cast::apply(options, inputs, doc),
            Operation::Split(options) => match inputs.first() {
                Some(source) => split::apply(&options.delimiter, source, outputs, doc),
                None => Ok(()),
            },
            Operation::Duplicate(_) => match (inputs.first(), outputs.first()) {
                (Some(source), Some(target)) => duplicate::apply(source, target, doc),
                _ => Ok(()),
            },
        }
    }
}

/// Short rendering of a value for diagnostics
pub(crate) fn preview(value: &Value) -> String {
    const LIMIT: usize = 40;
    let text = value.to_string();
    if text.chars().count() > LIMIT {
        let cut: String = text.chars().take(LIMIT).collect();
        format!("{}...", cut)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_shape() {
        let op = Operation::Split(SplitOptions {
            delimiter: Delimiter::Text(" ".to_string()),
            new_field_paths: vec![Path::from("first"), Path::from("last")],
        });
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(
            json,
            json!({
                "kind": "split",
                "delimiter": {"type": "text", "value": " "},
                "new_field_paths": [["first"], ["last"]]
            })
        );
        let back: Operation = serde_json::from_value(json).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn test_option_validation() {
        let split = Operation::Split(SplitOptions {
            delimiter: Delimiter::Regex("(".to_string()),
            new_field_paths: vec![Path::from("a")],
        });
        assert!(matches!(
            split.validate_options(1),
            Err(ValidationError::InvalidOptions { operation: OperationKind::Split, .. })
        ));

        let cast = Operation::Cast(CastOptions {
            to: FieldType::Number,
            format: Some("%Y".to_string()),
        });
        assert!(cast.validate_options(1).is_err());

        let dup = Operation::Duplicate(DuplicateOptions {
            new_field_path: Path::from("copy"),
        });
        assert!(dup.validate_options(2).is_err());
        assert!(dup.validate_options(1).is_ok());
    }

    #[test]
    fn test_preview_truncates() {
        let long = json!("x".repeat(100));
        assert!(preview(&long).ends_with("..."));
        assert_eq!(preview(&json!(5)), "5");
    }
}
