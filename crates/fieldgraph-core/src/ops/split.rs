//! Split operation
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::{Delimiter, OperationError};
use crate::path::{kind_name, search, set, Path};
use crate::topology::{create_single_path_matcher, PathMatcher};
use regex::Regex;
use serde_json::Value;

enum Splitter<'a> {
    Text(&'a str),
    Regex(Regex),
    Index(usize),
}

impl<'a> Splitter<'a> {
    fn new(delimiter: &'a Delimiter) -> Result<Self, OperationError> {
        Ok(match delimiter {
            Delimiter::Text(text) => Splitter::Text(text),
            Delimiter::Regex(pattern) => Splitter::Regex(Regex::new(pattern).map_err(|err| {
                OperationError::Pattern {
                    pattern: pattern.clone(),
                    reason: err.to_string(),
                }
            })?),
            Delimiter::Index(index) => Splitter::Index(*index),
        })
    }

    /// At most `pieces` parts; the last part keeps the remainder
    fn split(&self, text: &str, pieces: usize) -> Vec<String> {
        match self {
            Splitter::Text(delimiter) => text.splitn(pieces, delimiter).map(str::to_string).collect(),
            Splitter::Regex(regex) => regex.splitn(text, pieces).map(str::to_string).collect(),
            Splitter::Index(index) => {
                let at = text
                    .char_indices()
                    .nth(*index)
                    .map_or(text.len(), |(offset, _)| offset);
                let (head, tail) = text.split_at(at);
                vec![head.to_string(), tail.to_string()]
                    .into_iter()
                    .take(pieces)
                    .collect()
            }
        }
    }
}

pub(super) fn apply(
    delimiter: &Delimiter,
    source: &Path,
    targets: &[Path],
    doc: &mut Value,
) -> Result<(), OperationError> {
    let splitter = Splitter::new(delimiter)?;
    let matchers = targets
        .iter()
        .map(|target| {
            create_single_path_matcher(source, target).ok_or_else(|| OperationError::Shape {
                from: source.clone(),
                to: target.clone(),
            })
        })
        .collect::<Result<Vec<PathMatcher>, _>>()?;

    let found: Vec<(Path, Value)> = search(doc, source)
        .into_iter()
        .map(|m| (m.location, m.value.clone()))
        .collect();

    for (location, value) in found {
        let text = match &value {
            Value::Null => continue,
            Value::String(text) => text,
            other => {
                return Err(OperationError::NotAString {
                    location,
                    found: kind_name(other),
                })
            }
        };
        for (matcher, piece) in matchers.iter().zip(splitter.split(text, matchers.len())) {
            set(doc, &matcher.apply(&location), &Value::String(piece))?;
        }
    }
    Ok(())
}
