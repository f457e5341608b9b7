//! Duplicate operation
//!
//! A one-to-one copy writes each source instance to the matching instance
//! of the target. A many-to-one copy gathers every source value under one
//! target instance into an array.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::OperationError;
use crate::path::{search, set, Path};
use crate::topology::{create_one_to_one_matcher, get_relation, Relation};
use serde_json::Value;

pub(super) fn apply(source: &Path, target: &Path, doc: &mut Value) -> Result<(), OperationError> {
    let matcher = create_one_to_one_matcher(source, target);
    let found: Vec<(Path, Value)> = search(doc, source)
        .into_iter()
        .map(|m| (matcher.apply(&m.location), m.value.clone()))
        .collect();

    match get_relation(source, target) {
        (Relation::One, Relation::One) => {
            for (location, value) in found {
                set(doc, &location, &value)?;
            }
        }
        (Relation::Many, Relation::One) => {
            let mut groups: Vec<(Path, Vec<Value>)> = Vec::new();
            for (location, value) in found {
                match groups.iter_mut().find(|(existing, _)| *existing == location) {
                    Some((_, values)) => values.push(value),
                    None => groups.push((location, vec![value])),
                }
            }
            for (location, values) in groups {
                set(doc, &location, &Value::Array(values))?;
            }
        }
        (from, to) => return Err(OperationError::Relation(from, to)),
    }
    Ok(())
}
