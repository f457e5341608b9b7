//! Document traversal driven by [`Path`]s
//!
//! [`search`] is the read side: it expands wildcards and returns every
//! concrete location the path matches, silently skipping locations that do
//! not exist. [`find_mut`] is the write side: it hands every matched slot to
//! a continuation and can create missing intermediate containers on the way.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::{Path, Waypoint};
use serde_json::{Map, Value};
use thiserror::Error;

/// Traversal stepped into a value that cannot hold the next waypoint
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraversalError {
    #[error("Cannot apply waypoint '{waypoint}' to a {found} value at '{location}'")]
    NotAContainer {
        location: Path,
        waypoint: Waypoint,
        found: &'static str,
    },
    #[error("Index {index} at '{location}' is too far past the end of an array of length {len}")]
    IndexOutOfReach {
        location: Path,
        index: usize,
        len: usize,
    },
}

/// How many null slots creating traversal may pad an array with
pub const MAX_ARRAY_PADDING: usize = 1024;

/// A concrete location matched by a (possibly wildcard) path
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    pub location: Path,
    pub value: &'a Value,
}

/// Options for [`find_mut`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FindOptions {
    /// Create missing keys and intermediate containers. Object vs array is
    /// picked from the shape of the waypoint that needs the container.
    pub create: bool,
}

impl FindOptions {
    pub fn create() -> Self {
        Self { create: true }
    }
}

/// Name of a JSON value's kind, used in diagnostics
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn step<'a>(value: &'a Value, waypoint: &Waypoint) -> Option<&'a Value> {
    match (waypoint, value) {
        (Waypoint::Key(key), Value::Object(map)) => map.get(key),
        (Waypoint::Index(index), Value::Array(items)) => items.get(*index),
        (Waypoint::Index(index), Value::Object(map)) => map.get(&index.to_string()),
        _ => None,
    }
}

/// Value at a concrete path. Wildcard paths never resolve here; use [`search`].
pub fn get<'a>(doc: &'a Value, path: &Path) -> Option<&'a Value> {
    path.iter().try_fold(doc, |value, waypoint| step(value, waypoint))
}

/// Every location matching `path`, in document order
pub fn search<'a>(doc: &'a Value, path: &Path) -> Vec<Match<'a>> {
    let mut matches = Vec::new();
    let mut location = Vec::with_capacity(path.len());
    search_from(doc, path.waypoints(), &mut location, &mut matches);
    matches
}

fn search_from<'a>(
    value: &'a Value,
    rest: &[Waypoint],
    location: &mut Vec<Waypoint>,
    matches: &mut Vec<Match<'a>>,
) {
    let Some((head, tail)) = rest.split_first() else {
        matches.push(Match {
            location: Path::new(location.clone()),
            value,
        });
        return;
    };

    match (head, value) {
        (Waypoint::Wildcard, Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                location.push(Waypoint::Index(index));
                search_from(item, tail, location, matches);
                location.pop();
            }
        }
        (waypoint, container) => {
            if let Some(child) = step(container, waypoint) {
                location.push(waypoint.clone());
                search_from(child, tail, location, matches);
                location.pop();
            }
        }
    }
}

/// Walk `doc` along `path` and call `visit` on every matched slot.
///
/// Wildcards expand to one call per array element. Missing keys are skipped
/// unless `options.create` is set, in which case they are inserted as null
/// (and turned into containers when the path continues below them). Null
/// values on the way are skipped without `create`. Any other non-container
/// value in the way of a waypoint is a [`TraversalError`].
///
/// Returns the number of slots visited.
pub fn find_mut<E, F>(
    doc: &mut Value,
    path: &Path,
    options: FindOptions,
    mut visit: F,
) -> Result<usize, E>
where
    E: From<TraversalError>,
    F: FnMut(&Path, &mut Value) -> Result<(), E>,
{
    let mut count = 0;
    let mut location = Vec::with_capacity(path.len());
    find_from(
        doc,
        path.waypoints(),
        &mut location,
        options,
        &mut visit,
        &mut count,
    )?;
    Ok(count)
}

fn find_from<E, F>(
    value: &mut Value,
    rest: &[Waypoint],
    location: &mut Vec<Waypoint>,
    options: FindOptions,
    visit: &mut F,
    count: &mut usize,
) -> Result<(), E>
where
    E: From<TraversalError>,
    F: FnMut(&Path, &mut Value) -> Result<(), E>,
{
    let Some((head, tail)) = rest.split_first() else {
        *count += 1;
        return visit(&Path::new(location.clone()), value);
    };

    if options.create && value.is_null() {
        *value = if head.is_array_step() {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
    }

    match (head, value) {
        (_, Value::Null) => {}
        (Waypoint::Wildcard, Value::Array(items)) => {
            for (index, item) in items.iter_mut().enumerate() {
                location.push(Waypoint::Index(index));
                find_from(item, tail, location, options, visit, count)?;
                location.pop();
            }
        }
        (Waypoint::Index(index), Value::Array(items)) => {
            if options.create && items.len() <= *index {
                if *index - items.len() > MAX_ARRAY_PADDING {
                    return Err(TraversalError::IndexOutOfReach {
                        location: Path::new(location.clone()),
                        index: *index,
                        len: items.len(),
                    }
                    .into());
                }
                items.resize(*index + 1, Value::Null);
            }
            if let Some(child) = items.get_mut(*index) {
                location.push(Waypoint::Index(*index));
                find_from(child, tail, location, options, visit, count)?;
                location.pop();
            }
        }
        (waypoint @ (Waypoint::Key(_) | Waypoint::Index(_)), Value::Object(map)) => {
            let key = match waypoint {
                Waypoint::Index(index) => index.to_string(),
                other => other.to_string(),
            };
            let child = if options.create {
                Some(map.entry(key).or_insert(Value::Null))
            } else {
                map.get_mut(&key)
            };
            if let Some(child) = child {
                location.push(waypoint.clone());
                find_from(child, tail, location, options, visit, count)?;
                location.pop();
            }
        }
        (waypoint, other) => {
            return Err(TraversalError::NotAContainer {
                location: Path::new(location.clone()),
                waypoint: waypoint.clone(),
                found: kind_name(other),
            }
            .into());
        }
    }
    Ok(())
}

/// Write `new_value` into every slot matched by `path`, creating missing
/// containers. Returns the number of slots written.
pub fn set(doc: &mut Value, path: &Path, new_value: &Value) -> Result<usize, TraversalError> {
    find_mut(doc, path, FindOptions::create(), |_, slot| {
        *slot = new_value.clone();
        Ok::<(), TraversalError>(())
    })
}
