//! Structural comparison of paths
//!
//! Two paths share a common prefix up to their *differing base index*.
//! Past that point each side either addresses a single value (`one`) or
//! ranges over array elements (`many`). The relation decides which
//! operations can connect two fields, and the matchers below translate a
//! concrete instance of one path into the matching address of the other.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::path::{Path, Waypoint};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a path addresses one value or many beyond a shared prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    One,
    Many,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::One => write!(f, "one"),
            Relation::Many => write!(f, "many"),
        }
    }
}

/// True when no wildcard occurs in `path` at or after `from`
pub fn is_singular(path: &Path, from: usize) -> bool {
    path.is_concrete_from(from)
}

/// Index at which the path becomes singular when read from the right.
///
/// `a.*.*.c.d` gives 3, `a.b.c` gives 0 and `x.y.*` gives 3.
pub fn right_singular_index(path: &Path) -> usize {
    path.iter()
        .rposition(Waypoint::is_wildcard)
        .map_or(0, |i| i + 1)
}

/// Relation of each path beyond their differing base index
pub fn get_relation(a: &Path, b: &Path) -> (Relation, Relation) {
    let base = a.differing_base_index(b);
    let relation = |path: &Path| {
        if is_singular(path, base) {
            Relation::One
        } else {
            Relation::Many
        }
    };
    (relation(a), relation(b))
}

/// True when the two paths sit at the same array nesting level: the parts
/// left of their right-singular index are structurally equal.
pub fn are_fields_local(a: &Path, b: &Path) -> bool {
    let ai = right_singular_index(a);
    let bi = right_singular_index(b);
    ai == bi && a.slice(0..ai) == b.slice(0..bi)
}

/// Translates concrete instances of one path shape into addresses of another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatcher {
    target: Path,
    slots: Vec<(usize, usize)>,
}

impl PathMatcher {
    /// Address for `instance`: the target path with each mapped slot filled
    /// from the instance's waypoint at the source position.
    pub fn apply(&self, instance: &Path) -> Path {
        self.slots
            .iter()
            .fold(self.target.clone(), |path, (from, to)| match instance.get(*from) {
                Some(waypoint) => path.with_waypoint(*to, waypoint.clone()),
                None => path,
            })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

/// Matcher carrying the concrete indices found in `a`'s wildcard slots
/// before the shared base index over to `b`.
///
/// With `a = foo.*.bar` and `b = foo.*.baz`, the instance `foo.3.bar`
/// maps to `foo.3.baz`.
pub fn create_one_to_one_matcher(a: &Path, b: &Path) -> PathMatcher {
    let base = a.differing_base_index(b);
    let slots = a
        .iter()
        .take(base)
        .enumerate()
        .filter(|(_, waypoint)| waypoint.is_wildcard())
        .map(|(i, _)| (i, i))
        .collect();
    PathMatcher {
        target: b.clone(),
        slots,
    }
}

/// Matcher pairing the k-th wildcard of `a` with the k-th wildcard of `b`.
/// `None` when the paths have different wildcard counts.
pub fn create_single_path_matcher(a: &Path, b: &Path) -> Option<PathMatcher> {
    let wildcards = |path: &Path| -> Vec<usize> {
        path.iter()
            .enumerate()
            .filter(|(_, waypoint)| waypoint.is_wildcard())
            .map(|(i, _)| i)
            .collect()
    };
    let from = wildcards(a);
    let to = wildcards(b);
    if from.len() != to.len() {
        return None;
    }
    Some(PathMatcher {
        target: b.clone(),
        slots: from.into_iter().zip(to).collect(),
    })
}
