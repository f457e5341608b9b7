//! Wildcard-capable document addressing
//!
//! A [`Path`] is an ordered list of [`Waypoint`]s. Object keys and concrete
//! array indices address exactly one location; a wildcard ranges over every
//! element of the array found at its position. Paths are immutable values:
//! every derivation (`parent`, `join`, `slice`, `replace_prefix`, ...) returns
//! a new path.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod traverse;


use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

pub use traverse::{find_mut, get, kind_name, search, set, FindOptions, Match, TraversalError};

/// Serialized marker for the wildcard waypoint.
const WILDCARD_MARKER: i64 = -1;

/// One step of a [`Path`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Waypoint {
    /// Object key
    Key(String),
    /// Concrete array index
    Index(usize),
    /// Every element of an array
    Wildcard,
}

impl Waypoint {
    /// Build a key waypoint
    pub fn key(name: impl Into<String>) -> Self {
        Waypoint::Key(name.into())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Waypoint::Wildcard)
    }

    /// True for waypoints that step into an array (index or wildcard)
    pub fn is_array_step(&self) -> bool {
        matches!(self, Waypoint::Index(_) | Waypoint::Wildcard)
    }

    /// True when `self` (a pattern waypoint) covers `concrete`
    pub fn covers(&self, concrete: &Waypoint) -> bool {
        match (self, concrete) {
            (Waypoint::Wildcard, Waypoint::Index(_)) => true,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Waypoint::Key(key) => write!(f, "{}", key),
            Waypoint::Index(index) => write!(f, "{}", index),
            Waypoint::Wildcard => write!(f, "*"),
        }
    }
}

impl From<&str> for Waypoint {
    fn from(segment: &str) -> Self {
        if segment == "*" {
            Waypoint::Wildcard
        } else if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            segment
                .parse()
                .map(Waypoint::Index)
                .unwrap_or_else(|_| Waypoint::key(segment))
        } else {
            Waypoint::key(segment)
        }
    }
}

impl From<usize> for Waypoint {
    fn from(index: usize) -> Self {
        Waypoint::Index(index)
    }
}

impl Serialize for Waypoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Waypoint::Key(key) => serializer.serialize_str(key),
            Waypoint::Index(index) => serializer.serialize_u64(*index as u64),
            Waypoint::Wildcard => serializer.serialize_i64(WILDCARD_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for Waypoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Key(String),
            Number(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Key(key) => Ok(Waypoint::Key(key)),
            Raw::Number(WILDCARD_MARKER) => Ok(Waypoint::Wildcard),
            Raw::Number(n) if n >= 0 => Ok(Waypoint::Index(n as usize)),
            Raw::Number(n) => Err(de::Error::custom(format!(
                "invalid waypoint {}: only -1 may be negative",
                n
            ))),
        }
    }
}

/// Ordered sequence of waypoints. The empty path addresses the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Waypoint>);

impl Path {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Path(waypoints)
    }

    /// The document root
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Waypoint> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.0.get(index)
    }

    pub fn last(&self) -> Option<&Waypoint> {
        self.0.last()
    }

    /// Path with the last waypoint removed; `None` for the root
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            None
        } else {
            Some(Path(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// New path with `waypoint` appended
    pub fn child(&self, waypoint: impl Into<Waypoint>) -> Path {
        let mut waypoints = self.0.clone();
        waypoints.push(waypoint.into());
        Path(waypoints)
    }

    /// New path made of `self` followed by `other`
    pub fn join(&self, other: &Path) -> Path {
        let mut waypoints = self.0.clone();
        waypoints.extend(other.0.iter().cloned());
        Path(waypoints)
    }

    /// Sub-path covering `range`, clamped to the path length
    pub fn slice(&self, range: Range<usize>) -> Path {
        let end = range.end.min(self.0.len());
        let start = range.start.min(end);
        Path(self.0[start..end].to_vec())
    }

    /// New path with the waypoint at `index` replaced
    pub fn with_waypoint(&self, index: usize, waypoint: Waypoint) -> Path {
        let mut waypoints = self.0.clone();
        if let Some(slot) = waypoints.get_mut(index) {
            *slot = waypoint;
        }
        Path(waypoints)
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// `starts_with` excluding equality
    pub fn is_strictly_under(&self, ancestor: &Path) -> bool {
        self.0.len() > ancestor.0.len() && self.starts_with(ancestor)
    }

    /// Replace the leading `old` prefix with `new`; `None` if `self` does not start with `old`
    pub fn replace_prefix(&self, old: &Path, new: &Path) -> Option<Path> {
        if !self.starts_with(old) {
            return None;
        }
        let mut waypoints = new.0.clone();
        waypoints.extend(self.0[old.0.len()..].iter().cloned());
        Some(Path(waypoints))
    }

    /// True when no wildcard occurs at or after `from`
    pub fn is_concrete_from(&self, from: usize) -> bool {
        self.0.iter().skip(from).all(|w| !w.is_wildcard())
    }

    pub fn is_concrete(&self) -> bool {
        self.is_concrete_from(0)
    }

    pub fn wildcard_count(&self) -> usize {
        self.0.iter().filter(|w| w.is_wildcard()).count()
    }

    /// Index of the first waypoint at which the two paths differ
    /// (the shorter length when one is a prefix of the other).
    pub fn differing_base_index(&self, other: &Path) -> usize {
        self.0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Replace every concrete index with a wildcard
    pub fn to_pattern(&self) -> Path {
        Path(
            self.0
                .iter()
                .map(|w| match w {
                    Waypoint::Index(_) => Waypoint::Wildcard,
                    other => other.clone(),
                })
                .collect(),
        )
    }

    /// True when `concrete` is one instance of this pattern: same length,
    /// and every waypoint is equal or a wildcard covering an index.
    pub fn covers(&self, concrete: &Path) -> bool {
        self.0.len() == concrete.0.len()
            && self.0.iter().zip(concrete.0.iter()).all(|(p, c)| p.covers(c))
    }

    /// Rewrite `requested` so that concrete indices standing where this
    /// pattern has wildcards become wildcards again, as long as the two
    /// paths agree up to that point.
    ///
    /// Renaming one instance `foo.3.cool` of the pattern `foo.*.bar`
    /// yields `foo.*.cool`.
    pub fn generalize(&self, requested: &Path) -> Path {
        let mut result = Vec::with_capacity(requested.len());
        let mut aligned = true;
        for (i, waypoint) in requested.iter().enumerate() {
            let pattern = self.0.get(i);
            let next = match (aligned, pattern, waypoint) {
                (true, Some(Waypoint::Wildcard), Waypoint::Index(_)) => Waypoint::Wildcard,
                _ => waypoint.clone(),
            };
            aligned = aligned && pattern == Some(&next);
            result.push(next);
        }
        Path(result)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, waypoint) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", waypoint)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = Infallible;

    /// Parse the dotted form: `*` is a wildcard, all-digit segments are
    /// indices, anything else is a key. The empty string is the root.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Path::root());
        }
        Ok(Path(s.split('.').map(Waypoint::from).collect()))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(path) => path,
            Err(never) => match never {},
        }
    }
}

impl From<Vec<Waypoint>> for Path {
    fn from(waypoints: Vec<Waypoint>) -> Self {
        Path(waypoints)
    }
}

impl FromIterator<Waypoint> for Path {
    fn from_iter<I: IntoIterator<Item = Waypoint>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Waypoint;
    type IntoIter = std::slice::Iter<'a, Waypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
