//! Building engines from sample documents
//!
//! Every sampled document is walked down to its leaves. Array elements are
//! folded onto a wildcard waypoint, so all elements of an array feed the
//! same [`TypeTracker`]. Once sampling is done the tracked paths are laid
//! out as a field tree; a path that is used both as a leaf and as a
//! container is coerced to a string field and reported as a conflict.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::engine::Engine;
use crate::error::Result;
use crate::field::{FieldId, FieldType};
use crate::lineage::{IdentityKind, IdentityNode, Node};
use crate::path::{Path, Waypoint};
use crate::tracker::{looks_like_geo_point, TypeTracker};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Tuning for [`Engine::from_documents`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructionOptions {
    /// Let string-encoded numbers and booleans refine inferred types
    pub interpret_strings: bool,
    /// Elements sampled per array
    pub array_sample_limit: usize,
    /// Conflict messages kept; later ones are only counted
    pub max_reported_conflicts: usize,
}

impl Default for ConstructionOptions {
    fn default() -> Self {
        Self {
            interpret_strings: false,
            array_sample_limit: 20,
            max_reported_conflicts: 5,
        }
    }
}

/// An inferred engine and the conflicts met while inferring it
#[derive(Debug, Clone)]
pub struct Construction {
    pub engine: Engine,
    /// At most `max_reported_conflicts` messages
    pub conflicts: Vec<String>,
    /// Every conflict, reported or not
    pub total_conflicts: usize,
}

struct ConflictLog {
    limit: usize,
    messages: Vec<String>,
    total: usize,
}

impl ConflictLog {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            messages: Vec::new(),
            total: 0,
        }
    }

    fn report(&mut self, message: String) {
        debug!("Type conflict: {}", message);
        self.total += 1;
        if self.messages.len() < self.limit {
            self.messages.push(message);
        }
    }
}

/// Call `visit` for every leaf under `value`. Non-empty objects other than
/// geo points and non-empty arrays are descended into; everything else is
/// a leaf.
fn sample_leaves(value: &Value, location: &mut Vec<Waypoint>, limit: usize, visit: &mut dyn FnMut(&[Waypoint], &Value)) {
    match value {
        Value::Object(map) if !map.is_empty() && !looks_like_geo_point(value) => {
            for (key, child) in map {
                location.push(Waypoint::key(key.as_str()));
                sample_leaves(child, location, limit, visit);
                location.pop();
            }
        }
        Value::Array(items) if !items.is_empty() => {
            location.push(Waypoint::Wildcard);
            for item in items.iter().take(limit) {
                sample_leaves(item, location, limit, visit);
            }
            location.pop();
        }
        _ if location.is_empty() => {}
        leaf => visit(location, leaf),
    }
}

#[derive(Debug)]
struct FieldNode {
    path: Path,
    field_type: Option<FieldType>,
    fields: BTreeMap<String, FieldNode>,
    element: Option<Box<FieldNode>>,
}

impl FieldNode {
    fn new(path: Path) -> Self {
        Self {
            path,
            field_type: None,
            fields: BTreeMap::new(),
            element: None,
        }
    }

    fn has_children(&self) -> bool {
        !self.fields.is_empty() || self.element.is_some()
    }

    fn coerce_to_string(&mut self) {
        self.field_type = Some(FieldType::String);
        self.fields.clear();
        self.element = None;
    }

    /// Check that this node is a `kind` container, typing it if it is still
    /// untyped. A node of another type is coerced to string and the
    /// conflict is returned.
    fn expect_container(&mut self, kind: FieldType) -> std::result::Result<(), String> {
        let actual = *self.field_type.get_or_insert(kind);
        if actual == kind {
            return Ok(());
        }
        let expected = if kind == FieldType::Array { "an array" } else { "an object" };
        self.coerce_to_string();
        Err(format!("Encountered a {} field where {} field was expected", actual, expected))
    }

    /// Record that `path` holds `desired`, growing the tree along the way
    fn insert(&mut self, path: &Path, desired: FieldType) -> std::result::Result<(), String> {
        let mut node = self;
        for waypoint in path {
            if waypoint.is_wildcard() {
                node.expect_container(FieldType::Array)?;
                let child = node.path.child(Waypoint::Wildcard);
                node = &mut **node.element.get_or_insert_with(|| Box::new(FieldNode::new(child)));
            } else {
                node.expect_container(FieldType::Object)?;
                let child = node.path.child(waypoint.clone());
                node = node
                    .fields
                    .entry(waypoint.to_string())
                    .or_insert_with(|| FieldNode::new(child));
            }
        }

        if node.has_children() {
            if node.field_type == Some(desired) {
                return Ok(());
            }
            node.coerce_to_string();
            return Err("Field with primitive type cannot be an array or object".to_string());
        }
        node.field_type = Some(desired);
        Ok(())
    }

    /// Every typed non-root node, parents before children
    fn collect(&self, out: &mut Vec<(Path, FieldType)>) {
        if let (false, Some(field_type)) = (self.path.is_root(), self.field_type) {
            out.push((self.path.clone(), field_type));
        }
        for child in self.fields.values() {
            child.collect(out);
        }
        if let Some(element) = &self.element {
            element.collect(out);
        }
    }
}

impl Engine {
    /// Infer an engine from sample documents
    pub fn from_documents(documents: &[Value], options: &ConstructionOptions) -> Result<Construction> {
        let mut log = ConflictLog::new(options.max_reported_conflicts);
        let mut trackers: Vec<TypeTracker> = Vec::new();
        let mut index: HashMap<Path, usize> = HashMap::new();

        for document in documents {
            let mut location = Vec::new();
            sample_leaves(document, &mut location, options.array_sample_limit, &mut |waypoints, value| {
                let path = Path::new(waypoints.to_vec());
                let slot = *index.entry(path.clone()).or_insert_with(|| {
                    trackers.push(TypeTracker::new(path, options.interpret_strings));
                    trackers.len() - 1
                });
                trackers[slot].push(value, &mut |conflict| log.report(conflict.to_string()));
            });
        }

        let mut tree = FieldNode::new(Path::root());
        for tracker in &trackers {
            if let Err(message) = tree.insert(tracker.path(), tracker.field_type()) {
                log.report(message);
            }
        }

        let mut fields = Vec::new();
        tree.collect(&mut fields);
        let mut engine = Engine::new();
        for (path, field_type) in fields {
            engine.add_field(path, field_type)?;
        }

        if log.total > 0 {
            warn!(
                "Inferred {} fields from {} documents with {} type conflicts",
                engine.registry.len(),
                documents.len(),
                log.total
            );
        } else {
            debug!("Inferred {} fields from {} documents", engine.registry.len(), documents.len());
        }

        Ok(Construction {
            engine,
            conflicts: log.messages,
            total_conflicts: log.total,
        })
    }

    /// Infer an engine from a single document
    pub fn from_sample(document: &Value) -> Result<Engine> {
        let construction = Engine::from_documents(std::slice::from_ref(document), &ConstructionOptions::default())?;
        Ok(construction.engine)
    }

    /// An engine shaped like the result of joining documents of `right`
    /// into an array under `key` of documents of `left`. Fields keep their
    /// types, enabled flags and properties; transformations are not copied.
    pub fn merge_join(left: &Engine, right: &Engine, key: &str) -> Result<Engine> {
        let mut merged = Engine::new();
        for id in left.registry.ids() {
            let path = left.output_path(id)?.clone();
            merged.copy_field(left, id, path)?;
        }

        let base = Path::new(vec![Waypoint::key(key), Waypoint::Wildcard]);
        merged.add_field(Path::new(vec![Waypoint::key(key)]), FieldType::Array)?;
        merged.add_field(base.clone(), FieldType::Object)?;
        for id in right.registry.ids() {
            let path = base.join(right.output_path(id)?);
            merged.copy_field(right, id, path)?;
        }

        debug!(
            "Merged {} and {} fields under '{}'",
            left.registry.len(),
            right.registry.len(),
            key
        );
        Ok(merged)
    }

    fn copy_field(&mut self, source: &Engine, id: FieldId, path: Path) -> Result<()> {
        let props: Map<String, Value> = source.props(id)?.clone();
        let copied = self.registry.insert_with(
            path.clone(),
            path.clone(),
            source.field_type(id)?,
            source.is_enabled(id),
            props,
        )?;
        self.graph.add_node(Node::Identity(IdentityNode {
            field: copied,
            path,
            origin: IdentityKind::Organic,
        }));
        Ok(())
    }
}
