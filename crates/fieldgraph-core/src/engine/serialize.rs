//! Engine persistence
//!
//! [`EngineSnapshot`] is the serialized form: the lineage graph, both id
//! counters and the five per-field tables as `[id, value]` pairs. Loading
//! validates every cross reference before an engine is built; a snapshot
//! that fails validation is rejected as a whole.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::Engine;
use crate::error::{Error, Result};
use crate::field::{FieldId, FieldType};
use crate::lineage::{Edge, IdentityKind, LineageGraph, Node, NodeId};
use crate::path::Path;
use crate::registry::FieldRegistry;
use anyhow::{bail, ensure};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Nodes and edges of the lineage graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<(NodeId, Node)>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub dag: GraphSnapshot,
    pub uid_field: u64,
    pub uid_node: u64,
    pub input_paths: Vec<(FieldId, Path)>,
    pub output_paths: Vec<(FieldId, Path)>,
    pub field_types: Vec<(FieldId, FieldType)>,
    pub field_enabled: Vec<(FieldId, bool)>,
    pub field_props: Vec<(FieldId, Map<String, Value>)>,
}

fn pairs<K: Copy, V: Clone>(table: &BTreeMap<K, V>) -> Vec<(K, V)> {
    table.iter().map(|(k, v)| (*k, v.clone())).collect()
}

impl From<&Engine> for EngineSnapshot {
    fn from(engine: &Engine) -> Self {
        let registry = &engine.registry;
        let graph = &engine.graph;
        EngineSnapshot {
            dag: GraphSnapshot {
                nodes: pairs(&graph.nodes),
                edges: graph.edges.clone(),
            },
            uid_field: registry.next_id,
            uid_node: graph.next_id,
            input_paths: pairs(&registry.input_paths),
            output_paths: pairs(&registry.output_paths),
            field_types: pairs(&registry.types),
            field_enabled: pairs(&registry.enabled),
            field_props: pairs(&registry.props),
        }
    }
}

impl From<Engine> for EngineSnapshot {
    fn from(engine: Engine) -> Self {
        EngineSnapshot::from(&engine)
    }
}

fn table<V>(name: &str, entries: Vec<(FieldId, V)>, next_id: u64) -> anyhow::Result<BTreeMap<FieldId, V>> {
    let mut map = BTreeMap::new();
    for (id, value) in entries {
        ensure!(id.0 < next_id, "{} lists field {} at or beyond the field counter {}", name, id, next_id);
        ensure!(map.insert(id, value).is_none(), "{} lists field {} twice", name, id);
    }
    Ok(map)
}

fn build(snapshot: EngineSnapshot) -> anyhow::Result<Engine> {
    let next_field = snapshot.uid_field;
    let registry = FieldRegistry {
        next_id: next_field,
        input_paths: table("input_paths", snapshot.input_paths, next_field)?,
        output_paths: table("output_paths", snapshot.output_paths, next_field)?,
        types: table("field_types", snapshot.field_types, next_field)?,
        enabled: table("field_enabled", snapshot.field_enabled, next_field)?,
        props: table("field_props", snapshot.field_props, next_field)?,
    };

    let ids: BTreeSet<FieldId> = registry.input_paths.keys().copied().collect();
    let same_ids = |keys: Vec<FieldId>| keys.into_iter().collect::<BTreeSet<_>>() == ids;
    ensure!(
        same_ids(registry.output_paths.keys().copied().collect())
            && same_ids(registry.types.keys().copied().collect())
            && same_ids(registry.enabled.keys().copied().collect())
            && same_ids(registry.props.keys().copied().collect()),
        "field tables disagree on the set of field ids"
    );

    let mut nodes = BTreeMap::new();
    for (id, node) in snapshot.dag.nodes {
        ensure!(id.0 < snapshot.uid_node, "node {} is at or beyond the node counter {}", id, snapshot.uid_node);
        ensure!(nodes.insert(id, node).is_none(), "node {} is listed twice", id);
    }
    let graph = LineageGraph {
        next_id: snapshot.uid_node,
        nodes,
        edges: snapshot.dag.edges,
    };

    for edge in &graph.edges {
        ensure!(
            graph.nodes.contains_key(&edge.from) && graph.nodes.contains_key(&edge.to),
            "edge {} -> {} references a missing node",
            edge.from,
            edge.to
        );
    }
    for field in graph.referenced_fields() {
        ensure!(ids.contains(&field), "a node references missing field {}", field);
    }
    for (id, node) in &graph.nodes {
        let referenced = match node {
            Node::Identity(identity) => match &identity.origin {
                IdentityKind::Organic => None,
                IdentityKind::Synthetic { source } => Some(*source),
                IdentityKind::Rename { prior, .. } => Some(*prior),
            },
            Node::Transform(_) => None,
        };
        if let Some(other) = referenced {
            ensure!(graph.nodes.contains_key(&other), "node {} references missing node {}", id, other);
        }
    }
    if let Some(node) = graph.find_cycle() {
        bail!("the lineage graph has a cycle through node {}", node);
    }

    let mut owners: BTreeMap<&Path, FieldId> = BTreeMap::new();
    for (id, path) in &registry.output_paths {
        if !registry.is_enabled(*id) {
            continue;
        }
        if let Some(owner) = owners.insert(path, *id) {
            bail!("enabled fields {} and {} share the output path '{}'", owner, id, path);
        }
    }

    Ok(Engine { registry, graph })
}

impl TryFrom<EngineSnapshot> for Engine {
    type Error = Error;

    fn try_from(snapshot: EngineSnapshot) -> Result<Self> {
        build(snapshot).map_err(|err| Error::deserialization(err.to_string(), Some(err)))
    }
}

/// Anything [`Engine::load`] accepts: the structured form or its JSON text
#[derive(Debug, Clone)]
pub enum EngineSource<'a> {
    Value(Value),
    Text(&'a str),
}

impl From<Value> for EngineSource<'_> {
    fn from(value: Value) -> Self {
        EngineSource::Value(value)
    }
}

impl<'a> From<&'a str> for EngineSource<'a> {
    fn from(text: &'a str) -> Self {
        EngineSource::Text(text)
    }
}

impl<'a> From<&'a String> for EngineSource<'a> {
    fn from(text: &'a String) -> Self {
        EngineSource::Text(text)
    }
}

impl Engine {
    /// Rebuild an engine from [`Engine::to_json`] output or its string form
    pub fn load<'a>(source: impl Into<EngineSource<'a>>) -> Result<Engine> {
        let value = match source.into() {
            EngineSource::Value(value) => value,
            EngineSource::Text(text) => serde_json::from_str(text)
                .map_err(|err| Error::deserialization(format!("invalid JSON: {}", err), Some(err.into())))?,
        };
        let snapshot: EngineSnapshot = serde_json::from_value(value)
            .map_err(|err| Error::deserialization(format!("malformed engine: {}", err), Some(err.into())))?;
        Engine::try_from(snapshot)
    }

    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(EngineSnapshot::from(self))?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&EngineSnapshot::from(self))?)
    }
}

impl PartialEq for Engine {
    fn eq(&self, other: &Self) -> bool {
        EngineSnapshot::from(self) == EngineSnapshot::from(other)
    }
}
