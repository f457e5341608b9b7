//! Lineage graph
//!
//! An arena of nodes keyed by [`NodeId`] plus an explicit edge list.
//! Identity nodes record how a field came to be (organic, renamed or
//! synthesized); transform nodes are the authored operations. Edges run from
//! producer to consumer and the graph stays acyclic: every insertion is
//! checked for reachability back to its source.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

mod order;
mod replay;

pub use replay::replay_output_path;

use crate::error::ValidationError;
use crate::field::FieldId;
use crate::ops::Operation;
use crate::path::Path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a lineage node, unique within one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a field's current identity came about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentityKind {
    /// Present in the sampled document shape
    Organic,
    /// Produced by the transform node `source`
    Synthetic { source: NodeId },
    /// Moved from `from`; `prior` is the identity it supersedes
    Rename { prior: NodeId, from: Path },
}

/// Lineage record of one field. `path` is the output path the field had
/// right after this identity was installed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityNode {
    pub field: FieldId,
    pub path: Path,
    pub origin: IdentityKind,
}

/// One authored operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformNode {
    pub operation: Operation,
    /// Fields the operation consumes, in order
    pub fields: Vec<FieldId>,
    /// Synthetic fields the operation produces
    #[serde(default)]
    pub new_fields: Vec<FieldId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Identity(IdentityNode),
    Transform(TransformNode),
}

impl Node {
    /// True when the node mentions `field` in any role
    pub fn references(&self, field: FieldId) -> bool {
        match self {
            Node::Identity(identity) => identity.field == field,
            Node::Transform(transform) => {
                transform.fields.contains(&field) || transform.new_fields.contains(&field)
            }
        }
    }

    pub fn as_identity(&self) -> Option<&IdentityNode> {
        match self {
            Node::Identity(identity) => Some(identity),
            Node::Transform(_) => None,
        }
    }

    pub fn as_transform(&self) -> Option<&TransformNode> {
        match self {
            Node::Transform(transform) => Some(transform),
            Node::Identity(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// The field flows unchanged into the next node
    Same,
    /// A transform produced a new field
    Synthetic,
    /// The field's address was structurally edited
    Rename,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineageGraph {
    pub(crate) next_id: u64,
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) edges: Vec<Edge>,
}

impl LineageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next inserted node will receive
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    /// Insert an edge, refusing unknown endpoints and anything that would
    /// close a cycle.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) -> Result<(), ValidationError> {
        for id in [from, to] {
            if !self.nodes.contains_key(&id) {
                return Err(ValidationError::UnknownNode(id));
            }
        }
        if from == to || self.reaches(to, from) {
            return Err(ValidationError::Cycle { from, to });
        }
        self.edges.push(Edge { from, to, kind });
        Ok(())
    }

    /// Remove a node together with every edge touching it
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.edges.retain(|edge| edge.from != id && edge.to != id);
        self.nodes.remove(&id)
    }

    /// Identity nodes of `field`, oldest first
    pub fn identities_of(&self, field: FieldId) -> impl Iterator<Item = (NodeId, &IdentityNode)> {
        self.nodes.iter().filter_map(move |(id, node)| match node {
            Node::Identity(identity) if identity.field == field => Some((*id, identity)),
            _ => None,
        })
    }

    /// The identity created with the field (organic or synthetic)
    pub fn creation_identity(&self, field: FieldId) -> Option<(NodeId, &IdentityNode)> {
        self.identities_of(field)
            .find(|(_, identity)| !matches!(identity.origin, IdentityKind::Rename { .. }))
    }

    /// The most recent identity of `field`
    pub fn current_identity(&self, field: FieldId) -> Option<(NodeId, &IdentityNode)> {
        self.identities_of(field).last()
    }

    /// The most recent node of any kind that mentions `field`
    pub fn head_of(&self, field: FieldId) -> Option<NodeId> {
        self.nodes
            .iter()
            .rev()
            .find(|(_, node)| node.references(field))
            .map(|(id, _)| *id)
    }

    /// Transform nodes mentioning `field`, in node id order
    pub fn transforms_of(&self, field: FieldId) -> impl Iterator<Item = (NodeId, &TransformNode)> {
        self.nodes.iter().filter_map(move |(id, node)| match node {
            Node::Transform(transform) if node.references(field) => Some((*id, transform)),
            _ => None,
        })
    }

    /// Every field id any node mentions
    pub(crate) fn referenced_fields(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.nodes.values().flat_map(|node| match node {
            Node::Identity(identity) => vec![identity.field],
            Node::Transform(transform) => transform
                .fields
                .iter()
                .chain(transform.new_fields.iter())
                .copied()
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;
    use crate::ops::CastOptions;

    fn organic(field: u64, path: &str) -> Node {
        Node::Identity(IdentityNode {
            field: FieldId(field),
            path: Path::from(path),
            origin: IdentityKind::Organic,
        })
    }

    fn cast(field: u64) -> Node {
        Node::Transform(TransformNode {
            operation: Operation::Cast(CastOptions {
                to: FieldType::String,
                format: None,
            }),
            fields: vec![FieldId(field)],
            new_fields: vec![],
        })
    }

    #[test]
    fn test_cycle_rejected_on_insert() {
        let mut graph = LineageGraph::new();
        let a = graph.add_node(organic(0, "a"));
        let t1 = graph.add_node(cast(0));
        let t2 = graph.add_node(cast(0));
        graph.add_edge(a, t1, EdgeKind::Same).unwrap();
        graph.add_edge(t1, t2, EdgeKind::Same).unwrap();

        let err = graph.add_edge(t2, a, EdgeKind::Same).unwrap_err();
        assert_eq!(err, ValidationError::Cycle { from: t2, to: a });
        assert!(graph.add_edge(t1, t1, EdgeKind::Same).is_err());
        assert_eq!(graph.edges().len(), 2);
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        let mut graph = LineageGraph::new();
        let a = graph.add_node(organic(0, "a"));
        assert_eq!(
            graph.add_edge(a, NodeId(9), EdgeKind::Same),
            Err(ValidationError::UnknownNode(NodeId(9)))
        );
    }

    #[test]
    fn test_identity_lookups() {
        let mut graph = LineageGraph::new();
        let created = graph.add_node(organic(4, "name"));
        let t = graph.add_node(cast(4));
        let renamed = graph.add_node(Node::Identity(IdentityNode {
            field: FieldId(4),
            path: Path::from("firstname"),
            origin: IdentityKind::Rename {
                prior: created,
                from: Path::from("name"),
            },
        }));

        assert_eq!(graph.creation_identity(FieldId(4)).map(|(id, _)| id), Some(created));
        assert_eq!(graph.current_identity(FieldId(4)).map(|(id, _)| id), Some(renamed));
        assert_eq!(graph.head_of(FieldId(4)), Some(renamed));
        assert_eq!(graph.transforms_of(FieldId(4)).map(|(id, _)| id).collect::<Vec<_>>(), vec![t]);
        assert_eq!(graph.head_of(FieldId(5)), None);
    }

    #[test]
    fn test_remove_node_drops_edges() {
        let mut graph = LineageGraph::new();
        let a = graph.add_node(organic(0, "a"));
        let t = graph.add_node(cast(0));
        graph.add_edge(a, t, EdgeKind::Same).unwrap();
        graph.remove_node(t);
        assert!(graph.edges().is_empty());
        assert_eq!(graph.len(), 1);
    }
}
