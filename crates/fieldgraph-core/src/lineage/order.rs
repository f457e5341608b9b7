//! Reachability and topological ordering
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::{LineageGraph, NodeId};
use std::collections::{BTreeMap, BTreeSet};

impl LineageGraph {
    fn successors(&self) -> BTreeMap<NodeId, Vec<NodeId>> {
        let mut successors: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        for edge in &self.edges {
            successors.entry(edge.from).or_default().push(edge.to);
        }
        successors
    }

    /// True when `to` can be reached from `from` by following edges
    pub fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let successors = self.successors();
        let mut stack = vec![from];
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(next) = successors.get(&current) {
                stack.extend(next.iter().copied());
            }
        }
        false
    }

    /// Kahn's algorithm with the lowest ready id always taken first, so the
    /// same graph always yields the same order. Returns the ordered nodes
    /// and whatever could not be ordered because it sits on a cycle.
    fn kahn(&self) -> (Vec<NodeId>, Vec<NodeId>) {
        let mut in_degree: BTreeMap<NodeId, usize> = self.nodes.keys().map(|id| (*id, 0)).collect();
        for edge in &self.edges {
            if let Some(degree) = in_degree.get_mut(&edge.to) {
                *degree += 1;
            }
        }
        let successors = self.successors();

        let mut ready: BTreeSet<NodeId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut ordered = Vec::with_capacity(self.nodes.len());

        while let Some(current) = ready.pop_first() {
            ordered.push(current);
            for next in successors.get(&current).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(*next);
                    }
                }
            }
        }

        let placed: BTreeSet<NodeId> = ordered.iter().copied().collect();
        let stuck = self
            .nodes
            .keys()
            .filter(|id| !placed.contains(id))
            .copied()
            .collect();
        (ordered, stuck)
    }

    /// Stable topological order of every node. Nodes on a cycle (which
    /// `add_edge` never admits) are appended in id order.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let (mut ordered, stuck) = self.kahn();
        ordered.extend(stuck);
        ordered
    }

    /// Some node on a cycle, if the edge list contains one
    pub fn find_cycle(&self) -> Option<NodeId> {
        self.kahn().1.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Edge, EdgeKind, IdentityKind, IdentityNode, Node};
    use super::*;
    use crate::field::FieldId;
    use crate::path::Path;

    fn graph_with(count: u64, edges: &[(u64, u64)]) -> LineageGraph {
        let mut graph = LineageGraph::new();
        for i in 0..count {
            graph.add_node(Node::Identity(IdentityNode {
                field: FieldId(i),
                path: Path::from("f"),
                origin: IdentityKind::Organic,
            }));
        }
        for (from, to) in edges {
            graph.edges.push(Edge {
                from: NodeId(*from),
                to: NodeId(*to),
                kind: EdgeKind::Same,
            });
        }
        graph
    }

    #[test]
    fn test_order_respects_edges_and_is_stable() {
        let graph = graph_with(5, &[(3, 1), (1, 0), (4, 2)]);
        let order = graph.topological_order();
        assert_eq!(order, vec![NodeId(3), NodeId(1), NodeId(0), NodeId(4), NodeId(2)]);
        assert_eq!(order, graph.clone().topological_order());
    }

    #[test]
    fn test_reaches() {
        let graph = graph_with(4, &[(0, 1), (1, 2)]);
        assert!(graph.reaches(NodeId(0), NodeId(2)));
        assert!(!graph.reaches(NodeId(2), NodeId(0)));
        assert!(!graph.reaches(NodeId(0), NodeId(3)));
    }

    #[test]
    fn test_find_cycle_on_corrupt_edges() {
        let graph = graph_with(3, &[(0, 1), (1, 2), (2, 1)]);
        assert_eq!(graph.find_cycle(), Some(NodeId(1)));
        assert_eq!(graph.topological_order().len(), 3);
        assert_eq!(graph_with(2, &[(0, 1)]).find_cycle(), None);
    }
}
