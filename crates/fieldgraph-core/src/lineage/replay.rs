//! Replaying renames
//!
//! A field's output path is never stored as history; it is the result of
//! starting from the path recorded by its creation identity and applying,
//! in node order, every later rename that carried it along. The structural
//! edit uses [`carried_path`] to move descendants, and replay uses the same
//! rule, so the registry and the graph can always be cross-checked.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::{IdentityKind, LineageGraph, Node, NodeId};
use crate::field::FieldId;
use crate::path::Path;
use crate::registry::FieldRegistry;

/// Where a rename of another field (`moved`, going `from` -> `to`) sends a
/// field currently at `path` with input path `input`. `None` when the
/// rename does not touch it.
///
/// Below a non-root `from`, membership is decided by output path. A field
/// moved away from the root has no output prefix to test, so membership
/// falls back to input structure under `moved_input`.
pub(crate) fn carried_path(
    path: &Path,
    input: &Path,
    from: &Path,
    to: &Path,
    moved_input: &Path,
) -> Option<Path> {
    if from.is_root() {
        input.is_strictly_under(moved_input).then(|| to.join(path))
    } else if path.is_strictly_under(from) {
        path.replace_prefix(from, to)
    } else {
        None
    }
}

/// Output path of `field` recomputed from its lineage alone
pub fn replay_output_path(
    graph: &LineageGraph,
    registry: &FieldRegistry,
    field: FieldId,
) -> Option<Path> {
    let (created, identity) = graph.creation_identity(field)?;
    let input = registry.input_path(field)?;
    let mut path = identity.path.clone();

    for (_, node) in graph.nodes.range(NodeId(created.0 + 1)..) {
        let Node::Identity(rename) = node else {
            continue;
        };
        let IdentityKind::Rename { from, .. } = &rename.origin else {
            continue;
        };
        if rename.field == field {
            path = rename.path.clone();
            continue;
        }
        let Some(moved_input) = registry.input_path(rename.field) else {
            continue;
        };
        if let Some(carried) = carried_path(&path, input, from, &rename.path, moved_input) {
            path = carried;
        }
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Path {
        Path::from(s)
    }

    #[test]
    fn test_carried_by_output_prefix() {
        assert_eq!(
            carried_path(&p("meta.school"), &p("meta.school"), &p("meta"), &p("info"), &p("meta")),
            Some(p("info.school"))
        );
        assert_eq!(
            carried_path(&p("metadata"), &p("metadata"), &p("meta"), &p("info"), &p("meta")),
            None
        );
        assert_eq!(
            carried_path(&p("meta"), &p("meta"), &p("meta"), &p("info"), &p("meta")),
            None
        );
    }

    #[test]
    fn test_carried_from_root_uses_input_structure() {
        assert_eq!(
            carried_path(&p("school"), &p("meta.school"), &Path::root(), &p("info"), &p("meta")),
            Some(p("info.school"))
        );
        assert_eq!(
            carried_path(&p("name"), &p("name"), &Path::root(), &p("info"), &p("meta")),
            None
        );
    }
}
