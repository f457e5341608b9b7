//! Structural edits
//!
//! `set_output_path` moves a field and everything nested under it. The
//! requested path is first generalized against the field's current pattern,
//! so renaming one instance `foo.3.bar` of `foo.*.bar` renames the pattern.
//! The whole move is planned against a proposed copy of the output table and
//! validated before anything is written; a rejected edit changes nothing.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::{container_conflict, Engine};
use crate::error::{Error, Result, ValidationError};
use crate::field::{FieldId, FieldType};
use crate::lineage::{replay_output_path, EdgeKind, IdentityKind, IdentityNode, Node};
use crate::path::Path;
use crate::topology::are_fields_local;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Inconsistency found by [`Engine::verify_integrity`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrityIssue {
    #[error("field {field} at '{path}' sits under field {ancestor} at '{ancestor_path}', which is {ancestor_type} rather than {expected}")]
    NonContainerParent {
        field: FieldId,
        path: Path,
        ancestor: FieldId,
        ancestor_path: Path,
        ancestor_type: FieldType,
        expected: FieldType,
    },

    #[error("field {field} is registered at '{registered}' but its lineage replays to '{replayed}'")]
    LineageMismatch {
        field: FieldId,
        registered: Path,
        replayed: Path,
    },

    #[error("field {0} has no creation identity in the lineage graph")]
    MissingLineage(FieldId),
}

impl Engine {
    /// Output path of `id` recomputed from its lineage
    pub fn replay_output_path(&self, id: FieldId) -> Result<Path> {
        let current = self.output_path(id)?;
        replay_output_path(&self.graph, &self.registry, id).ok_or_else(|| Error::Integrity {
            field: id,
            message: format!("no creation identity for the field at '{}'", current),
        })
    }

    /// Fields that move along with `id` when it leaves `current`, paired
    /// with the path they end up at once `id` sits at `new`
    fn carried_fields(&self, id: FieldId, current: &Path, new: &Path) -> Vec<(FieldId, Path)> {
        if current.is_root() {
            let Some(input) = self.registry.input_path(id) else {
                return Vec::new();
            };
            self.registry
                .input_paths
                .iter()
                .filter(|(other, path)| **other != id && path.is_strictly_under(input))
                .filter_map(|(other, _)| {
                    let out = self.registry.output_path(*other)?;
                    Some((*other, new.join(out)))
                })
                .collect()
        } else {
            self.registry
                .output_paths
                .iter()
                .filter(|(other, path)| **other != id && path.is_strictly_under(current))
                .filter_map(|(other, path)| Some((*other, path.replace_prefix(current, new)?)))
                .collect()
        }
    }

    /// Move field `id` to `requested`, carrying every field nested under it.
    #[doc(alias = "rename")]
    pub fn set_output_path(&mut self, id: FieldId, requested: Path) -> Result<()> {
        let current = self.output_path(id)?.clone();
        let replayed = self.replay_output_path(id)?;
        if replayed != current {
            return Err(Error::Integrity {
                field: id,
                message: format!("registered at '{}' but lineage replays to '{}'", current, replayed),
            });
        }

        let new = current.generalize(&requested);
        if new == current {
            return Ok(());
        }
        if !are_fields_local(&current, &new) {
            return Err(ValidationError::CrossLevelMove {
                field: id,
                from: current,
                to: new,
            }
            .into());
        }
        let field_type = self.field_type(id)?;
        if new.is_root() && field_type != FieldType::Object {
            return Err(ValidationError::NotMergeable {
                field: id,
                path: new,
                field_type,
            }
            .into());
        }

        let mut moves = vec![(id, new.clone())];
        moves.extend(self.carried_fields(id, &current, &new));

        for (field, path) in &moves {
            let input = self.input_path(*field)?;
            if input.wildcard_count() != path.wildcard_count() {
                return Err(ValidationError::CrossLevelMove {
                    field: *field,
                    from: self.output_path(*field)?.clone(),
                    to: path.clone(),
                }
                .into());
            }
        }

        let mut proposed: BTreeMap<FieldId, Path> = self.registry.output_paths.clone();
        for (field, path) in &moves {
            proposed.insert(*field, path.clone());
        }
        let enabled_owner = |path: &Path, except: FieldId| {
            proposed
                .iter()
                .find(|(other, p)| **other != except && *p == path && self.registry.is_enabled(**other))
                .map(|(other, _)| *other)
        };

        for (field, path) in moves.iter().filter(|(field, _)| self.registry.is_enabled(*field)) {
            if let Some(owner) = enabled_owner(path, *field) {
                return Err(ValidationError::Collision {
                    field: *field,
                    path: path.clone(),
                    owner,
                }
                .into());
            }
        }

        // A move can also land a leaf above fields that stayed where they were
        for (field, path) in proposed.iter().filter(|(field, _)| self.registry.is_enabled(**field)) {
            if let Some((ancestor, ancestor_path, ancestor_type, expected)) = container_conflict(
                path,
                |prefix| enabled_owner(prefix, *field),
                |other| self.registry.field_type(other),
            ) {
                return Err(ValidationError::NonContainerAncestor {
                    field: *field,
                    path: path.clone(),
                    ancestor,
                    ancestor_path,
                    ancestor_type,
                    expected,
                }
                .into());
            }
        }

        let (prior, _) = self.graph.current_identity(id).ok_or_else(|| Error::Integrity {
            field: id,
            message: "no identity to rename".to_string(),
        })?;
        let head = self.graph.head_of(id);
        let rename = self.graph.add_node(Node::Identity(IdentityNode {
            field: id,
            path: new.clone(),
            origin: IdentityKind::Rename {
                prior,
                from: current.clone(),
            },
        }));
        if let Some(head) = head {
            if let Err(err) = self.graph.add_edge(head, rename, EdgeKind::Rename) {
                self.graph.remove_node(rename);
                self.graph.next_id = rename.0;
                return Err(err.into());
            }
        }
        for (field, path) in moves {
            self.registry.set_output_path(field, path);
        }

        debug!("Moved field {} from '{}' to '{}'", id, current, new);
        Ok(())
    }

    /// Remove `id` and every field nested under it, by input structure or
    /// by output position. Refused while a transformation uses any of them.
    pub fn remove_field(&mut self, id: FieldId) -> Result<Vec<FieldId>> {
        let input = self.input_path(id)?.clone();
        let output = self.output_path(id)?.clone();

        let doomed: BTreeSet<FieldId> = self
            .registry
            .ids()
            .filter(|other| {
                *other == id
                    || self.registry.input_path(*other).is_some_and(|p| p.is_strictly_under(&input))
                    || (!output.is_root()
                        && self.registry.output_path(*other).is_some_and(|p| p.is_strictly_under(&output)))
            })
            .collect();

        for field in &doomed {
            if let Some((node, _)) = self.graph.transforms_of(*field).next() {
                return Err(ValidationError::FieldInUse { field: *field, node }.into());
            }
        }

        let nodes: Vec<_> = self
            .graph
            .nodes()
            .filter(|(_, node)| doomed.iter().any(|field| node.references(*field)))
            .map(|(node, _)| node)
            .collect();
        for node in nodes {
            self.graph.remove_node(node);
        }
        for field in &doomed {
            self.registry.remove(*field);
        }

        debug!("Removed fields {:?}", doomed);
        Ok(doomed.into_iter().collect())
    }

    /// Every consistency problem between the registry and the lineage graph
    pub fn verify_integrity(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();
        for id in self.registry.ids() {
            let Some(registered) = self.registry.output_path(id) else {
                continue;
            };
            match replay_output_path(&self.graph, &self.registry, id) {
                None => issues.push(IntegrityIssue::MissingLineage(id)),
                Some(replayed) if &replayed != registered => issues.push(IntegrityIssue::LineageMismatch {
                    field: id,
                    registered: registered.clone(),
                    replayed,
                }),
                Some(_) => {}
            }
            if !self.registry.is_enabled(id) {
                continue;
            }
            if let Some((ancestor, ancestor_path, ancestor_type, expected)) = container_conflict(
                registered,
                |prefix| self.registry.enabled_output_owner(prefix),
                |other| self.registry.field_type(other),
            ) {
                issues.push(IntegrityIssue::NonContainerParent {
                    field: id,
                    path: registered.clone(),
                    ancestor,
                    ancestor_path,
                    ancestor_type,
                    expected,
                });
            }
        }
        issues
    }
}
