//! The transformation engine
//!
//! An [`Engine`] owns one [`FieldRegistry`] and one [`LineageGraph`]. Every
//! mutation either commits completely or returns a [`ValidationError`] and
//! leaves both untouched.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

mod edit;
mod execute;
mod serialize;

#[cfg(test)]
mod tests;

pub use edit::IntegrityIssue;
pub use execute::{ExecutionError, ExecutionStatus, TransformOutcome};
pub use serialize::{EngineSnapshot, EngineSource, GraphSnapshot};

use crate::error::{Result, ValidationError};
use crate::field::{FieldId, FieldType};
use crate::lineage::{EdgeKind, IdentityKind, IdentityNode, LineageGraph, Node, NodeId, TransformNode};
use crate::ops::{Operation, OperationKind};
use crate::path::{Path, Waypoint};
use crate::registry::FieldRegistry;
use crate::topology::{create_single_path_matcher, get_relation, Relation};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Document transformation engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "EngineSnapshot", try_from = "EngineSnapshot")]
pub struct Engine {
    pub(crate) registry: FieldRegistry,
    pub(crate) graph: LineageGraph,
}

/// A synthetic field an operation will create
struct PlannedField {
    output: Path,
    input: Path,
    field_type: FieldType,
}

/// First registered ancestor of `path` that cannot hold the next waypoint:
/// (ancestor, ancestor path, its type, the type that was needed)
pub(crate) fn container_conflict(
    path: &Path,
    owner_of: impl Fn(&Path) -> Option<FieldId>,
    type_of: impl Fn(FieldId) -> Option<FieldType>,
) -> Option<(FieldId, Path, FieldType, FieldType)> {
    (1..path.len()).find_map(|depth| {
        let prefix = path.slice(0..depth);
        let owner = owner_of(&prefix)?;
        let actual = type_of(owner)?;
        let expected = match path.get(depth) {
            Some(waypoint) if waypoint.is_array_step() => FieldType::Array,
            _ => FieldType::Object,
        };
        (actual != expected).then_some((owner, prefix, actual, expected))
    })
}

impl Engine {
    /// An engine with no fields
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &LineageGraph {
        &self.graph
    }

    fn check_field(&self, id: FieldId) -> std::result::Result<(), ValidationError> {
        if self.registry.contains(id) {
            Ok(())
        } else {
            Err(ValidationError::UnknownField(id))
        }
    }

    fn check_ancestors(&self, field: FieldId, path: &Path) -> std::result::Result<(), ValidationError> {
        match container_conflict(
            path,
            |prefix| self.registry.enabled_output_owner(prefix),
            |id| self.registry.field_type(id),
        ) {
            Some((ancestor, ancestor_path, ancestor_type, expected)) => Err(ValidationError::NonContainerAncestor {
                field,
                path: path.clone(),
                ancestor,
                ancestor_path,
                ancestor_type,
                expected,
            }),
            None => Ok(()),
        }
    }

    /// Register an organic field whose input and output path are `path`
    pub fn add_field(&mut self, path: Path, field_type: FieldType) -> Result<FieldId> {
        self.check_ancestors(FieldId(self.registry.next_id()), &path)?;
        let id = self.registry.insert(path.clone(), path.clone(), field_type)?;
        self.graph.add_node(Node::Identity(IdentityNode {
            field: id,
            path: path.clone(),
            origin: IdentityKind::Organic,
        }));
        debug!("Added field {} at '{}' as {}", id, path, field_type);
        Ok(id)
    }

    fn add_synthetic_field(&mut self, source: NodeId, planned: PlannedField) -> Result<FieldId> {
        let id = self
            .registry
            .insert(planned.input, planned.output.clone(), planned.field_type)?;
        let identity = self.graph.add_node(Node::Identity(IdentityNode {
            field: id,
            path: planned.output,
            origin: IdentityKind::Synthetic { source },
        }));
        self.graph.add_edge(source, identity, EdgeKind::Synthetic)?;
        Ok(id)
    }

    /// Field whose input path is `path`, preferring enabled fields
    pub fn field_id(&self, path: &Path) -> Option<FieldId> {
        self.registry.input_owner(path)
    }

    /// Field whose output path is `path`, preferring enabled fields
    pub fn output_field_id(&self, path: &Path) -> Option<FieldId> {
        self.registry.output_owner(path)
    }

    pub fn input_path(&self, id: FieldId) -> Result<&Path> {
        Ok(self
            .registry
            .input_path(id)
            .ok_or(ValidationError::UnknownField(id))?)
    }

    pub fn output_path(&self, id: FieldId) -> Result<&Path> {
        Ok(self
            .registry
            .output_path(id)
            .ok_or(ValidationError::UnknownField(id))?)
    }

    pub fn field_type(&self, id: FieldId) -> Result<FieldType> {
        Ok(self
            .registry
            .field_type(id)
            .ok_or(ValidationError::UnknownField(id))?)
    }

    pub fn set_field_type(&mut self, id: FieldId, field_type: FieldType) -> Result<()> {
        self.registry.set_type(id, field_type)?;
        Ok(())
    }

    pub fn enable_field(&mut self, id: FieldId) -> Result<()> {
        self.registry.set_enabled(id, true)?;
        Ok(())
    }

    pub fn disable_field(&mut self, id: FieldId) -> Result<()> {
        self.registry.set_enabled(id, false)?;
        Ok(())
    }

    pub fn is_enabled(&self, id: FieldId) -> bool {
        self.registry.is_enabled(id)
    }

    pub fn props(&self, id: FieldId) -> Result<&Map<String, Value>> {
        Ok(self.registry.props(id).ok_or(ValidationError::UnknownField(id))?)
    }

    pub fn prop(&self, id: FieldId, key: &Path) -> Option<&Value> {
        self.registry.prop(id, key)
    }

    pub fn set_prop(&mut self, id: FieldId, key: &Path, value: Value) -> Result<()> {
        self.registry.set_prop(id, key, value)
    }

    pub fn set_props(&mut self, id: FieldId, props: Map<String, Value>) -> Result<()> {
        self.registry.set_props(id, props)?;
        Ok(())
    }

    pub fn all_field_ids(&self) -> Vec<FieldId> {
        self.registry.ids().collect()
    }

    /// Enabled field owning the longest proper prefix of `id`'s output path
    pub fn parent_field(&self, id: FieldId) -> Option<FieldId> {
        let path = self.registry.output_path(id)?;
        (0..path.len())
            .rev()
            .find_map(|depth| self.registry.enabled_output_owner(&path.slice(0..depth)))
            .filter(|parent| *parent != id)
    }

    /// Fields whose nearest registered output ancestor is `id`
    pub fn child_fields(&self, id: FieldId) -> Vec<FieldId> {
        self.registry
            .ids()
            .filter(|other| *other != id && self.parent_field(*other) == Some(id))
            .collect()
    }

    /// Transform nodes consuming or producing `field`, in execution order
    pub fn transformations_of(&self, field: FieldId) -> Vec<NodeId> {
        self.graph
            .topological_order()
            .into_iter()
            .filter(|node| {
                self.graph
                    .node(*node)
                    .and_then(Node::as_transform)
                    .is_some_and(|transform| {
                        transform.fields.contains(&field) || transform.new_fields.contains(&field)
                    })
            })
            .collect()
    }

    pub fn transformation(&self, node: NodeId) -> Option<&TransformNode> {
        self.graph.node(node).and_then(Node::as_transform)
    }

    /// Input address for a new field at output path `output`: below the
    /// deepest enabled field whose output path prefixes it, otherwise the
    /// output path itself.
    fn derive_input_path(&self, output: &Path) -> Path {
        (1..output.len())
            .rev()
            .find_map(|depth| {
                let owner = self.registry.enabled_output_owner(&output.slice(0..depth))?;
                let input = self.registry.input_path(owner)?;
                Some(input.join(&output.slice(depth..output.len())))
            })
            .unwrap_or_else(|| output.clone())
    }

    fn plan_synthetic_fields(
        &self,
        operation: &Operation,
        fields: &[FieldId],
    ) -> std::result::Result<Vec<PlannedField>, ValidationError> {
        let kind = operation.kind();
        let Some(source) = fields.first().copied() else {
            return Ok(Vec::new());
        };
        let source_input = self
            .registry
            .input_path(source)
            .ok_or(ValidationError::UnknownField(source))?;
        let source_type = self
            .registry
            .field_type(source)
            .ok_or(ValidationError::UnknownField(source))?;

        let mut planned = Vec::new();
        for output in operation.requested_paths() {
            let input = self.derive_input_path(&output);
            let relation = get_relation(source_input, &input);
            match (kind, relation) {
                (OperationKind::Split, (Relation::One, Relation::One))
                    if create_single_path_matcher(source_input, &input).is_some() =>
                {
                    planned.push(PlannedField {
                        output,
                        input,
                        field_type: FieldType::String,
                    });
                }
                (OperationKind::Duplicate, (Relation::One, Relation::One)) => {
                    planned.push(PlannedField {
                        output,
                        input,
                        field_type: source_type,
                    });
                }
                (OperationKind::Duplicate, (Relation::Many, Relation::One)) => {
                    let element = PlannedField {
                        output: output.child(Waypoint::Wildcard),
                        input: input.child(Waypoint::Wildcard),
                        field_type: source_type,
                    };
                    planned.push(PlannedField {
                        output,
                        input,
                        field_type: FieldType::Array,
                    });
                    planned.push(element);
                }
                _ => {
                    return Err(ValidationError::IncompatibleRelation {
                        operation: kind,
                        from: source_input.clone(),
                        to: input,
                        relation,
                    })
                }
            }
        }

        for (i, field) in planned.iter().enumerate() {
            if planned[..i].iter().any(|earlier| earlier.output == field.output) {
                return Err(ValidationError::InvalidOptions {
                    operation: kind,
                    reason: format!("'{}' is requested more than once", field.output),
                });
            }
            if let Some(owner) = self.registry.enabled_output_owner(&field.output) {
                return Err(ValidationError::AmbiguousAddress {
                    path: field.output.clone(),
                    owner,
                });
            }
            if let Some(owner) = self.registry.enabled_input_owner(&field.input) {
                return Err(ValidationError::AmbiguousAddress {
                    path: field.input.clone(),
                    owner,
                });
            }
            self.check_ancestors(source, &field.output)?;
        }
        Ok(planned)
    }

    /// Append an operation over `fields` to the pipeline. Synthetic fields
    /// the operation asks for are created with it.
    pub fn append_transformation(&mut self, operation: Operation, fields: &[FieldId]) -> Result<NodeId> {
        for id in fields {
            self.check_field(*id)?;
        }
        operation.validate_options(fields.len())?;
        let planned = self.plan_synthetic_fields(&operation, fields)?;

        let mut staged = self.clone();
        let node = staged.commit_transformation(operation, fields, planned)?;
        *self = staged;
        Ok(node)
    }

    fn commit_transformation(
        &mut self,
        operation: Operation,
        fields: &[FieldId],
        planned: Vec<PlannedField>,
    ) -> Result<NodeId> {
        let mut heads: Vec<NodeId> = fields.iter().filter_map(|id| self.graph.head_of(*id)).collect();
        heads.sort();
        heads.dedup();
        let kind = operation.kind();
        let retype = match &operation {
            Operation::Cast(options) => Some(options.to),
            _ => None,
        };

        let node = self.graph.add_node(Node::Transform(TransformNode {
            operation,
            fields: fields.to_vec(),
            new_fields: Vec::new(),
        }));
        for head in heads {
            self.graph.add_edge(head, node, EdgeKind::Same)?;
        }

        let mut new_fields = Vec::with_capacity(planned.len());
        for field in planned {
            new_fields.push(self.add_synthetic_field(node, field)?);
        }
        if let Some(Node::Transform(transform)) = self.graph.node_mut(node) {
            transform.new_fields = new_fields;
        }
        if let Some(to) = retype {
            for id in fields {
                self.registry.set_type(*id, to)?;
            }
        }

        debug!("Appended {} node {} over fields {:?}", kind, node, fields);
        Ok(node)
    }

    /// Same serialized state
    pub fn equals(&self, other: &Engine) -> bool {
        self == other
    }
}
