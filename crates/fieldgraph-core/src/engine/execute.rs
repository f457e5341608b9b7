//! Running the pipeline over a document
//!
//! Transform nodes run in topological order against a working copy of the
//! input document, in input coordinates. A node that fails is recorded and
//! skipped; its partial writes are discarded and the rest of the pipeline
//! still runs. Once every node has had its turn the enabled fields are
//! copied from the working document to their output paths.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::Engine;
use crate::field::FieldId;
use crate::lineage::{Node, NodeId};
use crate::ops::OperationKind;
use crate::path::{self, Path};
use crate::topology::create_single_path_matcher;
use log::{trace, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Lifecycle of one `transform` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Ready,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }

    pub fn can_transition_to(&self, next: ExecutionStatus) -> bool {
        matches!(
            (self, next),
            (ExecutionStatus::Ready, ExecutionStatus::Running)
                | (ExecutionStatus::Running, ExecutionStatus::Completed)
                | (ExecutionStatus::Running, ExecutionStatus::Failed)
        )
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionStatus::Ready => "ready",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A problem met while transforming; never aborts the run
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ExecutionError {
    /// A transform node's operation failed
    #[error("{operation} node {node} failed: {message}")]
    Node {
        node: NodeId,
        operation: OperationKind,
        message: String,
    },

    /// A field's value could not be placed at its output path
    #[error("field {field} could not be written to '{location}': {message}")]
    Output {
        field: FieldId,
        location: Path,
        message: String,
    },
}

/// Result of [`Engine::transform`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformOutcome {
    pub document: Value,
    pub errors: Vec<ExecutionError>,
    pub status: ExecutionStatus,
}

impl TransformOutcome {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }
}

struct Execution<'e> {
    engine: &'e Engine,
    status: ExecutionStatus,
    working: Value,
    errors: Vec<ExecutionError>,
}

impl<'e> Execution<'e> {
    fn new(engine: &'e Engine, document: &Value) -> Self {
        Self {
            engine,
            status: ExecutionStatus::Ready,
            working: document.clone(),
            errors: Vec::new(),
        }
    }

    fn advance(&mut self, next: ExecutionStatus) {
        if self.status.can_transition_to(next) {
            trace!("Execution {} -> {}", self.status, next);
            self.status = next;
        } else {
            warn!("Ignoring execution transition {} -> {}", self.status, next);
        }
    }

    fn input_paths(&self, fields: &[FieldId]) -> Vec<Path> {
        fields
            .iter()
            .filter_map(|id| self.engine.registry.input_path(*id).cloned())
            .collect()
    }

    fn run_nodes(&mut self) {
        let engine = self.engine;
        for id in engine.graph.topological_order() {
            let Some(Node::Transform(node)) = engine.graph.node(id) else {
                continue;
            };
            let inputs = self.input_paths(&node.fields);
            let outputs = self.input_paths(&node.new_fields);
            trace!("Running {} node {}", node.operation.kind(), id);

            let mut scratch = self.working.clone();
            match node.operation.apply(&inputs, &outputs, &mut scratch) {
                Ok(()) => self.working = scratch,
                Err(err) => {
                    warn!("Transformation node {} ({}) failed: {}", id, node.operation.kind(), err);
                    self.errors.push(ExecutionError::Node {
                        node: id,
                        operation: node.operation.kind(),
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    /// Copy every enabled field from the working document to its output
    /// path. Parents are placed before children; a field with registered
    /// children is placed as an empty container that its enabled children
    /// fill in. A field whose
    /// input pattern is covered by a more specific enabled field yields those
    /// instances to it.
    fn assemble(&mut self) -> Value {
        let engine = self.engine;
        let registry = &engine.registry;
        let mut fields: Vec<(FieldId, &Path, &Path)> = registry
            .ids()
            .filter(|id| registry.is_enabled(*id))
            .filter_map(|id| Some((id, registry.input_path(id)?, registry.output_path(id)?)))
            .collect();
        fields.sort_by_key(|(id, _, output)| (output.len(), *id));
        // Disabled fields still make their parent a container, so their data
        // never rides along with it.
        let registered: Vec<&Path> = registry.ids().filter_map(|id| registry.input_path(id)).collect();

        let mut output = Value::Null;
        for (id, input, out) in &fields {
            let Some(matcher) = create_single_path_matcher(input, out) else {
                self.errors.push(ExecutionError::Output {
                    field: *id,
                    location: (*out).clone(),
                    message: format!("'{}' and '{}' have different array nesting", input, out),
                });
                continue;
            };
            let shadows: Vec<&Path> = fields
                .iter()
                .map(|(_, other, _)| *other)
                .filter(|other| other != input && input.covers(other))
                .collect();
            let container = registered.iter().any(|other| other.is_strictly_under(input));

            for found in path::search(&self.working, input) {
                if shadows.iter().any(|shadow| shadow.covers(&found.location)) {
                    continue;
                }
                let target = matcher.apply(&found.location);
                let value = if container {
                    empty_like(found.value)
                } else {
                    found.value.clone()
                };
                if let Err(err) = place(&mut output, &target, value) {
                    self.errors.push(ExecutionError::Output {
                        field: *id,
                        location: target,
                        message: err.to_string(),
                    });
                }
            }
        }

        if output.is_null() {
            Value::Object(Map::new())
        } else {
            output
        }
    }

    fn run(mut self) -> TransformOutcome {
        self.advance(ExecutionStatus::Running);
        self.run_nodes();
        let document = self.assemble();
        if self.errors.is_empty() {
            self.advance(ExecutionStatus::Completed);
        } else {
            self.advance(ExecutionStatus::Failed);
        }
        TransformOutcome {
            document,
            errors: self.errors,
            status: self.status,
        }
    }
}

fn empty_like(value: &Value) -> Value {
    match value {
        Value::Object(_) => Value::Object(Map::new()),
        Value::Array(_) => Value::Array(Vec::new()),
        other => other.clone(),
    }
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Write `value` at `target` unless it is an empty container and a
/// container of the same kind is already there
fn place(output: &mut Value, target: &Path, value: Value) -> Result<(), path::TraversalError> {
    let keep = match (path::get(output, target), &value) {
        (Some(Value::Object(_)), Value::Object(_)) | (Some(Value::Array(_)), Value::Array(_)) => {
            is_empty_container(&value)
        }
        _ => false,
    };
    if !keep {
        path::set(output, target, &value)?;
    }
    Ok(())
}

impl Engine {
    /// Run the pipeline over `document`. Node failures are reported in the
    /// outcome and never stop the run.
    pub fn transform(&self, document: &Value) -> TransformOutcome {
        Execution::new(self, document).run()
    }
}
