//! Error types for the fieldgraph core library
//!
//! Structural-edit and option-validation rejections are [`ValidationError`]s:
//! they leave the engine untouched and carry enough structure to point at the
//! offending field. Failures of individual transform nodes during execution
//! are not errors of `transform` at all; they are collected in its outcome.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::field::{FieldId, FieldType};
use crate::lineage::NodeId;
use crate::ops::OperationKind;
use crate::path::{Path, TraversalError};
use crate::topology::Relation;
use thiserror::Error;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum Error {
    /// A mutation was rejected; the engine is unchanged
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A path could not be walked through a document
    #[error("Traversal failed: {0}")]
    Traversal(#[from] TraversalError),

    /// A serialized engine could not be loaded
    #[error("Failed to load engine: {message}")]
    Deserialization {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Replaying a field's lineage disagrees with the registry
    #[error("Lineage integrity violated for field {field}: {message}")]
    Integrity { field: FieldId, message: String },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a mutation of the engine is refused
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("field {field} cannot take '{path}': the address belongs to field {owner}")]
    Collision {
        field: FieldId,
        path: Path,
        owner: FieldId,
    },

    #[error("field {field} cannot move from '{from}' to '{to}': the target is at a different array nesting level")]
    CrossLevelMove { field: FieldId, from: Path, to: Path },

    #[error("field {field} cannot take '{path}': ancestor field {ancestor} at '{ancestor_path}' is {ancestor_type}, expected {expected}")]
    NonContainerAncestor {
        field: FieldId,
        path: Path,
        ancestor: FieldId,
        ancestor_path: Path,
        ancestor_type: FieldType,
        expected: FieldType,
    },

    #[error("field {field} of type {field_type} cannot be merged into '{path}': only object fields can be merged into their parent")]
    NotMergeable {
        field: FieldId,
        path: Path,
        field_type: FieldType,
    },

    #[error("address '{path}' already resolves to enabled field {owner}")]
    AmbiguousAddress { path: Path, owner: FieldId },

    #[error("unknown field {0}")]
    UnknownField(FieldId),

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("invalid options for {operation}: {reason}")]
    InvalidOptions {
        operation: OperationKind,
        reason: String,
    },

    #[error("{operation} cannot map '{from}' to '{to}': {} relation is not supported", relation_label(.relation))]
    IncompatibleRelation {
        operation: OperationKind,
        from: Path,
        to: Path,
        relation: (Relation, Relation),
    },

    #[error("field {field} is used by transformation node {node}")]
    FieldInUse { field: FieldId, node: NodeId },

    #[error("edge {from} -> {to} would create a cycle")]
    Cycle { from: NodeId, to: NodeId },

    #[error("property key path must not be empty")]
    EmptyPropertyKey,
}

fn relation_label(relation: &(Relation, Relation)) -> String {
    format!("{}-to-{}", relation.0, relation.1)
}

impl ValidationError {
    /// The field a caller should highlight, if the rejection concerns one
    pub fn field(&self) -> Option<FieldId> {
        match self {
            ValidationError::Collision { field, .. }
            | ValidationError::CrossLevelMove { field, .. }
            | ValidationError::NonContainerAncestor { field, .. }
            | ValidationError::NotMergeable { field, .. }
            | ValidationError::FieldInUse { field, .. } => Some(*field),
            ValidationError::AmbiguousAddress { owner, .. } => Some(*owner),
            ValidationError::UnknownField(field) => Some(*field),
            ValidationError::UnknownNode(_)
            | ValidationError::InvalidOptions { .. }
            | ValidationError::IncompatibleRelation { .. }
            | ValidationError::Cycle { .. }
            | ValidationError::EmptyPropertyKey => None,
        }
    }
}

impl Error {
    /// The validation failure behind this error, if any
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(err) => Some(err),
            _ => None,
        }
    }

    /// The field a caller should highlight, if any
    pub fn field(&self) -> Option<FieldId> {
        match self {
            Error::Validation(err) => err.field(),
            Error::Integrity { field, .. } => Some(*field),
            _ => None,
        }
    }

    pub(crate) fn deserialization(message: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Error::Deserialization {
            message: message.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}
