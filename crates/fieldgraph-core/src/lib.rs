//! Fieldgraph Core - lineage-tracking document transformation engine
//!
//! An [`Engine`] describes how input JSON documents become output documents:
//! which fields exist, where each one is read from and written to, and
//! which operations run over them. Fields are addressed by [`Path`]s whose
//! wildcard waypoints stand for every element of an array, so one field
//! covers a whole column of array elements.
//!
//! # Main Components
//!
//! - **Paths**: waypoint sequences with wildcard-aware traversal
//! - **Field Registry**: per-field input path, output path, type and properties
//! - **Lineage Graph**: the DAG of identity and transform nodes that every
//!   structural edit is recorded in
//! - **Execution**: running the transform nodes in topological order and
//!   assembling the output document
//! - **Inference**: building an engine from sample documents
//!
//! # Example
//!
//! ```
//! use fieldgraph_core::{Engine, Path, Result};
//! use serde_json::json;
//!
//! fn example() -> Result<()> {
//!     let doc = json!({"foo": [{"bar": 1}, {"bar": 2}]});
//!     let mut engine = Engine::from_sample(&doc)?;
//!     let bar = engine.field_id(&Path::from("foo.*.bar")).expect("sampled");
//!     engine.set_output_path(bar, Path::from("foo.*.cool"))?;
//!
//!     let outcome = engine.transform(&doc);
//!     assert_eq!(outcome.document, json!({"foo": [{"cool": 1}, {"cool": 2}]}));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod construction;
pub mod engine;
pub mod error;
pub mod field;
pub mod lineage;
pub mod ops;
pub mod path;
pub mod registry;
pub mod topology;
pub mod tracker;

// Re-export main types for convenience
pub use construction::{Construction, ConstructionOptions};
pub use engine::{Engine, EngineSnapshot, ExecutionError, ExecutionStatus, IntegrityIssue, TransformOutcome};
pub use error::{Error, Result, ValidationError};
pub use field::{FieldId, FieldType};
pub use lineage::{EdgeKind, IdentityKind, LineageGraph, Node, NodeId};
pub use ops::{CastOptions, Delimiter, DuplicateOptions, Operation, OperationKind, SplitOptions};
pub use path::{Path, Waypoint};
pub use topology::Relation;
pub use tracker::{TypeConflict, TypeTracker};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
