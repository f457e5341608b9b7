//! Property-based tests for structural edits
//!
//! Random sequences of renames, moves and merges over a three-level object
//! document and a document with arrays nested in arrays. Whatever sequence is applied, the registry must agree with the
//! replayed lineage, rejected edits must leave no trace and every leaf value
//! must land at its field's output path.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use fieldgraph_core::path;
use fieldgraph_core::{Engine, FieldId, Path};
use proptest::prelude::*;
use serde_json::{json, Value};

fn document() -> Value {
    json!({
        "a": {
            "b": {"c": 1, "d": 2},
            "e": 3
        },
        "f": {"g": 4}
    })
}

fn array_document() -> Value {
    json!({
        "o": [
            {"l": [{"s": 1}, {"s": 2}], "k": 3},
            {"l": [{"s": 4}], "k": 5}
        ],
        "t": {"u": 6}
    })
}

fn documents() -> impl Strategy<Value = Value> {
    prop_oneof![Just(document()), Just(array_document())]
}

#[derive(Debug, Clone)]
enum Edit {
    /// Give the field a new last key, keeping its parent
    Rename { field: usize, key: &'static str },
    /// Move the field under another field's output path
    MoveUnder { field: usize, target: usize, key: &'static str },
    /// Merge the field into the root
    ToRoot { field: usize },
}

fn key_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("x"), Just("y"), Just("z"), Just("c"), Just("e"), Just("s"), Just("l")]
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => (0usize..12, key_strategy()).prop_map(|(field, key)| Edit::Rename { field, key }),
        3 => (0usize..12, 0usize..12, key_strategy())
            .prop_map(|(field, target, key)| Edit::MoveUnder { field, target, key }),
        1 => (0usize..12).prop_map(|field| Edit::ToRoot { field }),
    ]
}

fn requested_path(engine: &Engine, edit: &Edit) -> Option<(FieldId, Path)> {
    let ids = engine.all_field_ids();
    match edit {
        Edit::Rename { field, key } => {
            let id = ids[*field % ids.len()];
            let parent = engine.output_path(id).ok()?.parent()?;
            Some((id, parent.child(*key)))
        }
        Edit::MoveUnder { field, target, key } => {
            let id = ids[*field % ids.len()];
            let target = engine.output_path(ids[*target % ids.len()]).ok()?;
            Some((id, target.child(*key)))
        }
        Edit::ToRoot { field } => Some((ids[*field % ids.len()], Path::root())),
    }
}

fn check_leaves(engine: &Engine, doc: &Value) -> Result<(), TestCaseError> {
    let outcome = engine.transform(doc);
    prop_assert!(outcome.is_success(), "errors: {:?}", outcome.errors);
    for id in engine.all_field_ids() {
        if engine.field_type(id).unwrap().is_container() {
            continue;
        }
        let values = |doc: &Value, pattern: &Path| -> Vec<Value> {
            path::search(doc, pattern).into_iter().map(|found| found.value.clone()).collect()
        };
        let expected = values(doc, engine.input_path(id).unwrap());
        let actual = values(&outcome.document, engine.output_path(id).unwrap());
        prop_assert_eq!(actual, expected, "field {} at {}", id, engine.output_path(id).unwrap());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: any edit sequence keeps registry and lineage in agreement
    #[test]
    fn prop_edit_sequences_keep_integrity(
        doc in documents(),
        edits in prop::collection::vec(edit_strategy(), 1..12),
    ) {
        let mut engine = Engine::from_sample(&doc).unwrap();
        check_leaves(&engine, &doc)?;

        for edit in &edits {
            let Some((id, path)) = requested_path(&engine, edit) else {
                continue;
            };
            let before = engine.clone();
            match engine.set_output_path(id, path) {
                Ok(()) => {
                    prop_assert!(engine.verify_integrity().is_empty(), "{:?}", engine.verify_integrity());
                    check_leaves(&engine, &doc)?;
                }
                Err(_) => {
                    prop_assert_eq!(&engine, &before);
                }
            }
        }

        let reloaded = Engine::load(engine.to_json().unwrap()).unwrap();
        prop_assert_eq!(&reloaded, &engine);
        prop_assert_eq!(reloaded.transform(&doc), engine.transform(&doc));
    }

    /// Property: renaming a field to where it already is changes nothing
    #[test]
    fn prop_rename_to_current_is_a_no_op(
        doc in documents(),
        edits in prop::collection::vec(edit_strategy(), 0..6),
        pick in 0usize..12,
    ) {
        let mut engine = Engine::from_sample(&doc).unwrap();
        for edit in &edits {
            if let Some((id, path)) = requested_path(&engine, edit) {
                let _ = engine.set_output_path(id, path);
            }
        }

        let ids = engine.all_field_ids();
        let id = ids[pick % ids.len()];
        let current = engine.output_path(id).unwrap().clone();
        let before = engine.clone();
        engine.set_output_path(id, current).unwrap();
        prop_assert_eq!(engine, before);
    }
}

#[test]
fn test_object_document_field_count() {
    let engine = Engine::from_sample(&document()).unwrap();
    assert_eq!(engine.all_field_ids().len(), 7);
}
