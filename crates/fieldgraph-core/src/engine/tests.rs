use super::*;
use crate::error::Error;
use crate::ops::{CastOptions, Delimiter, DuplicateOptions, SplitOptions};
use pretty_assertions::assert_eq;
use serde_json::json;

fn engine_for(doc: &Value) -> Engine {
    Engine::from_sample(doc).unwrap()
}

fn id(engine: &Engine, path: &str) -> FieldId {
    engine
        .field_id(&Path::from(path))
        .unwrap_or_else(|| panic!("no field at {}", path))
}

fn validation(err: Error) -> ValidationError {
    match err {
        Error::Validation(inner) => inner,
        other => panic!("expected a validation error, got {:?}", other),
    }
}

fn split(paths: &[&str]) -> Operation {
    Operation::Split(SplitOptions {
        delimiter: Delimiter::Text(" ".to_string()),
        new_field_paths: paths.iter().map(|p| Path::from(*p)).collect(),
    })
}

#[test]
fn test_rename_in_place() {
    let doc = json!({"name": "Ada", "age": 36});
    let mut engine = engine_for(&doc);
    engine.set_output_path(id(&engine, "name"), Path::from("full_name")).unwrap();

    let outcome = engine.transform(&doc);
    assert!(outcome.is_success());
    assert_eq!(outcome.document, json!({"full_name": "Ada", "age": 36}));
}

#[test]
fn test_rename_one_instance_renames_the_pattern() {
    let doc = json!({"foo": [{"bar": 1}, {"bar": 2}]});
    let mut engine = engine_for(&doc);
    let bar = id(&engine, "foo.*.bar");
    engine.set_output_path(bar, Path::from("foo.3.cool")).unwrap();

    assert_eq!(engine.output_path(bar).unwrap(), &Path::from("foo.*.cool"));
    assert_eq!(
        engine.transform(&doc).document,
        json!({"foo": [{"cool": 1}, {"cool": 2}]})
    );
}

#[test]
fn test_subjugation() {
    let doc = json!({"a": 1, "b": {"c": true}});
    let mut engine = engine_for(&doc);
    engine.set_output_path(id(&engine, "a"), Path::from("b.a")).unwrap();
    assert_eq!(engine.transform(&doc).document, json!({"b": {"a": 1, "c": true}}));
}

#[test]
fn test_promotion() {
    let doc = json!({"meta": {"school": "Home", "year": 1830}});
    let mut engine = engine_for(&doc);
    engine.set_output_path(id(&engine, "meta.school"), Path::from("school")).unwrap();
    assert_eq!(
        engine.transform(&doc).document,
        json!({"meta": {"year": 1830}, "school": "Home"})
    );
}

#[test]
fn test_merge_into_root() {
    let doc = json!({"meta": {"school": "Home"}, "n": 1});
    let mut engine = engine_for(&doc);
    let meta = id(&engine, "meta");
    engine.set_output_path(meta, Path::root()).unwrap();

    assert_eq!(engine.output_path(id(&engine, "meta.school")).unwrap(), &Path::from("school"));
    assert_eq!(engine.transform(&doc).document, json!({"school": "Home", "n": 1}));
    assert!(engine.verify_integrity().is_empty());
}

#[test]
fn test_moving_a_container_carries_its_children() {
    let doc = json!({"meta": {"school": "Home"}});
    let mut engine = engine_for(&doc);
    engine.set_output_path(id(&engine, "meta"), Path::from("info")).unwrap();

    assert_eq!(engine.output_path(id(&engine, "meta.school")).unwrap(), &Path::from("info.school"));
    assert_eq!(engine.transform(&doc).document, json!({"info": {"school": "Home"}}));
}

#[test]
fn test_rejected_edits_leave_the_engine_unchanged() {
    let doc = json!({"a": 1, "b": 2, "n": 3, "foo": [{"bar": 1}]});
    let mut engine = engine_for(&doc);
    let before = engine.clone();

    let err = engine.set_output_path(id(&engine, "a"), Path::from("b")).unwrap_err();
    assert!(matches!(validation(err), ValidationError::Collision { .. }));

    let err = engine.set_output_path(id(&engine, "a"), Path::from("n.a")).unwrap_err();
    assert!(matches!(validation(err), ValidationError::NonContainerAncestor { .. }));

    let err = engine.set_output_path(id(&engine, "foo.*.bar"), Path::from("bar")).unwrap_err();
    assert!(matches!(validation(err), ValidationError::CrossLevelMove { .. }));

    let err = engine.set_output_path(id(&engine, "a"), Path::root()).unwrap_err();
    assert!(matches!(validation(err), ValidationError::NotMergeable { .. }));

    assert!(engine.equals(&before));
}

#[test]
fn test_same_path_is_a_no_op() {
    let doc = json!({"foo": [{"bar": 1}]});
    let mut engine = engine_for(&doc);
    let before = engine.clone();
    engine.set_output_path(id(&engine, "foo.*.bar"), Path::from("foo.0.bar")).unwrap();
    assert_eq!(engine, before);
}

#[test]
fn test_disabled_field_is_left_out() {
    let doc = json!({"a": 1, "b": 2});
    let mut engine = engine_for(&doc);
    let a = id(&engine, "a");
    engine.disable_field(a).unwrap();
    assert_eq!(engine.transform(&doc).document, json!({"b": 2}));

    engine.set_output_path(id(&engine, "b"), Path::from("a")).unwrap();
    let err = engine.enable_field(a).unwrap_err();
    assert!(matches!(validation(err), ValidationError::Collision { .. }));
}

#[test]
fn test_cast_retypes_the_field() {
    let doc = json!({"n": "42"});
    let mut engine = engine_for(&doc);
    let n = id(&engine, "n");
    engine
        .append_transformation(
            Operation::Cast(CastOptions {
                to: FieldType::Integer,
                format: None,
            }),
            &[n],
        )
        .unwrap();

    assert_eq!(engine.field_type(n).unwrap(), FieldType::Integer);
    assert_eq!(engine.transform(&doc).document, json!({"n": 42}));
}

#[test]
fn test_split_creates_synthetic_fields() {
    let doc = json!({"people": [{"name": "Ada Lovelace"}, {"name": "Alan Turing"}]});
    let mut engine = engine_for(&doc);
    let name = id(&engine, "people.*.name");
    let node = engine
        .append_transformation(split(&["people.*.first", "people.*.last"]), &[name])
        .unwrap();

    let transform = engine.transformation(node).unwrap();
    assert_eq!(transform.new_fields.len(), 2);
    let first = transform.new_fields[0];
    assert_eq!(engine.field_type(first).unwrap(), FieldType::String);
    assert_eq!(engine.transformations_of(first), vec![node]);

    assert_eq!(
        engine.transform(&doc).document,
        json!({"people": [
            {"name": "Ada Lovelace", "first": "Ada", "last": "Lovelace"},
            {"name": "Alan Turing", "first": "Alan", "last": "Turing"}
        ]})
    );
}

#[test]
fn test_split_into_a_different_array_is_rejected() {
    let doc = json!({"people": [{"name": "Ada Lovelace"}]});
    let mut engine = engine_for(&doc);
    let before = engine.clone();
    let name = id(&engine, "people.*.name");
    let err = engine
        .append_transformation(split(&["first"]), &[name])
        .unwrap_err();
    assert!(matches!(validation(err), ValidationError::IncompatibleRelation { .. }));
    assert_eq!(engine, before);
}

#[test]
fn test_requested_path_already_taken() {
    let doc = json!({"name": "Ada Lovelace", "first": "x"});
    let mut engine = engine_for(&doc);
    let name = id(&engine, "name");
    let err = engine
        .append_transformation(split(&["first", "last"]), &[name])
        .unwrap_err();
    assert!(matches!(validation(err), ValidationError::AmbiguousAddress { .. }));
    assert!(engine.graph().nodes().all(|(_, node)| node.as_transform().is_none()));
}

#[test]
fn test_duplicate_many_to_one_collects_an_array() {
    let doc = json!({"xs": [{"v": 1}, {"v": 2}]});
    let mut engine = engine_for(&doc);
    let v = id(&engine, "xs.*.v");
    engine
        .append_transformation(
            Operation::Duplicate(DuplicateOptions {
                new_field_path: Path::from("all"),
            }),
            &[v],
        )
        .unwrap();

    let all = engine.output_field_id(&Path::from("all")).unwrap();
    assert_eq!(engine.field_type(all).unwrap(), FieldType::Array);
    let element = engine.output_field_id(&Path::from("all.*")).unwrap();
    assert_eq!(engine.field_type(element).unwrap(), FieldType::Integer);
    assert_eq!(engine.child_fields(all), vec![element]);

    let outcome = engine.transform(&doc);
    assert_eq!(outcome.document["all"], json!([1, 2]));
}

#[test]
fn test_failing_node_does_not_stop_the_run() {
    let doc = json!({"name": "Ada Lovelace", "n": "7", "tag": "x y"});
    let mut engine = engine_for(&doc);
    let name = id(&engine, "name");
    let n = id(&engine, "n");
    let tag = id(&engine, "tag");
    engine.append_transformation(split(&["first", "last"]), &[name]).unwrap();
    let bad = engine
        .append_transformation(
            Operation::Cast(CastOptions {
                to: FieldType::Boolean,
                format: None,
            }),
            &[n],
        )
        .unwrap();
    engine.append_transformation(split(&["left", "right"]), &[tag]).unwrap();

    let outcome = engine.transform(&doc);
    assert_eq!(outcome.status, ExecutionStatus::Failed);
    assert_eq!(outcome.errors.len(), 1);
    assert!(matches!(
        &outcome.errors[0],
        ExecutionError::Node { node, operation: OperationKind::Cast, .. } if *node == bad
    ));
    assert_eq!(outcome.document["n"], json!("7"));
    assert_eq!(outcome.document["first"], json!("Ada"));
    assert_eq!(outcome.document["right"], json!("y"));
}

#[test]
fn test_status_transitions() {
    assert!(ExecutionStatus::Ready.can_transition_to(ExecutionStatus::Running));
    assert!(ExecutionStatus::Running.can_transition_to(ExecutionStatus::Completed));
    assert!(ExecutionStatus::Running.can_transition_to(ExecutionStatus::Failed));
    assert!(!ExecutionStatus::Ready.can_transition_to(ExecutionStatus::Completed));
    assert!(!ExecutionStatus::Completed.can_transition_to(ExecutionStatus::Running));
    assert!(ExecutionStatus::Failed.is_terminal());
    assert!(!ExecutionStatus::Running.is_terminal());
}

#[test]
fn test_remove_field() {
    let doc = json!({"meta": {"school": "Home"}, "name": "Ada Lovelace"});
    let mut engine = engine_for(&doc);
    let meta = id(&engine, "meta");
    let school = id(&engine, "meta.school");
    assert_eq!(engine.remove_field(meta).unwrap(), vec![meta, school]);
    assert_eq!(engine.transform(&doc).document, json!({"name": "Ada Lovelace"}));

    let name = id(&engine, "name");
    engine.append_transformation(split(&["first"]), &[name]).unwrap();
    let err = engine.remove_field(name).unwrap_err();
    assert!(matches!(validation(err), ValidationError::FieldInUse { .. }));
}

#[test]
fn test_props() {
    let doc = json!({"a": 1});
    let mut engine = engine_for(&doc);
    let a = id(&engine, "a");
    engine.set_prop(a, &Path::from("display.label"), json!("A")).unwrap();
    assert_eq!(engine.prop(a, &Path::from("display.label")), Some(&json!("A")));
    assert_eq!(engine.props(a).unwrap(), json!({"display": {"label": "A"}}).as_object().unwrap());
}

#[test]
fn test_clone_is_independent() {
    let doc = json!({"a": 1});
    let engine = engine_for(&doc);
    let mut copy = engine.clone();
    copy.set_output_path(id(&copy, "a"), Path::from("b")).unwrap();
    assert_ne!(engine, copy);
    assert_eq!(engine.output_path(id(&engine, "a")).unwrap(), &Path::from("a"));
}
