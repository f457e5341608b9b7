//! Structural edit scenarios driven end to end through `transform`
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license


use fieldgraph_core::{Engine, Error, FieldType, Path, ValidationError};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_support::*;

#[test]
fn test_wildcard_rename_propagates_to_every_element() {
    let doc = json!({"foo": [{"bar": "hi"}, {"bar": "yo"}]});
    let mut engine = engine_for(&doc);
    let bar = field(&engine, "foo.*.bar");

    engine.set_output_path(bar, Path::from("foo.*.baz")).unwrap();

    assert_eq!(
        engine.transform(&doc).document,
        json!({"foo": [{"baz": "hi"}, {"baz": "yo"}]})
    );
}

#[test]
fn test_promotion_removes_the_wrapper() {
    let doc = json!({"meta": {"school": "Stanford", "sport": "bobsled"}});
    let mut engine = engine_for(&doc);
    let meta = field(&engine, "meta");

    engine.set_output_path(meta, Path::root()).unwrap();

    assert_eq!(
        engine.transform(&doc).document,
        json!({"school": "Stanford", "sport": "bobsled"})
    );
    assert!(engine.verify_integrity().is_empty());
}

#[test]
fn test_child_moves_after_parent_rename() {
    let doc = school_document();
    let mut engine = engine_for(&doc);
    let meta = field(&engine, "meta");
    let school = field(&engine, "meta.school");

    engine.set_output_path(meta, Path::from("info")).unwrap();
    engine.set_output_path(school, Path::from("info.alma_mater")).unwrap();
    engine.set_output_path(meta, Path::from("about")).unwrap();

    assert_eq!(output_of(&engine, school), "about.alma_mater");
    let outcome = engine.transform(&doc);
    assert_eq!(outcome.document["about"], json!({"alma_mater": "Home", "year": 1830}));
    assert!(outcome.document.get("meta").is_none());
    assert!(engine.verify_integrity().is_empty());
}

#[test]
fn test_subjugation_under_a_sibling() {
    let doc = school_document();
    let mut engine = engine_for(&doc);
    let name = field(&engine, "name");

    engine.set_output_path(name, Path::from("meta.name")).unwrap();

    let document = engine.transform(&doc).document;
    assert_eq!(
        document["meta"],
        json!({"school": "Home", "year": 1830, "name": "Ada Lovelace"})
    );
    assert!(document.get("name").is_none());
}

#[test]
fn test_rename_inside_an_array_of_arrays() {
    let doc = json!({"courses": [{"grades": [9, 10]}, {"grades": [10]}]});
    let mut engine = engine_for(&doc);
    let grades = field(&engine, "courses.*.grades");

    engine.set_output_path(grades, Path::from("courses.1.scores")).unwrap();

    assert_eq!(output_of(&engine, grades), "courses.*.scores");
    assert_eq!(output_of(&engine, field(&engine, "courses.*.grades.*")), "courses.*.scores.*");
    assert_eq!(
        engine.transform(&doc).document,
        json!({"courses": [{"scores": [9, 10]}, {"scores": [10]}]})
    );
}

#[test]
fn test_concrete_instance_renames_the_nested_pattern() {
    let doc = nested_array_document();
    let mut engine = engine_for(&doc);
    let b = field(&engine, "d.*.*.b");

    engine.set_output_path(b, Path::from("d.0.1.c")).unwrap();

    assert_eq!(output_of(&engine, b), "d.*.*.c");
    assert_eq!(
        engine.transform(&doc).document,
        json!({"d": [[{"c": 1}, {"c": 2}], [{"c": 3}]]})
    );
}

#[test]
fn test_renaming_to_the_current_path_changes_nothing() {
    let doc = school_document();
    let mut engine = engine_for(&doc);
    let before = engine.to_json().unwrap();

    let title = field(&engine, "courses.*.title");
    engine.set_output_path(title, Path::from("courses.*.title")).unwrap();
    engine.set_output_path(title, Path::from("courses.4.title")).unwrap();

    assert_eq!(engine.to_json().unwrap(), before);
}

#[test]
fn test_failed_edits_are_atomic() {
    let doc = school_document();
    let mut engine = engine_for(&doc);
    let meta = field(&engine, "meta");
    engine.set_output_path(meta, Path::from("info")).unwrap();
    let before = engine.clone();

    let attempts = [
        (field(&engine, "name"), Path::from("info")),
        (field(&engine, "name"), Path::from("info.year.name")),
        (field(&engine, "courses.*.title"), Path::from("title")),
        (field(&engine, "tags.*"), Path::from("labels.*")),
        (field(&engine, "name"), Path::root()),
    ];
    for (id, path) in attempts {
        let result = engine.set_output_path(id, path.clone());
        assert!(
            matches!(result, Err(Error::Validation(_))),
            "moving field {} to '{}' should be rejected, got {:?}",
            id,
            path,
            result
        );
        assert_eq!(engine, before);
        assert_eq!(engine.graph().edges(), before.graph().edges());
    }
}

#[test]
fn test_moving_a_container_keeps_children_addressable() {
    let doc = school_document();
    let mut engine = engine_for(&doc);
    let courses = field(&engine, "courses");

    engine.set_output_path(courses, Path::from("classes")).unwrap();

    let title = field(&engine, "courses.*.title");
    assert_eq!(output_of(&engine, title), "classes.*.title");
    assert_eq!(engine.output_field_id(&Path::from("classes.*.title")), Some(title));
    assert_eq!(engine.transform(&doc).document["classes"][1]["title"], json!("Engines"));
}

#[test]
fn test_collision_reports_the_owner() {
    let doc = school_document();
    let mut engine = engine_for(&doc);
    let name = field(&engine, "name");
    let tags = field(&engine, "tags");

    let err = engine.set_output_path(name, Path::from("tags")).unwrap_err();
    match err.as_validation() {
        Some(ValidationError::Collision { field, owner, .. }) => {
            assert_eq!(*field, name);
            assert_eq!(*owner, tags);
        }
        other => panic!("expected a collision, got {:?}", other),
    }
    assert_eq!(err.field(), Some(name));
}

#[test]
fn test_object_field_moved_under_a_renamed_object() {
    let doc = json!({"a": {"x": 1}, "b": {"y": 2}});
    let mut engine = engine_for(&doc);
    let a = field(&engine, "a");
    let b = field(&engine, "b");

    engine.set_output_path(b, Path::from("c")).unwrap();
    engine.set_output_path(a, Path::from("c.a")).unwrap();

    assert_eq!(engine.field_type(a).unwrap(), FieldType::Object);
    assert_eq!(output_of(&engine, field(&engine, "a.x")), "c.a.x");
    assert_eq!(engine.transform(&doc).document, json!({"c": {"y": 2, "a": {"x": 1}}}));

    let text = engine.to_json_string().unwrap();
    let reloaded = Engine::load(&text).unwrap();
    assert_eq!(reloaded.transform(&doc), engine.transform(&doc));
}
