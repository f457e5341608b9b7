//! Shared utilities for command handlers
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use fieldgraph_core::{Engine, FieldId, FieldType, Path, Waypoint};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path as FsPath;
use tracing::debug;

fn is_yaml(path: &FsPath) -> bool {
    matches!(path.extension().and_then(|s| s.to_str()), Some("yaml") | Some("yml"))
}

/// Read a JSON or YAML document, chosen by extension
pub fn read_document(path: &FsPath) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    debug!("Read {} bytes from {}", content.len(), path.display());

    let invalid = |expected: &str, reason: String| Error::InvalidFormat {
        path: path.to_path_buf(),
        expected: expected.to_string(),
        reason,
    };
    if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|e| invalid("YAML", e.to_string()))
    } else {
        serde_json::from_str(&content).map_err(|e| invalid("JSON", e.to_string()))
    }
}

/// Load a serialized engine
pub fn read_engine(path: &FsPath) -> Result<Engine> {
    let value = read_document(path)?;
    let engine = Engine::load(value)?;
    debug!("Loaded engine with {} field(s) from {}", engine.all_field_ids().len(), path.display());
    Ok(engine)
}

/// Write `value` as YAML or JSON, chosen by extension
pub fn write_value<T: Serialize>(value: &T, path: &FsPath, pretty: bool) -> Result<()> {
    let content = if is_yaml(path) {
        serde_yaml::to_string(value)?
    } else if pretty {
        serde_json::to_string_pretty(value)? + "\n"
    } else {
        serde_json::to_string(value)?
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

pub fn write_engine(engine: &Engine, path: &FsPath, pretty: bool) -> Result<()> {
    write_value(&engine.to_json()?, path, pretty)
}

/// Resolve a field given by id, by input path or by output path.
///
/// Digit segments are read as array indices first. When that finds nothing
/// the reference is compared with the dotted form the `fields` listing
/// prints, which also reaches object keys made of digits.
pub fn resolve_field(engine: &Engine, reference: &str) -> Result<FieldId> {
    if let Ok(raw) = reference.parse::<u64>() {
        let id = FieldId(raw);
        if engine.input_path(id).is_ok() {
            return Ok(id);
        }
    }
    let path = parse_path(reference);
    engine
        .field_id(&path)
        .or_else(|| engine.output_field_id(&path))
        .or_else(|| find_by_text(engine, &path.to_string()))
        .ok_or_else(|| Error::FieldNotFound {
            reference: reference.to_string(),
        })
}

fn find_by_text(engine: &Engine, text: &str) -> Option<FieldId> {
    let ids = engine.all_field_ids();
    let spelled = |path: Option<&Path>| path.is_some_and(|path| path.to_string() == text);
    ids.iter()
        .copied()
        .find(|id| spelled(engine.input_path(*id).ok()))
        .or_else(|| ids.iter().copied().find(|id| spelled(engine.output_path(*id).ok())))
}

/// Dotted path from the command line; `.` names the root
pub fn parse_path(text: &str) -> Path {
    match text.trim() {
        "." => Path::root(),
        other => Path::from(other),
    }
}

/// Dotted output path for a rename. A digit segment directly below an
/// object field's output path is an object key, not an array index.
pub fn parse_output_path(engine: &Engine, text: &str) -> Path {
    let mut path = Path::root();
    for waypoint in parse_path(text).iter() {
        let waypoint = match waypoint {
            Waypoint::Index(index) if owned_by_object(engine, &path) => Waypoint::key(index.to_string()),
            other => other.clone(),
        };
        path = path.child(waypoint);
    }
    path
}

fn owned_by_object(engine: &Engine, path: &Path) -> bool {
    engine
        .output_field_id(path)
        .and_then(|id| engine.field_type(id).ok())
        == Some(FieldType::Object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::{Builder, TempDir};

    #[test]
    fn test_read_yaml_and_json_documents() {
        let mut yaml = Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(yaml, "name: Ada\ntags: [math, poetry]").unwrap();
        assert_eq!(
            read_document(yaml.path()).unwrap(),
            json!({"name": "Ada", "tags": ["math", "poetry"]})
        );

        let mut text = Builder::new().suffix(".json").tempfile().unwrap();
        write!(text, "{{\"id\": 1}}").unwrap();
        assert_eq!(read_document(text.path()).unwrap(), json!({"id": 1}));
    }

    #[test]
    fn test_malformed_document() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{\"id\": ").unwrap();
        match read_document(file.path()) {
            Err(Error::InvalidFormat { expected, .. }) => assert_eq!(expected, "JSON"),
            other => panic!("expected an invalid format error, got {:?}", other),
        }
    }

    #[test]
    fn test_engine_round_trip_through_files() {
        let dir = TempDir::new().unwrap();
        let engine = Engine::from_sample(&json!({"meta": {"school": "Home"}})).unwrap();

        for name in ["engine.json", "engine.yaml"] {
            let path = dir.path().join(name);
            write_engine(&engine, &path, true).unwrap();
            assert_eq!(read_engine(&path).unwrap(), engine);
        }
    }

    #[test]
    fn test_resolve_field() {
        let mut engine = Engine::from_sample(&json!({"meta": {"school": "Home"}, "name": "Ada"})).unwrap();
        let school = engine.field_id(&Path::from("meta.school")).unwrap();
        engine.set_output_path(school, Path::from("school")).unwrap();

        assert_eq!(resolve_field(&engine, "meta.school").unwrap(), school);
        assert_eq!(resolve_field(&engine, "school").unwrap(), school);
        assert_eq!(resolve_field(&engine, &school.to_string()).unwrap(), school);
        assert!(matches!(
            resolve_field(&engine, "missing"),
            Err(Error::FieldNotFound { .. })
        ));
        assert!(matches!(resolve_field(&engine, "999"), Err(Error::FieldNotFound { .. })));
    }

    #[test]
    fn test_resolve_digit_object_key() {
        let engine = Engine::from_sample(&json!({"codes": {"3": "three"}, "tags": ["a"]})).unwrap();
        let three = engine
            .field_id(&Path::new(vec![Waypoint::key("codes"), Waypoint::key("3")]))
            .unwrap();

        assert_eq!(resolve_field(&engine, "codes.3").unwrap(), three);
        assert!(matches!(
            resolve_field(&engine, "codes.4"),
            Err(Error::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_rename_under_object_with_digit_key() {
        let mut engine = Engine::from_sample(&json!({"codes": {"3": "three"}, "rows": [["x"]]})).unwrap();
        let three = resolve_field(&engine, "codes.3").unwrap();

        let target = parse_output_path(&engine, "codes.4");
        assert_eq!(target, Path::new(vec![Waypoint::key("codes"), Waypoint::key("4")]));
        engine.set_output_path(three, target).unwrap();
        assert_eq!(
            engine.transform(&json!({"codes": {"3": "three"}})).document,
            json!({"codes": {"4": "three"}})
        );

        // Below arrays and unknown parents digits stay indices
        assert_eq!(parse_output_path(&engine, "rows.0"), Path::from("rows.0"));
        assert_eq!(parse_output_path(&engine, "fresh.2"), Path::from("fresh.2"));
    }

    #[test]
    fn test_parse_path() {
        assert!(parse_path(".").is_root());
        assert_eq!(parse_path("orders.*.sku"), Path::from("orders.*.sku"));
    }
}
