//! Fields command handler
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::utils::read_engine;
use crate::cli::FieldsArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::{display_path, FieldRow, OutputWriter};
use fieldgraph_core::Engine;

/// Rows for every field of `engine`, ordered by output path
pub fn field_rows(engine: &Engine, include_disabled: bool) -> Result<Vec<FieldRow>> {
    let mut rows = Vec::new();
    for id in engine.all_field_ids() {
        let enabled = engine.is_enabled(id);
        if !enabled && !include_disabled {
            continue;
        }
        rows.push(FieldRow {
            id: id.0,
            input_path: display_path(engine.input_path(id)?),
            output_path: display_path(engine.output_path(id)?),
            field_type: engine.field_type(id)?.to_string(),
            enabled,
            transformations: engine.transformations_of(id).into_iter().map(|node| node.0).collect(),
        });
    }
    rows.sort_by(|a, b| a.output_path.cmp(&b.output_path).then(a.id.cmp(&b.id)));
    Ok(rows)
}

/// Handle the fields command
pub fn handle_fields(args: FieldsArgs, _config: &Config, output: &mut OutputWriter) -> Result<()> {
    let engine = read_engine(&args.engine)?;
    let rows = field_rows(&engine, args.all)?;
    output.fields(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldgraph_core::{CastOptions, FieldType, Operation, Path};
    use serde_json::json;

    #[test]
    fn test_rows_follow_output_paths() {
        let mut engine = Engine::from_sample(&json!({"meta": {"year": "1830"}, "name": "Ada"})).unwrap();
        let year = engine.field_id(&Path::from("meta.year")).unwrap();
        let name = engine.field_id(&Path::from("name")).unwrap();
        engine.set_output_path(year, Path::from("meta.founded")).unwrap();
        let node = engine
            .append_transformation(
                Operation::Cast(CastOptions {
                    to: FieldType::Integer,
                    format: None,
                }),
                &[year],
            )
            .unwrap();
        engine.disable_field(name).unwrap();

        let rows = field_rows(&engine, false).unwrap();
        let paths: Vec<&str> = rows.iter().map(|row| row.output_path.as_str()).collect();
        assert_eq!(paths, vec!["meta", "meta.founded"]);
        assert_eq!(rows[1].input_path, "meta.year");
        assert_eq!(rows[1].transformations, vec![node.0]);

        let rows = field_rows(&engine, true).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().any(|row| row.id == name.0 && !row.enabled));
    }
}
