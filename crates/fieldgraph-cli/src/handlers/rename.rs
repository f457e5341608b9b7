//! Rename command handler
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::utils::{parse_output_path, read_engine, resolve_field, write_engine};
use crate::cli::{OutputFormat, RenameArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::{display_path, OutputWriter};
use serde_json::json;
use tracing::{info, instrument};

/// Handle the rename command
#[instrument(skip_all, fields(engine = %args.engine.display(), field = %args.field, to = %args.new_path))]
pub fn handle_rename(args: RenameArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let mut engine = read_engine(&args.engine)?;
    let id = resolve_field(&engine, &args.field)?;
    let from = engine.output_path(id)?.clone();

    let requested = parse_output_path(&engine, &args.new_path);
    engine.set_output_path(id, requested)?;
    let to = engine.output_path(id)?.clone();
    info!(field = %id, from = %from, to = %to, "Field moved");

    let target = match (&args.save_to, args.dry_run) {
        (_, true) => None,
        (Some(path), false) => Some(path.clone()),
        (None, false) => Some(args.engine.clone()),
    };
    if let Some(path) = &target {
        write_engine(&engine, path, config.output.pretty)?;
    }

    let message = format!(
        "Moved field {} from '{}' to '{}'",
        id,
        display_path(&from),
        display_path(&to)
    );
    match &target {
        Some(path) => output.success(&format!("{}; engine written to {}", message, path.display()))?,
        None => output.info(&format!("{} (dry run, nothing written)", message))?,
    }
    if output.format() != OutputFormat::Human {
        output.data(&json!({
            "field": id,
            "from": from.to_string(),
            "to": to.to_string(),
            "written_to": target.as_ref().map(|path| path.display().to_string()),
        }))?;
    }
    Ok(())
}
