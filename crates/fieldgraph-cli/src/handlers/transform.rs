//! Transform command handler
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::utils::{read_document, read_engine, write_value};
use crate::cli::TransformArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use serde_json::Value;
use tracing::{instrument, warn};

/// Handle the transform command
#[instrument(skip_all, fields(engine = %args.engine.display(), documents = args.documents.len()))]
pub fn handle_transform(args: TransformArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("transform_command", &format!("engine: {}", args.engine.display()));
    let engine = read_engine(&args.engine)?;

    let mut outcomes = Vec::with_capacity(args.documents.len());
    for path in &args.documents {
        let document = read_document(path)?;
        let outcome = engine.transform(&document);
        if !outcome.errors.is_empty() {
            warn!(
                document = %path.display(),
                errors = outcome.errors.len(),
                "Transformation finished with errors"
            );
        }
        outcomes.push((path, outcome));
    }

    match &args.save_to {
        Some(target) => {
            let mut documents: Vec<Value> = outcomes.iter().map(|(_, outcome)| outcome.document.clone()).collect();
            let saved = if documents.len() == 1 {
                documents.remove(0)
            } else {
                Value::Array(documents)
            };
            write_value(&saved, target, config.output.pretty)?;
            for (path, outcome) in &outcomes {
                for error in &outcome.errors {
                    output.warning(&format!("{}: {}", path.display(), error))?;
                }
            }
            output.success(&format!(
                "Transformed {} document(s) into {}",
                outcomes.len(),
                target.display()
            ))?;
        }
        None => {
            let titled = outcomes.len() > 1;
            for (path, outcome) in &outcomes {
                if titled {
                    output.section(&path.display().to_string())?;
                }
                output.outcome(outcome)?;
            }
        }
    }

    if args.strict {
        if let Some((path, outcome)) = outcomes.iter().find(|(_, outcome)| !outcome.errors.is_empty()) {
            return Err(Error::TransformFailed {
                path: path.to_path_buf(),
                count: outcome.errors.len(),
            });
        }
    }
    Ok(())
}
