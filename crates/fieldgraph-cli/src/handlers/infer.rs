//! Infer command handler
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::utils::{read_document, write_engine};
use crate::cli::InferArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use fieldgraph_core::{ConstructionOptions, Engine};
use tracing::{info, instrument};

/// Command-line flags layered over the `construction` section of the config
fn construction_options(args: &InferArgs, config: &Config) -> Result<ConstructionOptions> {
    let mut options = config.construction.clone();
    if args.interpret_strings {
        options.interpret_strings = true;
    }
    if let Some(limit) = args.array_limit {
        if limit == 0 {
            return Err(Error::invalid_args("--array-limit must be at least 1"));
        }
        options.array_sample_limit = limit;
    }
    Ok(options)
}

/// Handle the infer command
#[instrument(skip_all, fields(samples = args.samples.len()))]
pub fn handle_infer(args: InferArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("infer_command", &format!("{} sample(s)", args.samples.len()));
    let options = construction_options(&args, config)?;

    let documents = args
        .samples
        .iter()
        .map(|path| read_document(path))
        .collect::<Result<Vec<_>>>()?;
    output.info(&format!("Inferring an engine from {} document(s)", documents.len()))?;

    let construction = Engine::from_documents(&documents, &options)?;
    let field_count = construction.engine.all_field_ids().len();
    info!(fields = field_count, conflicts = construction.total_conflicts, "Engine inferred");

    for conflict in &construction.conflicts {
        output.warning(conflict)?;
    }
    let unreported = construction.total_conflicts - construction.conflicts.len();
    if unreported > 0 {
        output.warning(&format!("... and {} more type conflict(s)", unreported))?;
    }

    match &args.save_to {
        Some(path) => {
            write_engine(&construction.engine, path, config.output.pretty)?;
            output.success(&format!(
                "Inferred {} field(s); engine written to {}",
                field_count,
                path.display()
            ))
        }
        None => output.data(&construction.engine.to_json()?),
    }
}
