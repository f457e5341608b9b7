//! Join command handler
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::utils::{read_engine, write_engine};
use crate::cli::JoinArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use fieldgraph_core::Engine;

/// Handle the join command
pub fn handle_join(args: JoinArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    if args.key.is_empty() || args.key.contains('.') {
        return Err(Error::invalid_args("--key must be a single, non-empty object key"));
    }
    let left = read_engine(&args.left)?;
    let right = read_engine(&args.right)?;

    let joined = Engine::merge_join(&left, &right, &args.key)?;

    match &args.save_to {
        Some(path) => {
            write_engine(&joined, path, config.output.pretty)?;
            output.success(&format!(
                "Joined {} under '{}.*'; engine written to {}",
                args.right.display(),
                args.key,
                path.display()
            ))
        }
        None => output.data(&joined.to_json()?),
    }
}
