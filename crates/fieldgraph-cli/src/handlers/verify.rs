//! Verify command handler
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::utils::read_engine;
use crate::cli::{OutputFormat, VerifyArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use serde_json::json;

/// Handle the verify command
pub fn handle_verify(args: VerifyArgs, _config: &Config, output: &mut OutputWriter) -> Result<()> {
    let engine = read_engine(&args.engine)?;
    let issues = engine.verify_integrity();

    if output.format() == OutputFormat::Human {
        if issues.is_empty() {
            output.success(&format!(
                "{} is consistent ({} field(s))",
                args.engine.display(),
                engine.all_field_ids().len()
            ))?;
        }
        for issue in &issues {
            output.warning(&issue.to_string())?;
        }
    } else {
        output.data(&json!({
            "consistent": issues.is_empty(),
            "issues": issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
        }))?;
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Integrity(issues.len()))
    }
}
