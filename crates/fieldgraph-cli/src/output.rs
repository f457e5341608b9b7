//! Output formatting and writing utilities
//!
//! Results are written in the selected [`OutputFormat`]. Machine formats
//! (JSON, YAML) carry only data; informational messages, section headers
//! and tables are shown in the human format alone.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use fieldgraph_core::{ExecutionError, Path, TransformOutcome};
use serde::Serialize;
use std::io::{self, Write};
use tracing::{debug, trace};

/// One line of the `fields` listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRow {
    pub id: u64,
    pub input_path: String,
    pub output_path: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub enabled: bool,
    /// Transform nodes consuming or producing the field, in execution order
    pub transformations: Vec<u64>,
}

/// Dotted form of a path, with the root spelled out
pub fn display_path(path: &Path) -> String {
    if path.is_root() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format the result of applying an engine to one document
    fn format_outcome(&self, outcome: &TransformOutcome) -> Result<String>;

    /// Format a field listing
    fn format_fields(&self, rows: &[FieldRow]) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_outcome(&self, outcome: &TransformOutcome) -> Result<String> {
        match self {
            OutputFormat::Human => format_outcome_human(outcome),
            _ => self.format(outcome),
        }
    }

    fn format_fields(&self, rows: &[FieldRow]) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_fields_human(rows)),
            _ => self.format(&rows),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self::with_writer(format, use_color, quiet, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(format: OutputFormat, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || !self.is_human() {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }
        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        trace!("Outputting {} bytes of data", formatted.len());
        self.emit(&formatted)
    }

    /// Write the result of one transformation
    pub fn outcome(&mut self, outcome: &TransformOutcome) -> Result<()> {
        let formatted = self.format.format_outcome(outcome)?;
        self.emit(&formatted)
    }

    /// Write a field listing
    pub fn fields(&mut self, rows: &[FieldRow]) -> Result<()> {
        let formatted = self.format.format_fields(rows)?;
        self.emit(&formatted)
    }

    fn emit(&mut self, formatted: &str) -> Result<()> {
        if formatted.ends_with('\n') {
            self.write(formatted)
        } else {
            self.writeln(formatted)
        }
    }
}

fn format_outcome_human(outcome: &TransformOutcome) -> Result<String> {
    let mut output = String::new();

    if outcome.errors.is_empty() {
        output.push_str(&format!("Status: {}\n", outcome.status));
    } else {
        output.push_str(&format!(
            "Status: {} ({} error(s))\n",
            outcome.status,
            outcome.errors.len()
        ));
        for error in &outcome.errors {
            let stage = match error {
                ExecutionError::Node { .. } => "node",
                ExecutionError::Output { .. } => "output",
            };
            output.push_str(&format!("  • [{}] {}\n", stage, error));
        }
    }
    output.push_str(&serde_json::to_string_pretty(&outcome.document)?);
    output.push('\n');

    Ok(output)
}

fn format_fields_human(rows: &[FieldRow]) -> String {
    let headers = ["ID", "INPUT", "OUTPUT", "TYPE", "ENABLED", "NODES"];
    let cells: Vec<[String; 6]> = rows
        .iter()
        .map(|row| {
            [
                row.id.to_string(),
                row.input_path.clone(),
                row.output_path.clone(),
                row.field_type.clone(),
                if row.enabled { "yes" } else { "no" }.to_string(),
                row.transformations
                    .iter()
                    .map(|node| node.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |values: Vec<&str>| {
        values
            .iter()
            .zip(widths)
            .map(|(value, width)| format!("{:width$}", value, width = width))
            .collect::<Vec<_>>()
            .join(" │ ")
            .trim_end()
            .to_string()
    };

    let mut output = String::new();
    output.push_str(&line(headers.to_vec()));
    output.push('\n');
    output.push_str(&widths.map(|w| "─".repeat(w)).join("─┼─"));
    output.push('\n');
    for row in &cells {
        output.push_str(&line(row.iter().map(String::as_str).collect()));
        output.push('\n');
    }
    output
}
