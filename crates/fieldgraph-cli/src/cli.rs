//! Command-line interface argument parsing and definitions
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// fieldgraph - infer, edit and apply document transformation engines
///
/// Engines are inferred from sample JSON or YAML documents, edited by
/// moving fields to new output paths, and then applied to documents of the
/// same shape.
#[derive(Parser, Debug)]
#[command(
    name = "fieldgraph",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "FIELDGRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results [default: from config, else human]
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Infer an engine from one or more sample documents
    Infer(InferArgs),

    /// Apply an engine to documents
    Transform(TransformArgs),

    /// List the fields of an engine
    Fields(FieldsArgs),

    /// Move a field (and everything nested under it) to a new output path
    Rename(RenameArgs),

    /// Build an engine shaped like `right` joined under `key.*` of `left`
    Join(JoinArgs),

    /// Check an engine's registry against its lineage graph
    Verify(VerifyArgs),
}

/// Arguments for the infer command
#[derive(Parser, Debug)]
pub struct InferArgs {
    /// Sample documents (JSON or YAML)
    #[arg(value_name = "SAMPLE", required = true, num_args = 1..)]
    pub samples: Vec<PathBuf>,

    /// Let string-encoded numbers and booleans refine inferred types
    #[arg(long)]
    pub interpret_strings: bool,

    /// Maximum number of elements sampled per array
    #[arg(long, value_name = "N")]
    pub array_limit: Option<usize>,

    /// Write the engine to a file instead of stdout
    #[arg(long = "save-to", value_name = "ENGINE_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the transform command
#[derive(Parser, Debug)]
pub struct TransformArgs {
    /// Serialized engine
    #[arg(short, long, value_name = "ENGINE_FILE")]
    pub engine: PathBuf,

    /// Documents to transform (JSON or YAML)
    #[arg(value_name = "DOCUMENT", required = true, num_args = 1..)]
    pub documents: Vec<PathBuf>,

    /// Exit with an error if any transformation node failed
    #[arg(long)]
    pub strict: bool,

    /// Write the transformed documents to a file instead of stdout
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the fields command
#[derive(Parser, Debug)]
pub struct FieldsArgs {
    /// Serialized engine
    #[arg(value_name = "ENGINE_FILE")]
    pub engine: PathBuf,

    /// Include disabled fields
    #[arg(short, long)]
    pub all: bool,
}

/// Arguments for the rename command
#[derive(Parser, Debug)]
pub struct RenameArgs {
    /// Serialized engine
    #[arg(value_name = "ENGINE_FILE")]
    pub engine: PathBuf,

    /// Field id, or the field's input path (e.g. `orders.*.sku`)
    #[arg(value_name = "FIELD")]
    pub field: String,

    /// New output path; use `.` to merge an object field into the root
    #[arg(value_name = "NEW_PATH")]
    pub new_path: String,

    /// Write the edited engine here instead of overwriting ENGINE_FILE
    #[arg(long = "save-to", value_name = "OUTPUT_FILE", conflicts_with = "dry_run")]
    pub save_to: Option<PathBuf>,

    /// Validate the edit without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the join command
#[derive(Parser, Debug)]
pub struct JoinArgs {
    /// Engine whose fields stay in place
    #[arg(value_name = "LEFT_ENGINE")]
    pub left: PathBuf,

    /// Engine whose fields land under `key.*`
    #[arg(value_name = "RIGHT_ENGINE")]
    pub right: PathBuf,

    /// Array field the right engine's fields are nested under
    #[arg(short, long)]
    pub key: String,

    /// Write the joined engine to a file instead of stdout
    #[arg(long = "save-to", value_name = "ENGINE_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the verify command
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Serialized engine
    #[arg(value_name = "ENGINE_FILE")]
    pub engine: PathBuf,
}

/// Output format options
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable formatted output
    #[default]
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}
