//! Error types and handling for the CLI
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from the fieldgraph core library
    #[error("{0}")]
    Core(#[from] fieldgraph_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// A document or engine file could not be parsed
    #[error("Invalid file format for {}: expected {}: {}", path.display(), expected, reason)]
    InvalidFormat {
        path: PathBuf,
        expected: String,
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// No field matches the given id or path
    #[error("No field matches '{}'", reference)]
    FieldNotFound { reference: String },

    /// `transform --strict` met node failures
    #[error("{} transformation error(s) in {}", count, path.display())]
    TransformFailed { path: PathBuf, count: usize },

    /// The engine's registry disagrees with its lineage
    #[error("Engine integrity check failed with {0} issue(s)")]
    Integrity(usize),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(_) => 2,
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::FieldNotFound { .. } => 7,
            Self::TransformFailed { .. } => 8,
            Self::Integrity(_) => 9,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_) | Self::FieldNotFound { .. })
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    let mut message = error.to_string();
    // Point at the field a rejected edit concerns
    if let Error::Core(core) = error {
        if let Some(field) = core.field() {
            message.push_str(&format!(" (field {})", field));
        }
    }

    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), message)
    } else {
        format!("Error: {}", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldgraph_core::{FieldId, Path, ValidationError};

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::config("bad").exit_code(), 5);
        assert_eq!(Error::invalid_args("bad").exit_code(), 6);
        assert_eq!(Error::other("bad").exit_code(), 99);
        assert!(Error::invalid_args("bad").should_show_help());
        assert!(!Error::Integrity(2).should_show_help());
    }

    #[test]
    fn test_format_core_error_names_the_field() {
        let err = Error::Core(
            ValidationError::CrossLevelMove {
                field: FieldId(4),
                from: Path::from("a.*.b"),
                to: Path::from("b"),
            }
            .into(),
        );
        let text = format_error(&err, false);
        assert!(text.starts_with("Error: Validation failed"));
        assert!(text.ends_with("(field 4)"));
    }
}
