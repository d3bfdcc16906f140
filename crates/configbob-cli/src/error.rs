//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use configbob_core::CoreError;
use configbob_engine::{EngineError, TemplateError};
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Bad data files, missing source folders, secret backend setup
    #[error("Configuration error: {message}")]
    #[diagnostic(code(configbob::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Template rendering failed, keeps the source-mapped diagnostic
    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(TemplateError),

    /// IO error (unreadable source tree, unwritable output)
    #[error("IO error: {message}")]
    #[diagnostic(code(configbob::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Template(_) => exit_codes::TEMPLATE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NoSourceFolders => CliError::config_with_help(
                err.to_string(),
                "pass one or more source folders with -t/--template",
            ),
            CoreError::UnsupportedDataFormat { .. } => {
                CliError::config_with_help(err.to_string(), "rename the data file to .json, .yml or .yaml")
            }
            CoreError::DataFileRead { .. }
            | CoreError::DataFileParse { .. }
            | CoreError::DataFileNotMapping { .. }
            | CoreError::SecretSetup { .. } => CliError::config(err.to_string()),
            CoreError::Traversal { .. } | CoreError::FileRead { .. } | CoreError::Write { .. } => {
                CliError::Io {
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Template(e) => CliError::Template(e),
            EngineError::Core(e) => e.into(),
            EngineError::NotText { ref path } => CliError::Template(
                TemplateError::simple(&path.to_string_lossy(), err.to_string())
                    .with_suggestion(format!("add its path to {}", configbob_core::COPY_FILE)),
            ),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
