//! Core error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("could not read data file {path}: {source}")]
    DataFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported data file format {path}, need .json, .yml or .yaml")]
    UnsupportedDataFormat { path: PathBuf },

    #[error("failed to parse data file {path}: {message}")]
    DataFileParse { path: PathBuf, message: String },

    #[error("data file {path} must contain a mapping at the top level")]
    DataFileNotMapping { path: PathBuf },

    #[error("failed to walk {root}: {source}")]
    Traversal {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("there has to be at least one source folder")]
    NoSourceFolders,

    #[error("failed to set up secret backends: {message}")]
    SecretSetup { message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while resolving a secret reference
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("no secret backend registered")]
    NoBackends,

    #[error("backend for secret must be specified, multiple backends present: {tags}")]
    AmbiguousBackend { tags: String },

    #[error("secret backend {tag:?} was not registered")]
    UnknownBackend { tag: String },

    #[error("secret backend with tag {tag:?} already exists")]
    DuplicateBackend { tag: String },

    #[error("invalid number of arguments, required 1 or 2, but got {count}")]
    InvalidArity { count: usize },

    #[error("invalid secret reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("secret {name:?} not found")]
    NotFound { name: String },

    #[error("field {field:?} is not set for secret {name:?}")]
    MissingField { name: String, field: String },

    #[error("backend {tag:?} failed for {path:?}: {message}")]
    Backend {
        tag: String,
        path: String,
        message: String,
    },
}

impl SecretError {
    pub fn invalid_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }
}
