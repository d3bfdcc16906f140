//! Config Bob Engine - Jinja2 templating for configuration trees
//!
//! This crate provides:
//! - A MiniJinja-based template engine with strict binding
//! - The template function library (`substr`, `yaml`, `jsescape`, `secret`, ...)
//! - Human-readable error messages with suggestions
//! - Folder processing and the multi-tree [`Build`]

pub mod build;
pub mod engine;
pub mod error;
pub mod functions;
pub mod processor;
pub mod secrets;
pub mod suggestions;

pub use build::{Build, BuildConfig, BuildOutcome};
pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, Result, TemplateError, TemplateErrorKind};
pub use processor::{FileAction, ProcessedTree, TreeReport, process_folder};
pub use secrets::SecretFunction;
pub use suggestions::{AVAILABLE_FILTERS, AVAILABLE_FUNCTIONS};
