//! Config Bob Core - building blocks for rendering configuration trees
//!
//! This crate provides the pieces of a build that do not involve templating:
//! - `DataSet`: merged JSON/YAML input data
//! - `SourceRules`: `.bobignore` / `.bobcopy` marker files
//! - `walk`: deterministic, symlink-resolving traversal of a source tree
//! - `BuildResult`: processed files and folders, mergeable across trees
//! - `output::write`: materializing a result on disk
//! - `SecretProviderManager` and `SecretCache`: secret backend registry and per-build cache

pub mod backends;
pub mod data;
pub mod error;
pub mod output;
pub mod paths;
pub mod result;
pub mod rules;
pub mod secrets;
pub mod walker;

pub use backends::{FILE_BACKEND_TAG, FileSecretBackend, SECRETS_FILE_ENV};
pub use data::{DataFormat, DataSet};
pub use error::{CoreError, Result, SecretError};
pub use output::{WriteSummary, WrittenFile};
pub use result::{BuildResult, FileResult};
pub use rules::{COPY_FILE, IGNORE_FILE, SourceRules};
pub use secrets::{SecretBackend, SecretCache, SecretProviderManager};
pub use walker::{WalkResult, walk};
