//! CLI commands

pub mod build;
pub mod render;

use configbob_core::SecretProviderManager;
use std::path::Path;

use crate::error::Result;

/// Secret backends for a command
///
/// An explicit `--secrets-file` wins over the environment.
pub(crate) fn secret_manager(secrets_file: Option<&Path>) -> Result<SecretProviderManager> {
    let manager = match secrets_file {
        Some(path) => {
            let manager = SecretProviderManager::new();
            manager.register_file_backend(path)?;
            manager
        }
        None => SecretProviderManager::from_env()?,
    };

    tracing::debug!(backends = ?manager.tags(), "secret backends registered");
    Ok(manager)
}
