//! Bundled secret backends and environment based registration

use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data::{DataFormat, DataSet};
use crate::error::{CoreError, SecretError};
use crate::secrets::{SecretBackend, SecretProviderManager};

/// Environment variable naming a secrets file for [`FileSecretBackend`]
pub const SECRETS_FILE_ENV: &str = "CONFIG_BOB_SECRETS_FILE";

/// Tag the file backend is registered under
pub const FILE_BACKEND_TAG: &str = "file";

/// Secrets read from a local YAML or JSON document
///
/// The document maps secret names to field maps and is addressed as
/// `<secret>.<field>`:
///
/// ```yaml
/// database:
///   user: app
///   password: s3cret
/// ```
///
/// `{{ secret("database.password") }}` resolves to `s3cret`.
#[derive(Debug, Clone)]
pub struct FileSecretBackend {
    secrets: DataSet,
}

impl FileSecretBackend {
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        Ok(Self {
            secrets: DataSet::from_file(path)?,
        })
    }

    pub fn parse(content: &str, format: DataFormat) -> Result<Self, CoreError> {
        let secrets = DataSet::parse(content, format, Path::new("<inline>"))?;
        Ok(Self { secrets })
    }
}

impl SecretBackend for FileSecretBackend {
    fn get_secret(&self, path: &str) -> Result<String, SecretError> {
        let (name, field) = split_reference(path)?;

        let secret = self.secrets.get(name).ok_or_else(|| SecretError::NotFound {
            name: name.to_string(),
        })?;

        let value = secret
            .as_object()
            .and_then(|fields| fields.get(field))
            .ok_or_else(|| SecretError::MissingField {
                name: name.to_string(),
                field: field.to_string(),
            })?;

        Ok(match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Split a `<secret>.<field>` reference
pub fn split_reference(reference: &str) -> Result<(&str, &str), SecretError> {
    let parts: Vec<&str> = reference.split('.').collect();
    match parts.as_slice() {
        [name, field] if !name.is_empty() && !field.is_empty() => Ok((*name, *field)),
        _ => Err(SecretError::invalid_reference(
            reference,
            format!("expected <secret>.<field>, got {} part(s)", parts.len()),
        )),
    }
}

impl SecretProviderManager {
    /// Create a manager with every backend configured through the environment
    pub fn from_env() -> Result<Self, CoreError> {
        let manager = Self::new();

        if let Some(path) = std::env::var_os(SECRETS_FILE_ENV) {
            let path = PathBuf::from(path);
            tracing::info!(path = %path.display(), "found secrets file configuration from env");
            manager.register_file_backend(&path)?;
        }

        Ok(manager)
    }

    /// Register a [`FileSecretBackend`] under [`FILE_BACKEND_TAG`]
    pub fn register_file_backend(&self, path: &Path) -> Result<(), CoreError> {
        let backend = FileSecretBackend::from_file(path)?;
        self.register(FILE_BACKEND_TAG, Arc::new(backend))
            .map_err(|e| CoreError::SecretSetup {
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRETS: &str = r#"
database:
  user: app
  password: "  s3cret  "
  port: 5432
api:
  token: abc
flat: value
"#;

    fn backend() -> FileSecretBackend {
        FileSecretBackend::parse(SECRETS, DataFormat::Yaml).unwrap()
    }

    #[test]
    fn test_resolves_field() {
        assert_eq!(backend().get_secret("api.token").unwrap(), "abc");
        assert_eq!(backend().get_secret("database.port").unwrap(), "5432");
    }

    #[test]
    fn test_invalid_reference() {
        let err = backend().get_secret("database").unwrap_err();
        assert!(matches!(err, SecretError::InvalidReference { .. }));

        let err = backend().get_secret("a.b.c").unwrap_err();
        assert!(err.to_string().contains("3 part(s)"));
    }

    #[test]
    fn test_unknown_secret_and_missing_field() {
        assert_eq!(
            backend().get_secret("nope.field").unwrap_err(),
            SecretError::NotFound { name: "nope".to_string() }
        );
        assert_eq!(
            backend().get_secret("database.host").unwrap_err(),
            SecretError::MissingField {
                name: "database".to_string(),
                field: "host".to_string()
            }
        );
        assert!(matches!(
            backend().get_secret("flat.value").unwrap_err(),
            SecretError::MissingField { .. }
        ));
    }

    #[test]
    fn test_manager_trims_backend_value() {
        let manager = SecretProviderManager::new();
        manager.register(FILE_BACKEND_TAG, Arc::new(backend())).unwrap();
        let cache = crate::secrets::SecretCache::new();

        assert_eq!(manager.get_secret(&cache, &["database.password"]).unwrap(), "s3cret");
        assert_eq!(manager.get_secret(&cache, &["file", "database.user"]).unwrap(), "app");
    }

    #[test]
    fn test_register_file_backend_twice() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("secrets.yml");
        std::fs::write(&file, SECRETS).unwrap();

        let manager = SecretProviderManager::new();
        manager.register_file_backend(&file).unwrap();
        let err = manager.register_file_backend(&file).unwrap_err();

        assert!(matches!(err, CoreError::SecretSetup { .. }));
        assert_eq!(manager.tags(), vec!["file"]);
    }

    #[test]
    fn test_split_reference() {
        assert_eq!(split_reference("db.password").unwrap(), ("db", "password"));
        assert!(split_reference(".password").is_err());
        assert!(split_reference("db.").is_err());
    }
}
