//! Secret lookup integration for MiniJinja templates
//!
//! This module provides the `secret()` template function. It never talks to a
//! backend directly: every call goes through the [`SecretProviderManager`],
//! which picks the backend, and the [`SecretCache`] of the running build,
//! which holds the value until the build ends.
//!
//! # Usage in Templates
//!
//! ```jinja2
//! # Only one backend registered
//! password: {{ secret("db.password") }}
//!
//! # Explicit backend tag
//! password: {{ secret("file", "db.password") }}
//! ```
//!
//! # Integration
//!
//! ```rust
//! use configbob_core::{DataFormat, FileSecretBackend, SecretCache, SecretProviderManager};
//! use configbob_engine::secrets::SecretFunction;
//! use minijinja::Environment;
//! use std::sync::Arc;
//!
//! let manager = Arc::new(SecretProviderManager::new());
//! let backend = FileSecretBackend::parse("db:\n  password: hunter2\n", DataFormat::Yaml).unwrap();
//! manager.register("file", Arc::new(backend)).unwrap();
//!
//! let mut env = Environment::new();
//! SecretFunction::new(manager, Arc::new(SecretCache::new())).register(&mut env);
//!
//! let out = env.render_str(r#"{{ secret("db.password") }}"#, ()).unwrap();
//! assert_eq!(out, "hunter2");
//! ```

use configbob_core::{SecretCache, SecretProviderManager};
use minijinja::value::Rest;
use minijinja::{Environment, Error, ErrorKind};
use std::sync::Arc;

/// The `secret` template function bound to a provider manager and the cache
/// of one build
#[derive(Debug, Clone)]
pub struct SecretFunction {
    manager: Arc<SecretProviderManager>,
    cache: Arc<SecretCache>,
}

impl SecretFunction {
    pub fn new(manager: Arc<SecretProviderManager>, cache: Arc<SecretCache>) -> Self {
        Self { manager, cache }
    }

    /// Register the `secret` function on a MiniJinja environment
    ///
    /// Accepts `secret(path)` or `secret(tag, path)`. Lookup failures surface
    /// as render errors carrying the [`configbob_core::SecretError`] as source.
    pub fn register(&self, env: &mut Environment<'static>) {
        let manager = Arc::clone(&self.manager);
        let cache = Arc::clone(&self.cache);

        env.add_function("secret", move |args: Rest<String>| -> Result<String, Error> {
            manager.get_secret(&cache, args.as_slice()).map_err(|e| {
                Error::new(ErrorKind::InvalidOperation, format!("secret: {}", e)).with_source(e)
            })
        });
    }
}
