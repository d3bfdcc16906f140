//! Secret backends, lookup cache and the provider registry
//!
//! Templates reference secrets symbolically, e.g. `{{ secret("db.password") }}`
//! or `{{ secret("file", "db.password") }}`. The [`SecretProviderManager`] routes
//! the reference to a registered [`SecretBackend`] and remembers the result in
//! the [`SecretCache`] of the running build, so a secret referenced from many
//! files costs one backend call per build. The manager itself holds no values
//! and can be shared by any number of builds.
//!
//! # Example
//!
//! ```rust
//! use configbob_core::{SecretBackend, SecretCache, SecretError, SecretProviderManager};
//! use std::sync::Arc;
//!
//! struct Static;
//!
//! impl SecretBackend for Static {
//!     fn get_secret(&self, path: &str) -> Result<String, SecretError> {
//!         Ok(format!("  value-of-{}\n", path))
//!     }
//! }
//!
//! let manager = SecretProviderManager::new();
//! manager.register("static", Arc::new(Static)).unwrap();
//!
//! let cache = SecretCache::new();
//! assert_eq!(manager.get_secret(&cache, &["db.password"]).unwrap(), "value-of-db.password");
//! ```

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::SecretError;

// =============================================================================
// BACKEND
// =============================================================================

/// A source of secret values
///
/// Each backend interprets `path` according to its own addressing scheme.
pub trait SecretBackend: Send + Sync {
    fn get_secret(&self, path: &str) -> Result<String, SecretError>;
}

// =============================================================================
// CACHE
// =============================================================================

/// Build-scoped secret cache keyed by `tag#path`
///
/// Every key owns a slot that is filled at most once. Concurrent lookups of
/// the same key wait on the slot while one of them calls the backend. A
/// failed call drops the slot again.
#[derive(Debug, Default)]
pub struct SecretCache {
    slots: RwLock<HashMap<String, Arc<OnceCell<String>>>>,
}

impl SecretCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(tag: &str, path: &str) -> String {
        format!("{}#{}", tag, path)
    }

    /// Cached value, if the secret was already resolved
    pub fn get(&self, tag: &str, path: &str) -> Option<String> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(&Self::key(tag, path))
            .and_then(|slot| slot.get().cloned())
    }

    /// Return the cached value or resolve it with `resolve`
    ///
    /// Only successful results are stored.
    pub fn get_or_try_insert_with<F>(&self, tag: &str, path: &str, resolve: F) -> Result<String, SecretError>
    where
        F: FnOnce() -> Result<String, SecretError>,
    {
        let slot = self.slot(tag, path);

        match slot.get_or_try_init(resolve) {
            Ok(value) => Ok(value.clone()),
            Err(e) => {
                self.discard(tag, path, &slot);
                Err(e)
            }
        }
    }

    /// Number of resolved entries
    pub fn len(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, tag: &str, path: &str) -> Arc<OnceCell<String>> {
        let key = Self::key(tag, path);

        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get(&key) {
                return Arc::clone(slot);
            }
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key).or_default())
    }

    /// Remove `slot` unless another lookup has filled or replaced it meanwhile
    fn discard(&self, tag: &str, path: &str, slot: &Arc<OnceCell<String>>) {
        let key = Self::key(tag, path);
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);

        let stale = slots
            .get(&key)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && current.get().is_none());
        if stale {
            slots.remove(&key);
        }
    }
}

// =============================================================================
// MANAGER
// =============================================================================

/// Registry of secret backends by tag
///
/// Resolved values live in the [`SecretCache`] passed to each lookup, never
/// in the registry.
#[derive(Default)]
pub struct SecretProviderManager {
    providers: RwLock<HashMap<String, Arc<dyn SecretBackend>>>,
}

impl std::fmt::Debug for SecretProviderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretProviderManager")
            .field("tags", &self.tags())
            .finish()
    }
}

impl SecretProviderManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `backend` under `tag`
    ///
    /// Fails if the tag is already taken.
    pub fn register(&self, tag: impl Into<String>, backend: Arc<dyn SecretBackend>) -> Result<(), SecretError> {
        let tag = tag.into();
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);

        if providers.contains_key(&tag) {
            return Err(SecretError::DuplicateBackend { tag });
        }

        tracing::debug!(tag = %tag, "registered secret backend");
        providers.insert(tag, backend);
        Ok(())
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        let mut tags: Vec<String> = providers.keys().cloned().collect();
        tags.sort();
        tags
    }

    pub fn is_empty(&self) -> bool {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Resolve a secret from template-style arguments through `cache`
    ///
    /// - `[path]`: the only registered backend is used
    /// - `[tag, path]`: the backend registered under `tag` is used
    pub fn get_secret<S: AsRef<str>>(&self, cache: &SecretCache, args: &[S]) -> Result<String, SecretError> {
        match args {
            [path] => self.lookup(cache, None, path.as_ref()),
            [tag, path] => self.lookup(cache, Some(tag.as_ref()), path.as_ref()),
            _ => Err(SecretError::InvalidArity { count: args.len() }),
        }
    }

    /// Resolve `path` with an explicit or implicit backend
    pub fn lookup(&self, cache: &SecretCache, tag: Option<&str>, path: &str) -> Result<String, SecretError> {
        let (tag, backend) = self.resolve_backend(tag)?;

        cache.get_or_try_insert_with(&tag, path, || {
            tracing::debug!(tag = %tag, path = %path, "fetching secret from backend");
            let value = backend.get_secret(path)?;
            Ok(value.trim().to_string())
        })
    }

    fn resolve_backend(&self, tag: Option<&str>) -> Result<(String, Arc<dyn SecretBackend>), SecretError> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);

        if providers.is_empty() {
            return Err(SecretError::NoBackends);
        }

        match tag {
            Some(tag) => providers
                .get(tag)
                .map(|backend| (tag.to_string(), Arc::clone(backend)))
                .ok_or_else(|| SecretError::UnknownBackend {
                    tag: tag.to_string(),
                }),
            None => {
                if providers.len() != 1 {
                    let mut tags: Vec<&str> = providers.keys().map(String::as_str).collect();
                    tags.sort_unstable();
                    return Err(SecretError::AmbiguousBackend {
                        tags: tags.join(", "),
                    });
                }
                providers
                    .iter()
                    .next()
                    .map(|(tag, backend)| (tag.clone(), Arc::clone(backend)))
                    .ok_or(SecretError::NoBackends)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Echoes the path back with surrounding whitespace and counts calls
    #[derive(Debug, Default)]
    struct CountingBackend {
        pub calls: AtomicUsize,
        pub delay: Option<Duration>,
    }

    impl SecretBackend for CountingBackend {
        fn get_secret(&self, path: &str) -> Result<String, SecretError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            if path.starts_with("fail") {
                return Err(SecretError::NotFound {
                    name: path.to_string(),
                });
            }
            Ok(format!(" {}\n", path))
        }
    }

    #[test]
    fn test_register_duplicate_tag() {
        let manager = SecretProviderManager::new();
        manager.register("mock", Arc::new(CountingBackend::default())).unwrap();

        let err = manager
            .register("mock", Arc::new(CountingBackend::default()))
            .unwrap_err();
        assert_eq!(err, SecretError::DuplicateBackend { tag: "mock".to_string() });
    }

    #[test]
    fn test_lookup_with_explicit_tag() {
        let manager = SecretProviderManager::new();
        manager.register("mock", Arc::new(CountingBackend::default())).unwrap();
        let cache = SecretCache::new();

        assert_eq!(manager.get_secret(&cache, &["mock", "path.to.secret"]).unwrap(), "path.to.secret");
    }

    #[test]
    fn test_unknown_tag() {
        let manager = SecretProviderManager::new();
        manager.register("mock", Arc::new(CountingBackend::default())).unwrap();
        let cache = SecretCache::new();

        let err = manager.get_secret(&cache, &["unknown", "path.to.secret"]).unwrap_err();
        assert_eq!(err, SecretError::UnknownBackend { tag: "unknown".to_string() });
    }

    #[test]
    fn test_implicit_backend_requires_exactly_one() {
        let manager = SecretProviderManager::new();
        let cache = SecretCache::new();
        assert_eq!(manager.get_secret(&cache, &["a.b"]).unwrap_err(), SecretError::NoBackends);

        manager.register("one", Arc::new(CountingBackend::default())).unwrap();
        assert_eq!(manager.get_secret(&cache, &["a.b"]).unwrap(), "a.b");

        manager.register("two", Arc::new(CountingBackend::default())).unwrap();
        let err = manager.get_secret(&cache, &["a.b"]).unwrap_err();
        assert!(matches!(err, SecretError::AmbiguousBackend { ref tags } if tags == "one, two"));
    }

    #[test]
    fn test_invalid_arity() {
        let manager = SecretProviderManager::new();
        manager.register("mock", Arc::new(CountingBackend::default())).unwrap();
        let cache = SecretCache::new();

        let none: [&str; 0] = [];
        assert_eq!(manager.get_secret(&cache, &none).unwrap_err(), SecretError::InvalidArity { count: 0 });
        assert_eq!(
            manager.get_secret(&cache, &["a", "b", "c"]).unwrap_err(),
            SecretError::InvalidArity { count: 3 }
        );
    }

    #[test]
    fn test_second_lookup_is_cached() {
        let backend = Arc::new(CountingBackend::default());
        let manager = SecretProviderManager::new();
        manager.register("mock", backend.clone()).unwrap();
        let cache = SecretCache::new();

        let first = manager.get_secret(&cache, &["db.password"]).unwrap();
        let second = manager.get_secret(&cache, &["mock", "db.password"]).unwrap();

        assert_eq!(first, "db.password");
        assert_eq!(second, "db.password");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("mock", "db.password").as_deref(), Some("db.password"));
    }

    #[test]
    fn test_fresh_cache_calls_backend_again() {
        let backend = Arc::new(CountingBackend::default());
        let manager = SecretProviderManager::new();
        manager.register("mock", backend.clone()).unwrap();

        for _ in 0..2 {
            let cache = SecretCache::new();
            manager.get_secret(&cache, &["db.password"]).unwrap();
            manager.get_secret(&cache, &["db.password"]).unwrap();
        }

        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let backend = Arc::new(CountingBackend::default());
        let manager = SecretProviderManager::new();
        manager.register("mock", backend.clone()).unwrap();
        let cache = SecretCache::new();

        assert!(manager.get_secret(&cache, &["fail.me"]).is_err());
        assert!(manager.get_secret(&cache, &["fail.me"]).is_err());

        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
        assert!(cache.slots.read().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_lookups_coalesce() {
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
            delay: Some(Duration::from_millis(50)),
        });
        let manager = SecretProviderManager::new();
        manager.register("mock", backend.clone()).unwrap();
        let cache = SecretCache::new();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    assert_eq!(manager.get_secret(&cache, &["shared.key"]).unwrap(), "shared.key");
                });
            }
        });

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_keys() {
        let cache = SecretCache::new();
        assert_eq!(SecretCache::key("op", "item.field"), "op#item.field");

        cache
            .get_or_try_insert_with("op", "item.field", || Ok("v1".to_string()))
            .unwrap();
        let second = cache
            .get_or_try_insert_with("op", "item.field", || Ok("v2".to_string()))
            .unwrap();

        assert_eq!(second, "v1");
        assert_eq!(cache.get("op", "item.field").as_deref(), Some("v1"));
        assert_eq!(cache.get("gs", "item.field"), None);
        assert_eq!(cache.len(), 1);
    }
}
