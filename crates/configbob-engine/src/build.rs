//! Build orchestration
//!
//! A [`Build`] holds the secret provider manager. Every [`Build::run`] starts
//! from a fresh secret cache and engine, so nothing resolved in one run is
//! seen by the next. Source trees are processed in order and merged, nothing
//! is written here; see [`configbob_core::output::write`].

use configbob_core::{BuildResult, CoreError, DataSet, SecretCache, SecretProviderManager};
use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::Engine;
use crate::error::Result;
use crate::processor::{TreeReport, process_folder};

/// Inputs of one build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfig {
    /// Data files, merged left to right
    pub data_files: Vec<PathBuf>,
    /// Source trees, later trees win on conflicting files
    pub source_dirs: Vec<PathBuf>,
}

impl BuildConfig {
    pub fn new(data_files: Vec<PathBuf>, source_dirs: Vec<PathBuf>) -> Self {
        Self {
            data_files,
            source_dirs,
        }
    }
}

/// Outcome of a successful build
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Merged result of all source trees
    pub result: BuildResult,
    /// One report per source tree, in input order
    pub trees: Vec<TreeReport>,
}

/// Builds resolving secrets through one provider manager
#[derive(Debug)]
pub struct Build {
    secrets: Arc<SecretProviderManager>,
}

impl Build {
    /// Create a build resolving secrets through `secrets`
    pub fn new(secrets: Arc<SecretProviderManager>) -> Self {
        Self { secrets }
    }

    /// Load data, process every source tree in order and merge the results
    ///
    /// The first error aborts the build.
    pub fn run(&self, config: &BuildConfig) -> Result<BuildOutcome> {
        tracing::info!(
            data_files = %configbob_core::data::display_paths(&config.data_files),
            source_dirs = %configbob_core::data::display_paths(&config.source_dirs),
            "building"
        );

        let data = DataSet::load(&config.data_files)?;

        if config.source_dirs.is_empty() {
            return Err(CoreError::NoSourceFolders.into());
        }

        let cache = Arc::new(SecretCache::new());
        let engine = Engine::builder()
            .strict(true)
            .secrets(Arc::clone(&self.secrets), Arc::clone(&cache))
            .build();

        let mut results = Vec::with_capacity(config.source_dirs.len());
        let mut trees = Vec::with_capacity(config.source_dirs.len());

        for source_dir in &config.source_dirs {
            tracing::info!(folder = %source_dir.display(), "processing folder");

            let processed = process_folder(source_dir, &data, &engine)?;
            results.push(processed.result);
            trees.push(processed.report);
        }

        let result = BuildResult::merge_all(results);
        tracing::debug!(
            folders = result.folders.len(),
            files = result.files.len(),
            secrets = cache.len(),
            "merged source trees"
        );

        Ok(BuildOutcome { result, trees })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use configbob_core::{SecretBackend, SecretError};
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl SecretBackend for Counting {
        fn get_secret(&self, path: &str) -> std::result::Result<String, SecretError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{}!\n", path))
        }
    }

    /// Hands out a new version of every secret on each call
    #[derive(Default)]
    struct Rotating {
        calls: AtomicUsize,
    }

    impl SecretBackend for Rotating {
        fn get_secret(&self, _path: &str) -> std::result::Result<String, SecretError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("v{}", call))
        }
    }

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        fn path(&self, relative: &str) -> PathBuf {
            self.dir.path().join(relative)
        }

        fn write(&self, relative: &str, content: &str) -> &Self {
            write(self.dir.path(), relative, content);
            self
        }
    }

    #[test]
    fn test_no_source_folders() {
        let build = Build::new(Arc::new(SecretProviderManager::new()));
        let err = build.run(&BuildConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::NoSourceFolders)));
        assert_eq!(err.to_string(), "there has to be at least one source folder");
    }

    #[test]
    fn test_bad_data_file_fails_before_processing() {
        let fx = Fixture::new();
        fx.write("values.txt", "a: 1").write("src/a.txt", "x");

        let build = Build::new(Arc::new(SecretProviderManager::new()));
        let config = BuildConfig::new(vec![fx.path("values.txt")], vec![fx.path("src")]);
        let err = build.run(&config).unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::UnsupportedDataFormat { .. })));
    }

    #[test]
    fn test_last_tree_wins() {
        let fx = Fixture::new();
        fx.write("values.yml", "env: prod\n")
            .write("base/app.conf", "base {{ env }}")
            .write("base/only-base.conf", "b")
            .write("base/dir/x", "x")
            .write("overlay/app.conf", "overlay {{ env }}")
            .write("overlay/other/y", "y");

        let build = Build::new(Arc::new(SecretProviderManager::new()));
        let config = BuildConfig::new(
            vec![fx.path("values.yml")],
            vec![fx.path("base"), fx.path("overlay")],
        );
        let outcome = build.run(&config).unwrap();

        assert_eq!(outcome.result.files["app.conf"].data, b"overlay prod");
        assert!(outcome.result.files["app.conf"].name.starts_with(fx.path("overlay")));
        assert_eq!(outcome.result.files["only-base.conf"].data, b"b");

        let folders: Vec<_> = outcome.result.folders.iter().cloned().collect();
        assert_eq!(folders, vec!["dir", "other"]);
        assert_eq!(outcome.trees.len(), 2);
        assert_eq!(outcome.trees[0].rendered(), 3);
    }

    #[test]
    fn test_build_is_deterministic() {
        let fx = Fixture::new();
        fx.write("values.json", r#"{"items": ["b", "a"], "cfg": {"z": 1, "a": 2}}"#)
            .write("src/list.txt", "{{ join(items, \",\") }}")
            .write("src/cfg.json", "{{ jsonindent(cfg, \"\", \"  \") }}")
            .write("src/secret.txt", "{{ secret(\"db.password\") }}");

        let backend = Arc::new(Counting::default());
        let manager = Arc::new(SecretProviderManager::new());
        manager.register("mock", backend.clone()).unwrap();

        let config = BuildConfig::new(vec![fx.path("values.json")], vec![fx.path("src")]);
        let first = Build::new(Arc::clone(&manager)).run(&config).unwrap();
        let second = Build::new(manager).run(&config).unwrap();

        // Both builds resolved the secret themselves
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(first.result, second.result);
        assert_eq!(first.result.files["list.txt"].data, b"b,a");
        assert_eq!(first.result.files["secret.txt"].data, b"db.password!");
    }

    #[test]
    fn test_secret_is_fetched_once_per_build() {
        let fx = Fixture::new();
        for name in ["a.txt", "b.txt", "nested/c.txt"] {
            fx.write(&format!("src/{}", name), "{{ secret(\"mock\", \"db.password\") }}");
        }

        let backend = Arc::new(Counting::default());
        let manager = Arc::new(SecretProviderManager::new());
        manager.register("mock", backend.clone()).unwrap();

        let build = Build::new(manager);
        let outcome = build
            .run(&BuildConfig::new(vec![], vec![fx.path("src")]))
            .unwrap();

        assert_eq!(outcome.result.files.len(), 3);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_secret_cache_does_not_outlive_a_run() {
        let fx = Fixture::new();
        fx.write("src/a.txt", "{{ secret(\"db.password\") }}")
            .write("src/b.txt", "{{ secret(\"db.password\") }}");

        let backend = Arc::new(Rotating::default());
        let manager = Arc::new(SecretProviderManager::new());
        manager.register("mock", backend.clone()).unwrap();

        let config = BuildConfig::new(vec![], vec![fx.path("src")]);
        let build = Build::new(Arc::clone(&manager));
        let first = build.run(&config).unwrap();
        let second = build.run(&config).unwrap();
        let third = Build::new(manager).run(&config).unwrap();

        assert_eq!(first.result.files["a.txt"].data, b"v1");
        assert_eq!(first.result.files["b.txt"].data, b"v1");
        assert_eq!(second.result.files["a.txt"].data, b"v2");
        assert_eq!(third.result.files["b.txt"].data, b"v3");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_render_failure_aborts_build() {
        let fx = Fixture::new();
        fx.write("first/ok.txt", "ok").write("second/bad.txt", "{{ nope }}");

        let build = Build::new(Arc::new(SecretProviderManager::new()));
        let config = BuildConfig::new(vec![], vec![fx.path("first"), fx.path("second")]);
        assert!(matches!(build.run(&config), Err(EngineError::Template(_))));
    }
}
