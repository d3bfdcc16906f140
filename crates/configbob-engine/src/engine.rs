//! Template engine based on MiniJinja

use configbob_core::{DataSet, SecretCache, SecretProviderManager};
use minijinja::{AutoEscape, Environment, UndefinedBehavior, Value};
use std::sync::Arc;

use crate::error::{Result, TemplateError};
use crate::functions;
use crate::secrets::SecretFunction;

/// Template engine builder
pub struct EngineBuilder {
    strict_mode: bool,
    secrets: Option<(Arc<SecretProviderManager>, Arc<SecretCache>)>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            strict_mode: true,
            secrets: None,
        }
    }

    /// Set strict mode (fail on undefined variables)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Bind the `secret` function to a provider manager and a build's cache
    ///
    /// Without one, `secret()` fails with "no secret backend registered".
    pub fn secrets(mut self, manager: Arc<SecretProviderManager>, cache: Arc<SecretCache>) -> Self {
        self.secrets = Some((manager, cache));
        self
    }

    /// Build the engine
    pub fn build(self) -> Engine {
        let (manager, cache) = self.secrets.unwrap_or_else(|| {
            (Arc::new(SecretProviderManager::new()), Arc::new(SecretCache::new()))
        });
        Engine::new(self.strict_mode, SecretFunction::new(manager, cache))
    }
}

/// The template engine
///
/// Holds one configured environment; templates are compiled per render and
/// never stored, so an engine can be shared across source trees. Secrets
/// resolved through it stay cached for the engine's lifetime, which makes an
/// engine belong to a single build.
pub struct Engine {
    strict_mode: bool,
    env: Environment<'static>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("strict_mode", &self.strict_mode)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create a new engine with `secret` bound as given
    pub fn new(strict_mode: bool, secrets: SecretFunction) -> Self {
        Self {
            strict_mode,
            env: create_environment(strict_mode, secrets),
        }
    }

    /// Create a builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn is_strict(&self) -> bool {
        self.strict_mode
    }

    /// Render a single template string with `data` as the root context
    pub fn render_string(&self, template: &str, data: &DataSet, template_name: &str) -> Result<String> {
        let ctx = Value::from_serialize(&data.0);

        self.env
            .render_named_str(template_name, template, ctx)
            .map_err(|e| TemplateError::from_minijinja(e, template_name, template, &data.keys()).into())
    }
}

/// Create a configured MiniJinja environment
fn create_environment(strict_mode: bool, secrets: SecretFunction) -> Environment<'static> {
    let mut env = Environment::new();

    if strict_mode {
        env.set_undefined_behavior(UndefinedBehavior::Strict);
    } else {
        env.set_undefined_behavior(UndefinedBehavior::Lenient);
    }

    // Output is configuration, never HTML, whatever the file name
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_keep_trailing_newline(true);

    functions::register(&mut env);
    secrets.register(&mut env);

    env
}
