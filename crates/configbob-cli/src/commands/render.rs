//! Render command - render a single template to stdout

use configbob_core::{CoreError, DataSet, SecretCache};
use configbob_engine::{Engine, EngineError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;

pub fn run(template: &Path, values: &[PathBuf], secrets_file: Option<&Path>) -> Result<()> {
    let manager = Arc::new(super::secret_manager(secrets_file)?);
    let data = DataSet::load(values)?;

    let raw = fs::read(template).map_err(|source| CoreError::FileRead {
        path: template.to_path_buf(),
        source,
    })?;
    let source = String::from_utf8(raw).map_err(|_| EngineError::NotText {
        path: template.to_path_buf(),
    })?;

    let engine = Engine::builder()
        .secrets(manager, Arc::new(SecretCache::new()))
        .build();
    let rendered = engine.render_string(&source, &data, &template.display().to_string())?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;

    Ok(())
}
