//! Build command - render source trees into an output folder

use configbob_core::output;
use configbob_engine::{Build, BuildConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::display;
use crate::error::{CliError, Result};

pub fn run(
    values: &[PathBuf],
    templates: &[PathBuf],
    output_dir: Option<&Path>,
    secrets_file: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let manager = Arc::new(super::secret_manager(secrets_file)?);

    display::build_banner(values, templates);

    let config = BuildConfig::new(values.to_vec(), templates.to_vec());
    let outcome = Build::new(manager).run(&config)?;

    for tree in &outcome.trees {
        display::tree_report(tree);
    }

    if dry_run {
        display::dry_run(output_dir, &outcome.result);
        return Ok(());
    }

    let output_dir = output_dir.ok_or_else(|| {
        CliError::config_with_help("no output folder given", "pass -o/--output or use --dry-run")
    })?;

    let summary = output::write(output_dir, &outcome.result)?;
    display::write_summary(&summary);

    Ok(())
}
