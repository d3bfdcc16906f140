//! Processing of one source tree into a [`BuildResult`]

use configbob_core::output::mode_bits;
use configbob_core::{BuildResult, CoreError, DataSet, FileResult, SourceRules, paths, walk};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::Engine;
use crate::error::{EngineError, Result};

/// How a file made it into the result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Rendered,
    Copied,
}

/// Per-file account of one processed source tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeReport {
    /// Normalized source root
    pub root: PathBuf,
    /// Relative paths in processing order
    pub actions: Vec<(String, FileAction)>,
}

impl TreeReport {
    pub fn rendered(&self) -> usize {
        self.count(FileAction::Rendered)
    }

    pub fn copied(&self) -> usize {
        self.count(FileAction::Copied)
    }

    fn count(&self, action: FileAction) -> usize {
        self.actions.iter().filter(|(_, a)| *a == action).count()
    }
}

/// Result of processing one source tree
#[derive(Debug, Clone, Default)]
pub struct ProcessedTree {
    pub result: BuildResult,
    pub report: TreeReport,
}

/// Process the source tree at `root`
///
/// Files listed in `.bobcopy` are taken byte for byte, everything else is
/// rendered with `data` as context. Any failure aborts the whole tree.
pub fn process_folder(root: &Path, data: &DataSet, engine: &Engine) -> Result<ProcessedTree> {
    let root = paths::absolute(root).map_err(|source| CoreError::FileRead {
        path: root.to_path_buf(),
        source,
    })?;

    let rules = SourceRules::load(&root);
    tracing::debug!(
        root = %root.display(),
        ignore = ?rules.user_ignores(),
        copy = ?rules.copy,
        "loaded source rules"
    );

    let walked = walk(&root, &rules)?;

    let mut tree = ProcessedTree::default();
    tree.report.root = root.clone();
    tree.result.folders.extend(walked.folders);

    for relative in walked.files {
        let source = root.join(&relative);
        let (file, action) = process_file(&source, &relative, &rules, data, engine)?;

        tracing::debug!(file = %relative, ?action, "processed");
        tree.result.files.insert(relative.clone(), file);
        tree.report.actions.push((relative, action));
    }

    tracing::info!(
        root = %root.display(),
        folders = tree.result.folders.len(),
        rendered = tree.report.rendered(),
        copied = tree.report.copied(),
        "processed source tree"
    );

    Ok(tree)
}

fn process_file(
    source: &Path,
    relative: &str,
    rules: &SourceRules,
    data: &DataSet,
    engine: &Engine,
) -> Result<(FileResult, FileAction)> {
    let read_error = |e: std::io::Error| CoreError::FileRead {
        path: source.to_path_buf(),
        source: e,
    };

    let raw = fs::read(source).map_err(read_error)?;
    let permissions = mode_bits(&fs::metadata(source).map_err(read_error)?);

    let (bytes, action) = if rules.is_copy_only(relative) {
        (raw, FileAction::Copied)
    } else {
        let template = String::from_utf8(raw).map_err(|_| EngineError::NotText {
            path: source.to_path_buf(),
        })?;
        let rendered = engine.render_string(&template, data, &source.to_string_lossy())?;
        (rendered.into_bytes(), FileAction::Rendered)
    };

    Ok((
        FileResult {
            name: source.to_path_buf(),
            data: bytes,
            permissions,
        },
        action,
    ))
}
