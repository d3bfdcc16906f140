//! Source tree traversal
//!
//! Symbolic links are resolved to their target type, so a link to a directory
//! is descended into and a link to a file is listed as a file. A dangling link
//! fails the walk. Ignored paths are pruned, including everything beneath an
//! ignored directory.

use std::path::Path;
use walkdir::WalkDir;

use crate::error::{CoreError, Result};
use crate::rules::{SourceRules, relative_string};

/// Files and folders of a source tree, as sorted root-relative paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkResult {
    pub files: Vec<String>,
    /// Directories, excluding the root itself
    pub folders: Vec<String>,
}

/// Walk `root`, skipping everything matched by the ignore rules
pub fn walk(root: &Path, rules: &SourceRules) -> Result<WalkResult> {
    let mut result = WalkResult::default();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !rules.is_ignored(root, entry.path()));

    for entry in walker {
        let entry = entry.map_err(|source| CoreError::Traversal {
            root: root.to_path_buf(),
            source,
        })?;

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let relative = relative_string(relative);

        // follow_links makes file_type() describe the link target
        if entry.file_type().is_dir() {
            result.folders.push(relative);
        } else {
            result.files.push(relative);
        }
    }

    result.files.sort();
    result.folders.sort();
    Ok(result)
}
