//! Ignore and copy rules read from marker files in a source tree
//!
//! Each marker file lists one root-relative path per non-blank line:
//!
//! - `.bobignore`: paths skipped entirely (exact match, a directory entry prunes its subtree)
//! - `.bobcopy`: paths copied verbatim instead of rendered (prefix match)
//!
//! The two marker files are always ignored themselves.

use std::path::Path;

/// Name of the ignore marker file
pub const IGNORE_FILE: &str = ".bobignore";

/// Name of the copy marker file
pub const COPY_FILE: &str = ".bobcopy";

/// Ignore and copy rules of one source tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRules {
    /// Exact-match ignore entries, marker files first
    pub ignore: Vec<String>,
    /// Prefix-match copy entries
    pub copy: Vec<String>,
}

impl SourceRules {
    /// Read both marker files directly under `root`
    ///
    /// Missing marker files yield empty rule sets.
    pub fn load(root: &Path) -> Self {
        let mut ignore = vec![IGNORE_FILE.to_string(), COPY_FILE.to_string()];
        ignore.extend(read_entries(&root.join(IGNORE_FILE)));

        Self {
            ignore,
            copy: read_entries(&root.join(COPY_FILE)),
        }
    }

    /// Build rules from explicit entries, the marker files are still ignored
    pub fn from_entries(ignore: Vec<String>, copy: Vec<String>) -> Self {
        let mut all = vec![IGNORE_FILE.to_string(), COPY_FILE.to_string()];
        all.extend(ignore);
        Self { ignore: all, copy }
    }

    /// Entries that came from the ignore marker file
    pub fn user_ignores(&self) -> &[String] {
        &self.ignore[2..]
    }

    /// True iff `candidate`, made relative to `root`, exactly equals an ignore entry
    pub fn is_ignored(&self, root: &Path, candidate: &Path) -> bool {
        is_ignored(root, candidate, &self.ignore)
    }

    /// True iff `relative` equals or starts with a copy entry
    ///
    /// Prefix matching lets a directory entry copy everything beneath it.
    /// Unlike ignore entries this is not an exact match.
    pub fn is_copy_only(&self, relative: &str) -> bool {
        is_copy_only(relative, &self.copy)
    }
}

/// True iff `relative` equals or starts with any of `copy_entries`
pub fn is_copy_only(relative: &str, copy_entries: &[String]) -> bool {
    copy_entries
        .iter()
        .any(|entry| relative == entry || relative.starts_with(entry.as_str()))
}

/// True iff `candidate`, made relative to `root`, exactly equals an entry
///
/// Paths outside `root` are never ignored.
pub fn is_ignored(root: &Path, candidate: &Path, ignore_entries: &[String]) -> bool {
    let Ok(relative) = candidate.strip_prefix(root) else {
        return false;
    };
    let relative = relative_string(relative);
    ignore_entries.iter().any(|entry| *entry == relative)
}

/// Render a relative path with `/` separators on every platform
pub fn relative_string(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_entries(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
