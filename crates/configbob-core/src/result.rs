//! Build results and merging of multiple source trees

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// One processed source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    /// Absolute source path
    pub name: PathBuf,
    /// Rendered or raw bytes
    pub data: Vec<u8>,
    /// Permission bits of the source file
    pub permissions: u32,
}

/// The output of processing one or more source trees
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildResult {
    /// Relative directory paths
    pub folders: BTreeSet<String>,
    /// Relative file path to processed file
    pub files: BTreeMap<String, FileResult>,
}

impl BuildResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }

    /// Merge results in order
    ///
    /// Folders are unioned. For a file path defined by several results the
    /// last one wins.
    pub fn merge_all(results: impl IntoIterator<Item = BuildResult>) -> Self {
        let mut merged = Self::new();
        for result in results {
            merged.merge(result);
        }
        merged
    }

    /// Overlay another result on top of this one
    pub fn merge(&mut self, overlay: BuildResult) {
        self.folders.extend(overlay.folders);
        for (path, file) in overlay.files {
            self.files.insert(path, file);
        }
    }
}
