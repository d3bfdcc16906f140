//! Writing a build result to disk

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::result::BuildResult;

/// A file written by [`write`], for progress output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub permissions: u32,
}

/// Summary of what was written
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub folders: Vec<PathBuf>,
    pub files: Vec<WrittenFile>,
}

/// Materialize `result` under `output`
///
/// Directories are created first, then files are written in path order with
/// the permission bits of their source file.
pub fn write(output: &Path, result: &BuildResult) -> Result<WriteSummary> {
    let mut summary = WriteSummary::default();

    create_dir(output)?;

    for folder in &result.folders {
        let path = output.join(folder);
        create_dir(&path)?;
        summary.folders.push(path);
    }

    for (relative, file) in &result.files {
        let path = output.join(relative);

        // Parents of files are normally listed as folders already
        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }

        fs::write(&path, &file.data).map_err(|source| CoreError::Write {
            path: path.clone(),
            source,
        })?;
        set_permissions(&path, file.permissions)?;

        tracing::debug!(path = %path.display(), mode = format!("{:o}", file.permissions), "wrote file");
        summary.files.push(WrittenFile {
            path,
            permissions: file.permissions,
        });
    }

    tracing::info!(
        output = %output.display(),
        folders = summary.folders.len(),
        files = summary.files.len(),
        "output written"
    );

    Ok(summary)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| CoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|source| {
        CoreError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    let mut permissions = fs::metadata(path)
        .map_err(|source| CoreError::Write {
            path: path.to_path_buf(),
            source,
        })?
        .permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, permissions).map_err(|source| CoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Permission bits of a file's metadata
#[cfg(unix)]
pub fn mode_bits(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
pub fn mode_bits(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() { 0o444 } else { 0o644 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::FileResult;

    fn sample() -> BuildResult {
        let mut result = BuildResult::new();
        result.folders.insert("conf".to_string());
        result.folders.insert("conf/nested".to_string());
        result.files.insert(
            "conf/app.yml".to_string(),
            FileResult {
                name: PathBuf::from("/src/conf/app.yml"),
                data: b"port: 80\n".to_vec(),
                permissions: 0o644,
            },
        );
        result.files.insert(
            "run.sh".to_string(),
            FileResult {
                name: PathBuf::from("/src/run.sh"),
                data: b"#!/bin/sh\n".to_vec(),
                permissions: 0o755,
            },
        );
        result
    }

    #[test]
    fn test_write_creates_tree() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        let summary = write(&out, &sample()).unwrap();

        assert!(out.join("conf/nested").is_dir());
        assert_eq!(fs::read_to_string(out.join("conf/app.yml")).unwrap(), "port: 80\n");
        assert_eq!(fs::read(out.join("run.sh")).unwrap(), b"#!/bin/sh\n");
        assert_eq!(summary.folders.len(), 2);
        assert_eq!(summary.files.len(), 2);
        // Written in path order
        assert!(summary.files[0].path.ends_with("conf/app.yml"));
    }

    #[cfg(unix)]
    #[test]
    fn test_write_preserves_permissions() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), &sample()).unwrap();

        let mode = mode_bits(&fs::metadata(dir.path().join("run.sh")).unwrap());
        assert_eq!(mode, 0o755);
        let mode = mode_bits(&fs::metadata(dir.path().join("conf/app.yml")).unwrap());
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn test_write_empty_result_creates_output_root() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty");
        write(&out, &BuildResult::new()).unwrap();
        assert!(out.is_dir());
    }

    #[test]
    fn test_write_fails_when_output_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("blocker");
        fs::write(&out, "x").unwrap();

        let err = write(&out, &sample()).unwrap_err();
        assert!(matches!(err, CoreError::Write { .. }));
    }
}
