//! Filesystem utility functions used across the crate.

use crate::error::{Error, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Create `dir` and any missing ancestors.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// List the non-directory entries directly inside `dir`, sorted by file name.
///
/// Symlinks are followed: a link to a directory is skipped like the
/// directory itself.
pub fn list_templates(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| Error::ListDir {
            path: dir.to_path_buf(),
            source,
        })?;

        if entry.file_type().is_dir() {
            tracing::debug!(path = %entry.path().display(), "skipping directory");
            continue;
        }
        out.push(entry.into_path());
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn ensure_dir_creates_ancestors() {
        let tmp = TempDir::new().unwrap();
        let deep = tmp.path().join("a/b/c");
        ensure_dir(&deep).unwrap();
        assert!(deep.is_dir());
        // Idempotent.
        ensure_dir(&deep).unwrap();
    }

    #[test]
    fn ensure_dir_reports_blocking_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file");
        fs::write(&file, "x").unwrap();
        let err = ensure_dir(&file.join("sub")).unwrap_err();
        assert!(matches!(err, Error::CreateDir { .. }), "{err}");
    }

    #[test]
    fn lists_files_sorted_and_skips_dirs() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.tpl"), "").unwrap();
        fs::write(tmp.path().join("a.tpl"), "").unwrap();
        fs::create_dir(tmp.path().join("c")).unwrap();
        fs::write(tmp.path().join("c/nested.tpl"), "").unwrap();

        let names: Vec<_> = list_templates(tmp.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.tpl", "b.tpl"]);
    }

    #[test]
    fn missing_dir_is_list_error() {
        let tmp = TempDir::new().unwrap();
        let err = list_templates(&tmp.path().join("absent")).unwrap_err();
        assert!(matches!(err, Error::ListDir { .. }), "{err}");
    }
}
