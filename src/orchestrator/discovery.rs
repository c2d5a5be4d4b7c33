//! Locating inputs: a literal file, directories matching a glob, CSV files in a folder.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// An existing regular file.
pub(crate) fn literal_file(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        anyhow::bail!("Invalid path to source: {}", path.display());
    }
    Ok(path.to_path_buf())
}

/// Directories matching `pattern`, in the glob's (lexicographic) order.
pub(crate) fn glob_dirs(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern `{pattern}`"))? {
        match entry {
            Ok(path) if path.is_dir() => dirs.push(path),
            Ok(path) => tracing::debug!(path = %path.display(), "not a directory, skipped"),
            Err(e) => tracing::warn!("unreadable glob match: {e}"),
        }
    }
    Ok(dirs)
}

/// The directory part of a glob pattern, `.` when the pattern has none.
pub(crate) fn pattern_parent(pattern: &str) -> PathBuf {
    match Path::new(pattern).parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `*.csv` files directly inside `dir`, sorted by name.
pub(crate) fn csv_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("error reading from directory {}", dir.display()))?
    {
        let path = entry
            .with_context(|| format!("error opening directory entry in {}", dir.display()))?
            .path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
