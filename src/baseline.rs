//! Sequential-run baseline: `<object count> <run id> <elapsed secs>` on the first line.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BaselineError {
    #[error("Sequential data not available ({})", .0.display())]
    Missing(PathBuf),
    #[error("{}: expected `<objects> <run id> <seconds>`, found `{line}`", .path.display())]
    Malformed { path: PathBuf, line: String },
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Baseline {
    pub object_count: String,
    pub run_id: String,
    pub elapsed_secs: f64,
}

impl Baseline {
    pub fn load(path: &Path) -> Result<Self, BaselineError> {
        if !path.exists() {
            return Err(BaselineError::Missing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| BaselineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let line = content.lines().next().unwrap_or_default();
        Self::parse_line(line).ok_or_else(|| BaselineError::Malformed {
            path: path.to_path_buf(),
            line: line.to_string(),
        })
    }

    fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let (count, run_id, secs) = (fields.next()?, fields.next()?, fields.next()?);
        if fields.next().is_some() {
            return None;
        }
        Some(Self {
            object_count: count.to_string(),
            run_id: run_id.to_string(),
            elapsed_secs: secs.parse().ok()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_fields() {
        let b = Baseline::parse_line("10000 7 123.5").unwrap();
        assert_eq!(b.object_count, "10000");
        assert_eq!(b.run_id, "7");
        assert_eq!(b.elapsed_secs, 123.5);
    }

    #[test]
    fn rejects_wrong_field_counts_and_bad_time() {
        assert!(Baseline::parse_line("10000 7").is_none());
        assert!(Baseline::parse_line("10000 7 1.0 extra").is_none());
        assert!(Baseline::parse_line("10000 7 soon").is_none());
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = Baseline::load(&dir.path().join("sequential.dat")).unwrap_err();
        assert!(matches!(err, BaselineError::Missing(_)));
        assert!(err.to_string().starts_with("Sequential data not available"));
    }

    #[test]
    fn reads_only_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sequential.dat");
        std::fs::write(&path, "64 3 98.25\ngarbage here\n").unwrap();
        assert_eq!(Baseline::load(&path).unwrap().elapsed_secs, 98.25);
    }
}
