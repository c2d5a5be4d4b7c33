//! Output directories and CSV files.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Remove `dir` with everything in it and create it again, empty.
pub fn reset_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).with_context(|| format!("failed to clear {}", dir.display())),
    }
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))
}

/// Write a CSV file through a temp file in the destination directory, then swap
/// it into place. An existing file's permissions carry over to the new one.
pub fn write_csv_atomic<I, R>(path: &Path, header: &[String], records: I) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;

    {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(tmp.as_file_mut());
        writer.write_record(header)?;
        for record in records {
            writer.write_record(record)?;
        }
        writer.flush()?;
    }
    tmp.as_file_mut().flush()?;

    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())
            .with_context(|| format!("failed to copy permissions of {}", path.display()))?;
    }
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Header and raw string records of a CSV file.
pub fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let header = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("failed to parse {}", path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_dir_clears_previous_outputs() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("plots").join("scheduleq");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stale.svg"), "old").unwrap();

        reset_dir(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn writes_canonical_csv_with_quoting_only_where_needed() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("out.csv");
        let header = vec!["branch".to_string(), "Total_Rollbacks_Mean".to_string()];
        write_csv_atomic(
            &path,
            &header,
            vec![vec!["main", "2.5"], vec!["fix,queue", "3"]],
        )
        .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "branch,Total_Rollbacks_Mean\nmain,2.5\n\"fix,queue\",3\n"
        );

        let (h, rows) = read_csv(&path).unwrap();
        assert_eq!(h, header);
        assert_eq!(rows[1][0], "fix,queue");
    }

    #[cfg(unix)]
    #[test]
    fn overwrite_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("out.csv");
        fs::write(&path, "x\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        write_csv_atomic(&path, &["a".to_string()], vec![vec!["1"]]).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\n1\n");
    }
}
