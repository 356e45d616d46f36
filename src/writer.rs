use crate::error::{RdbError, Result};
use std::io::Write;
use std::path::Path;

/// Replace `dest` with `bytes` all at once.
///
/// The data goes to a temporary file in the destination directory, is synced,
/// then renamed over `dest`. On any error the temporary file is removed and
/// `dest` keeps whatever it held before.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let dir = destination_dir(dest)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".rdbgen-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| RdbError::io(dir, e))?;
    let tmp_path = tmp.path().to_path_buf();

    tmp.write_all(bytes).map_err(|e| RdbError::io(&tmp_path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| RdbError::io(&tmp_path, e))?;

    // PersistError owns the temp file; dropping it deletes the file.
    tmp.persist(dest).map_err(|e| RdbError::io(dest, e.error))?;

    tracing::debug!(dest = %dest.display(), bytes = bytes.len(), "database written");
    Ok(())
}

/// The directory `dest` will live in. It must already exist.
pub fn destination_dir(dest: &Path) -> Result<&Path> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !dir.is_dir() {
        return Err(RdbError::MissingDestinationDir(dir.to_path_buf()));
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn entries(dir: &Path) -> Vec<String> {
        let mut v: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        v.sort();
        v
    }

    #[test]
    fn writes_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("database.rdb");

        write_atomic(&dest, b"first").unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"first");

        write_atomic(&dest, b"second, longer").unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"second, longer");
        assert_eq!(entries(dir.path()), ["database.rdb"]);
    }

    #[test]
    fn missing_parent_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no/such/dir/database.rdb");
        let err = write_atomic(&dest, b"x").unwrap_err();
        assert!(matches!(err, RdbError::MissingDestinationDir(_)));
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory cannot be replaced by a file
        let dest = dir.path().join("database.rdb");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("keep"), b"k").unwrap();

        let err = write_atomic(&dest, b"data").unwrap_err();
        assert!(matches!(err, RdbError::Io { .. }));
        assert_eq!(entries(dir.path()), ["database.rdb"]);
        assert!(dest.join("keep").is_file());
    }
}
