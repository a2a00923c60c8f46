use std::{fs, path::Path};

use crate::error::{FileSystemError, FileSystemResult};

/// Creates `path` and its parents if missing.
///
/// # Errors
///
/// * [`FileSystemError::NotADirectory`] if `path` exists but is not a directory
/// * [`FileSystemError::Directory`] if the directory could not be created
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();

    if path.exists() {
        if !path.is_dir() {
            return Err(FileSystemError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        return Ok(());
    }

    fs::create_dir_all(path).map_err(|err| {
        FileSystemError::Directory {
            path: path.to_path_buf(),
            action: "create",
            source: err,
        }
    })
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_ensure_dir_creates_nested() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("mirror").join("stars");

        ensure_dir_exists(&target).unwrap();
        assert!(target.is_dir());

        // second call is a no-op
        ensure_dir_exists(&target).unwrap();
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("stars");
        fs::write(&file, b"").unwrap();

        let result = ensure_dir_exists(&file);
        assert!(matches!(result, Err(FileSystemError::NotADirectory { .. })));
    }
}
