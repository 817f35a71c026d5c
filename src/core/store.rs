//! Content-addressed store.
//!
//! Files are named `<sha256hex>.<ext>` inside their target folder and the
//! folder listing is the only record of what has been seen. There is no
//! index: truncating or deleting a stored file changes what counts as new.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create folder {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Storage error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of a save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written to this path
    Stored(PathBuf),

    /// A file with this name already existed; nothing written
    Deduplicated(PathBuf),
}

impl SaveOutcome {
    pub fn path(&self) -> &Path {
        match self {
            SaveOutcome::Stored(p) | SaveOutcome::Deduplicated(p) => p,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, SaveOutcome::Stored(_))
    }
}

/// Lowercase hex SHA-256 of `bytes`
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Stored file name for a digest and extension
pub fn file_name(digest: &str, extension: &str) -> String {
    if extension.is_empty() {
        digest.to_string()
    } else {
        format!("{}.{}", digest, extension)
    }
}

/// Save `bytes` into `folder` unless identical content is already there.
///
/// The name is derived before anything touches disk, and new files are
/// written to a temporary file in the same folder then renamed into place.
pub fn save(bytes: &[u8], extension: &str, folder: &Path) -> Result<SaveOutcome, StorageError> {
    let target = folder.join(file_name(&digest(bytes), extension));

    let exists = target.try_exists().map_err(|source| StorageError::Io {
        path: target.clone(),
        source,
    })?;
    if exists {
        return Ok(SaveOutcome::Deduplicated(target));
    }

    fs::create_dir_all(folder).map_err(|source| StorageError::CreateDir {
        path: folder.to_path_buf(),
        source,
    })?;

    write_atomic(bytes, folder, &target).map_err(|source| StorageError::Write {
        path: target.clone(),
        source,
    })?;

    Ok(SaveOutcome::Stored(target))
}

fn write_atomic(bytes: &[u8], folder: &Path, target: &Path) -> io::Result<()> {
    let mut tmp = NamedTempFile::new_in(folder)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;

    // NamedTempFile is created 0600
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }

    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_digest_is_lowercase_sha256() {
        assert_eq!(
            digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("ab12", "jpg"), "ab12.jpg");
        assert_eq!(file_name("ab12", ""), "ab12");
    }

    #[test]
    fn test_save_then_dedupe() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("pics").join("someone");

        let first = save(b"image bytes", "jpg", &folder).unwrap();
        assert!(first.is_new());
        assert_eq!(fs::read(first.path()).unwrap(), b"image bytes");

        let second = save(b"image bytes", "jpg", &folder).unwrap();
        assert_eq!(second, SaveOutcome::Deduplicated(first.path().to_path_buf()));
        assert_eq!(fs::read_dir(&folder).unwrap().count(), 1);
    }

    #[test]
    fn test_same_bytes_different_extension() {
        let dir = TempDir::new().unwrap();
        assert!(save(b"x", "jpg", dir.path()).unwrap().is_new());
        assert!(save(b"x", "png", dir.path()).unwrap().is_new());
    }

    #[cfg(unix)]
    #[test]
    fn test_stored_files_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let outcome = save(b"x", "gif", dir.path()).unwrap();
        let mode = fs::metadata(outcome.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
