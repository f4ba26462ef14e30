//! File system atomic blob store.
//!
//! Writes follow this sequence:
//!
//! 1. Write data to a temporary file in the target's directory
//! 2. `fsync` the temporary file
//! 3. Rename the temporary file over the target
//! 4. `fsync` the parent directory (Unix)
//!
//! A crash before step 3 leaves the previous file untouched and at most a
//! stray temporary file, which is never read and is overwritten by the next
//! write.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

use super::AtomicBlobStore;

/// [`AtomicBlobStore`] over the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileBlobStore;

impl FileBlobStore {
    /// Creates the file blob store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the temporary path used while replacing `path`.
    #[must_use]
    pub fn temp_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map_or_else(|| "blob".into(), |name| name.to_string_lossy());
        path.with_file_name(format!(".{name}.tmp"))
    }

    #[cfg(unix)]
    fn sync_directory(dir: &Path) -> StoreResult<()> {
        let handle = File::open(dir).map_err(|err| {
            StoreError::io(format!("open directory '{}' for sync", dir.display()), err)
        })?;
        handle
            .sync_all()
            .map_err(|err| StoreError::io(format!("sync directory '{}'", dir.display()), err))
    }

    #[cfg(not(unix))]
    #[allow(clippy::unnecessary_wraps)]
    fn sync_directory(_dir: &Path) -> StoreResult<()> {
        // The rename itself is atomic on NTFS; directory handles cannot be synced.
        Ok(())
    }
}

impl AtomicBlobStore for FileBlobStore {
    fn read(&self, path: &Path) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::io(format!("read '{}'", path.display()), err)),
        }
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> StoreResult<()> {
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)
            .map_err(|err| StoreError::io(format!("create directory '{}'", dir.display()), err))?;

        let temp_path = Self::temp_path(path);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|err| {
                StoreError::io(format!("create temporary file '{}'", temp_path.display()), err)
            })?;

        let written = file
            .write_all(bytes)
            .and_then(|()| file.sync_all())
            .map_err(|err| StoreError::io(format!("write '{}'", temp_path.display()), err));
        drop(file);
        if let Err(err) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }

        fs::rename(&temp_path, path).map_err(|err| {
            let _ = fs::remove_file(&temp_path);
            StoreError::io(
                format!("rename '{}' to '{}'", temp_path.display(), path.display()),
                err,
            )
        })?;

        Self::sync_directory(dir)
    }

    fn delete(&self, path: &Path) -> StoreResult<()> {
        match fs::remove_file(path) {
            Ok(()) => {
                if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                    Self::sync_directory(dir)?;
                }
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::io(format!("delete '{}'", path.display()), err)),
        }
    }

    fn exists(&self, path: &Path) -> StoreResult<bool> {
        Ok(path.is_file())
    }
}
