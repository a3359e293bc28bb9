//! Bundle storage in a directory on the local filesystem.
//!
//! Each bundle is one `<bundle id>.upwell` file. Writes go to a temporary
//! file first and are renamed into place, so a reader never sees a partial
//! archive.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{BoxFuture, BundleStorage};
use crate::error::{Result, UpwellError};

/// File extension of stored bundles.
pub const BUNDLE_EXT: &str = "upwell";

/// Bundles stored as files under one directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Use `root` as the library directory. It is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(UpwellError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid bundle id '{}'", id),
            )));
        }
        Ok(self.root.join(format!("{}.{}", id, BUNDLE_EXT)))
    }
}

impl BundleStorage for FileStorage {
    fn load<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            let path = self.path_for(id)?;
            match std::fs::read(&path) {
                Ok(bytes) => Ok(bytes),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    Err(UpwellError::BundleNotFound(id.to_string()))
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    fn save<'a>(&'a self, id: &'a str, bytes: &'a [u8]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let path = self.path_for(id)?;
            std::fs::create_dir_all(&self.root)?;
            let tmp = path.with_extension(format!("{}.tmp", BUNDLE_EXT));
            std::fs::write(&tmp, bytes)?;
            std::fs::rename(&tmp, &path)?;
            log::debug!("wrote {} ({} bytes)", path.display(), bytes.len());
            Ok(())
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let path = self.path_for(id)?;
            match std::fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn list<'a>(&'a self) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(async move {
            let entries = match std::fs::read_dir(&self.root) {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            };

            let mut ids = Vec::new();
            for entry in entries {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == BUNDLE_EXT)
                    && let Some(stem) = path.file_stem()
                {
                    ids.push(stem.to_string_lossy().into_owned());
                }
            }
            ids.sort();
            Ok(ids)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::future::block_on;

    #[test]
    fn test_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("library"));

        assert!(block_on(storage.list()).unwrap().is_empty());
        block_on(storage.save("doc-1", b"archive")).unwrap();

        assert!(dir.path().join("library").join("doc-1.upwell").exists());
        assert_eq!(block_on(storage.load("doc-1")).unwrap(), b"archive");
        assert_eq!(block_on(storage.list()).unwrap(), vec!["doc-1"]);
    }

    #[test]
    fn test_missing_bundle_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let err = block_on(storage.load("nope")).unwrap_err();
        assert!(err.is_not_found());
        block_on(storage.delete("nope")).unwrap();
    }

    #[test]
    fn test_list_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let storage = FileStorage::new(dir.path());
        block_on(storage.save("a", b"1")).unwrap();

        assert_eq!(block_on(storage.list()).unwrap(), vec!["a"]);
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(block_on(storage.save("../escape", b"x")).is_err());
    }
}
