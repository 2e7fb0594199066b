//! File storage behind the kline cache.
//!
//! The cache only needs list/read/write/delete over flat file names, so the
//! backend is a small trait. [`LocalDirStore`] keeps everything under one
//! directory; a remote-drive backend can slot in without touching the cache.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;

/// Flat file storage keyed by file name.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Names of all stored files.
    async fn list(&self) -> Result<Vec<String>>;

    /// Full contents of `name`.
    async fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Create or replace `name` with `contents`.
    async fn write(&self, name: &str, contents: &[u8]) -> Result<()>;

    /// Remove `name`. Removing a missing file is not an error.
    async fn delete(&self, name: &str) -> Result<()>;
}

/// [`FileStore`] over a single local directory.
pub struct LocalDirStore {
    dir: PathBuf,
}

impl LocalDirStore {
    /// Open (and create if needed) the backing directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl FileStore for LocalDirStore {
    async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.path_for(name))?)
    }

    async fn write(&self, name: &str, contents: &[u8]) -> Result<()> {
        // Write to a temp name first so a crash never leaves a half file.
        let tmp = self.path_for(&format!("{name}.tmp"));
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, self.path_for(name))?;
        debug!(file = name, bytes = contents.len(), "stored cache file");
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.path_for(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
