use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

use super::traits::BlobStore;

/// Filesystem-backed blob store: one JSON file per key under a base
/// directory.
///
/// Writes go through a temp file followed by a rename so a crash
/// mid-write never leaves a torn blob behind.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    base_dir: PathBuf,
}

impl FsBlobStore {
    /// Open (creating if needed) a store rooted at `base_dir`.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        if !base_dir.exists() {
            fs::create_dir_all(&base_dir)
                .with_context(|| format!("creating data directory {}", base_dir.display()))?;
        }
        Ok(FsBlobStore { base_dir })
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", key))
    }
}

impl BlobStore for FsBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.blob_path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading blob {}", path.display())),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.blob_path(key);
        let tmp_path = self.base_dir.join(format!("{}.json.tmp", key));

        fs::write(&tmp_path, bytes)
            .with_context(|| format!("writing blob {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("committing blob {}", path.display()))?;

        debug!("Wrote {} bytes to blob '{}'", bytes.len(), key);
        Ok(())
    }
}
