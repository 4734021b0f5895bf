use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::Result;

use super::traits::BlobStore;

/// In-memory blob store for tests and throwaway sessions.
///
/// Can be switched into a failing mode to exercise the engine's
/// best-effort persistence path.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail, simulating a broken medium.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of a stored blob, for assertions.
    pub fn snapshot(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().get(key).cloned()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.lock().unwrap().get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("storage medium unavailable");
        }
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_mode_rejects_writes_but_keeps_reads() {
        let store = MemoryBlobStore::new();
        store.put("user", b"null").unwrap();

        store.fail_writes(true);
        assert!(store.put("user", b"{}").is_err());

        // The previously written blob is still readable.
        assert_eq!(store.get("user").unwrap().unwrap(), b"null");
    }
}
