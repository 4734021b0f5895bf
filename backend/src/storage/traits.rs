//! Storage abstraction trait, allowing different byte stores to be used
//! interchangeably by the engine.

use anyhow::Result;

/// Synchronous key-value byte store.
///
/// Keys are short stable names; values are whole-blob rewrites. The
/// store offers no transactionality; the engine only ever writes one
/// complete blob per key and treats a missing key as "use the default".
pub trait BlobStore: Send + Sync {
    /// Read a blob. `Ok(None)` means the key has never been written.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace a blob in full.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
}
