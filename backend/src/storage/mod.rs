//! # Storage layer
//!
//! The engine's view of durable storage is deliberately narrow: a
//! synchronous key-value byte store holding four independent blobs,
//! each read once at startup and rewritten in full on every
//! corresponding in-memory change. Writes are best-effort: a failure
//! is logged and swallowed, and the in-memory state remains the source
//! of truth for the rest of the session.

pub mod fs_store;
pub mod memory;
pub mod traits;

pub use fs_store::FsBlobStore;
pub use memory::MemoryBlobStore;
pub use traits::BlobStore;

/// Blob key for the current (possibly absent) signed-in caregiver.
pub const USER_KEY: &str = "user";
/// Blob key for the child-profile collection.
pub const CHILDREN_KEY: &str = "children";
/// Blob key for the full log ledger.
pub const LOGS_KEY: &str = "logs";
/// Blob key for the educator connection id set.
pub const CONNECTIONS_KEY: &str = "connections";
