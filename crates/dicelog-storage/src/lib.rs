// Storage trait for persisting log records under composite keys
//
// Implementations:
// - KvStorage (hosted key-value store, S3-compatible endpoint)
// - FsStorage (local filesystem fallback, one JSON file per key)

use anyhow::Result;
use async_trait::async_trait;
use dicelog_core::StoredRecord;

mod fs;
mod kv;

pub use fs::FsStorage;
pub use kv::KvStorage;

/// Storage abstraction over the backing stores.
///
/// Keys are opaque composite strings (`{key}#{password}`); the backend
/// holds exactly one serialized [`StoredRecord`] per key.
///
/// Failure semantics differ by backend and are part of the contract:
/// the local backend soft-fails (`Ok(false)` from `put`/`delete`,
/// `Ok(None)` from `get`, logged) while the hosted backend propagates
/// its errors. `get` returning `Ok(None)` therefore means "absent or
/// locally unreadable" - callers must not treat it as proof the key was
/// never written.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist a record under the given key, overwriting any previous
    /// value. Returns whether the write was accepted.
    async fn put(&self, key: &str, record: &StoredRecord) -> Result<bool>;

    /// Fetch the record stored under the given key, or `None` when the
    /// key does not exist.
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>>;

    /// Remove the record stored under the given key. Deleting an absent
    /// key succeeds (idempotent delete).
    async fn delete(&self, key: &str) -> Result<bool>;
}
