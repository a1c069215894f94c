//! Object store boundary.
//!
//! The lifecycle manager and admission pipeline only ever talk to the
//! [`ObjectStore`] trait; backends can be swapped without touching domain
//! logic. The in-memory backend serves local development and tests.

pub mod memory;
pub mod presign;

pub use memory::MemoryStore;
pub use presign::{PresignedUrl, Presigner};

use async_trait::async_trait;

/// Errors surfaced by store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A stored object's raw bytes plus content type.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Minimal object metadata returned by existence probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHead {
    pub size: u64,
}

/// Object store contract: keyed blobs with prefix listing, delimiter
/// grouping, bulk delete, and tagging. All operations are blocking round
/// trips from the caller's perspective; retries are the caller's concern.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write an object, replacing any existing content at `key`.
    async fn put(&self, key: &str, content_type: &str, body: Vec<u8>) -> StoreResult<()>;

    /// Fetch an object's content. `NotFound` if absent.
    async fn get(&self, key: &str) -> StoreResult<StoredObject>;

    /// Lightweight existence probe. `NotFound` if absent.
    async fn head(&self, key: &str) -> StoreResult<ObjectHead>;

    /// Delete one object. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Bulk delete. Absent keys are skipped silently.
    async fn delete_many(&self, keys: &[String]) -> StoreResult<usize>;

    /// List the immediate "sub-folders" under `prefix` using `/` as the
    /// delimiter, e.g. `applications/` -> `["applications/2024/",
    /// "applications/2025/"]`. Order is store-defined.
    async fn list_dirs(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// List every object key under `prefix` (no delimiter grouping).
    async fn list_keys(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Replace the tag set on an object. Re-tagging is idempotent.
    async fn put_tags(&self, key: &str, tags: &[(String, String)]) -> StoreResult<()>;

    /// Read back an object's tag set.
    async fn get_tags(&self, key: &str) -> StoreResult<Vec<(String, String)>>;
}
