//! Named stores backing the shell cache
//!
//! Three store roles, each an explicit dependency of the reconciler rather
//! than an ambient singleton: the durable content store that answers
//! requests, the transient staging store populated during install, and the
//! one-entry snapshot store recording the manifest of the last completed
//! reconciliation.

pub mod disk;
pub mod memory;
pub mod snapshot;

pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use snapshot::{DiskSnapshotStore, MemorySnapshotStore};

use crate::error::ShelterResult;
use crate::manifest::Manifest;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// A cached response with enough metadata to serve it again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResource {
    /// Status the resource was fetched with
    pub status: u16,

    /// Response headers, in arrival order
    pub headers: Vec<(String, String)>,

    /// Response body bytes
    pub body: Vec<u8>,

    /// When the resource was fetched
    pub fetched_at: DateTime<Utc>,
}

/// Key-value store mapping logical resource keys to cached responses.
///
/// Every mutation commits independently; there is no multi-entry
/// transaction, so readers see a consistent store at every intermediate
/// step of a reconciliation.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a cached resource by logical key
    async fn get(&self, key: &str) -> ShelterResult<Option<CachedResource>>;

    /// Insert or overwrite a resource
    async fn put(&self, key: &str, resource: CachedResource) -> ShelterResult<()>;

    /// Remove a resource; removing an absent key is not an error
    async fn delete(&self, key: &str) -> ShelterResult<()>;

    /// Whether a key is present
    async fn contains(&self, key: &str) -> ShelterResult<bool>;

    /// All keys currently present, in unspecified order
    async fn keys(&self) -> ShelterResult<Vec<String>>;

    /// Remove every entry
    async fn clear(&self) -> ShelterResult<()>;
}

/// One-entry durable store holding the manifest that was active after the
/// last completed reconciliation
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// The recorded manifest, or `None` if no reconciliation has completed
    async fn load(&self) -> ShelterResult<Option<Manifest>>;

    /// Replace the recorded manifest
    async fn save(&self, manifest: &Manifest) -> ShelterResult<()>;

    /// Forget the recorded manifest
    async fn clear(&self) -> ShelterResult<()>;
}

/// The three named stores a worker generation operates on
#[derive(Clone)]
pub struct StoreSet {
    /// Durable store answering intercepted requests
    pub content: Arc<dyn CacheStore>,

    /// Transient store filled during install, drained during activation
    pub staging: Arc<dyn CacheStore>,

    /// Manifest of the last completed reconciliation
    pub snapshot: Arc<dyn SnapshotStore>,
}

impl StoreSet {
    /// Disk-backed stores rooted at `dir`
    pub fn open(dir: &Path) -> Self {
        Self {
            content: Arc::new(DiskStore::new(dir.join("content"))),
            staging: Arc::new(DiskStore::new(dir.join("staging"))),
            snapshot: Arc::new(DiskSnapshotStore::new(dir.join("snapshot.json"))),
        }
    }

    /// In-memory stores for tests and `--ephemeral` runs
    pub fn ephemeral() -> Self {
        Self {
            content: Arc::new(MemoryStore::new()),
            staging: Arc::new(MemoryStore::new()),
            snapshot: Arc::new(MemorySnapshotStore::new()),
        }
    }
}
