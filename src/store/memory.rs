//! In-memory store backend

use super::{CacheStore, CachedResource};
use crate::error::ShelterResult;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// HashMap-backed store used by tests and ephemeral runs
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CachedResource>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> ShelterResult<Option<CachedResource>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, resource: CachedResource) -> ShelterResult<()> {
        self.entries.write().await.insert(key.to_string(), resource);
        Ok(())
    }

    async fn delete(&self, key: &str) -> ShelterResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn contains(&self, key: &str) -> ShelterResult<bool> {
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn keys(&self) -> ShelterResult<Vec<String>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn clear(&self) -> ShelterResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
