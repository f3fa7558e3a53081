//! Manifest snapshot persistence
//!
//! The snapshot store holds exactly one value: the manifest that was active
//! after the last completed reconciliation. The disk variant writes through
//! a temp file and rename so the recorded manifest is either the old one or
//! the new one, never a torn write.

use super::SnapshotStore;
use crate::error::{ShelterError, ShelterResult};
use crate::manifest::Manifest;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;

/// JSON-file-backed snapshot store
pub struct DiskSnapshotStore {
    path: PathBuf,
}

impl DiskSnapshotStore {
    /// Create a store over `path`; parent directories are created on save
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SnapshotStore for DiskSnapshotStore {
    async fn load(&self) -> ShelterResult<Option<Manifest>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| ShelterError::io(format!("reading {}", self.path.display()), e))?;

        let manifest =
            serde_json::from_str(&content).map_err(|e| ShelterError::SnapshotCorrupt(e.to_string()))?;
        Ok(Some(manifest))
    }

    async fn save(&self, manifest: &Manifest) -> ShelterResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShelterError::io("creating snapshot directory", e))?;
        }

        let content = serde_json::to_string_pretty(manifest)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content)
            .await
            .map_err(|e| ShelterError::io(format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ShelterError::io(format!("replacing {}", self.path.display()), e))?;

        Ok(())
    }

    async fn clear(&self) -> ShelterResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ShelterError::io(
                format!("deleting {}", self.path.display()),
                e,
            )),
        }
    }
}

/// In-memory snapshot store for tests and ephemeral runs
#[derive(Default)]
pub struct MemorySnapshotStore {
    manifest: RwLock<Option<Manifest>>,
}

impl MemorySnapshotStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> ShelterResult<Option<Manifest>> {
        Ok(self.manifest.read().await.clone())
    }

    async fn save(&self, manifest: &Manifest) -> ShelterResult<()> {
        *self.manifest.write().await = Some(manifest.clone());
        Ok(())
    }

    async fn clear(&self) -> ShelterResult<()> {
        *self.manifest.write().await = None;
        Ok(())
    }
}
