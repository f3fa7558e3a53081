//! Disk store backend
//!
//! One metadata file plus one body file per entry, both named by the
//! SHA-256 of the logical key so arbitrary keys map to safe file names.
//! Each mutation commits independently.

use super::{CacheStore, CachedResource};
use crate::error::{ShelterError, ShelterResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;

/// Durable directory-backed store
pub struct DiskStore {
    dir: PathBuf,
}

/// Per-entry metadata stored alongside the body file
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    key: String,
    status: u16,
    headers: Vec<(String, String)>,
    fetched_at: DateTime<Utc>,
}

impl DiskStore {
    /// Create a store over `dir`; the directory is created on first write
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn stem(key: &str) -> String {
        hex::encode(Sha256::digest(key.as_bytes()))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::stem(key)))
    }

    fn body_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.bin", Self::stem(key)))
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &str) -> ShelterResult<Option<CachedResource>> {
        let meta_path = self.meta_path(key);
        let content = match fs::read_to_string(&meta_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ShelterError::io(
                    format!("reading {}", meta_path.display()),
                    e,
                ))
            }
        };

        let meta: EntryMeta =
            serde_json::from_str(&content).map_err(|e| ShelterError::EntryCorrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        let body = fs::read(self.body_path(key))
            .await
            .map_err(|e| ShelterError::EntryCorrupt {
                key: key.to_string(),
                reason: format!("missing body file: {}", e),
            })?;

        Ok(Some(CachedResource {
            status: meta.status,
            headers: meta.headers,
            body,
            fetched_at: meta.fetched_at,
        }))
    }

    async fn put(&self, key: &str, resource: CachedResource) -> ShelterResult<()> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            ShelterError::io(format!("creating store directory {}", self.dir.display()), e)
        })?;

        // Body first, then metadata: an entry is visible only once both exist
        let body_path = self.body_path(key);
        fs::write(&body_path, &resource.body)
            .await
            .map_err(|e| ShelterError::io(format!("writing {}", body_path.display()), e))?;

        let meta = EntryMeta {
            key: key.to_string(),
            status: resource.status,
            headers: resource.headers,
            fetched_at: resource.fetched_at,
        };
        let meta_path = self.meta_path(key);
        fs::write(&meta_path, serde_json::to_string(&meta)?)
            .await
            .map_err(|e| ShelterError::io(format!("writing {}", meta_path.display()), e))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> ShelterResult<()> {
        // Metadata first so a half-deleted entry reads as absent
        for path in [self.meta_path(key), self.body_path(key)] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(ShelterError::io(format!("deleting {}", path.display()), e))
                }
            }
        }
        Ok(())
    }

    async fn contains(&self, key: &str) -> ShelterResult<bool> {
        Ok(self.meta_path(key).exists())
    }

    async fn keys(&self) -> ShelterResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(ShelterError::io(
                    format!("listing store directory {}", self.dir.display()),
                    e,
                ))
            }
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShelterError::io("walking store directory", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let content = fs::read_to_string(&path)
                .await
                .map_err(|e| ShelterError::io(format!("reading {}", path.display()), e))?;
            let meta: EntryMeta =
                serde_json::from_str(&content).map_err(|e| ShelterError::EntryCorrupt {
                    key: path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("?")
                        .to_string(),
                    reason: e.to_string(),
                })?;
            keys.push(meta.key);
        }

        Ok(keys)
    }

    async fn clear(&self) -> ShelterResult<()> {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ShelterError::io(
                format!("clearing store directory {}", self.dir.display()),
                e,
            )),
        }
    }
}
