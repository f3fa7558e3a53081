//! CLI command implementations

pub mod clear;
pub mod config;
pub mod fetch;
pub mod init;
pub mod message;
pub mod offline;
pub mod status;
pub mod sync;

pub use clear::execute as clear;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use init::execute as init;
pub use message::execute as message;
pub use offline::execute as offline;
pub use status::execute as status;
pub use sync::execute as sync;

use crate::config::{Config, ConfigManager};
use crate::error::{ShelterError, ShelterResult};
use crate::fetch::HttpFetcher;
use crate::manifest::{Manifest, Origin};
use crate::store::StoreSet;
use crate::worker::Worker;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Resolve the manifest path from a CLI override or config
fn manifest_path(override_path: Option<&Path>, config: &Config) -> ShelterResult<PathBuf> {
    override_path
        .map(Path::to_path_buf)
        .or_else(|| config.manifest.path.clone())
        .ok_or_else(|| {
            ShelterError::User(
                "No manifest configured. Pass --manifest <path> or set manifest.path in your config"
                    .to_string(),
            )
        })
}

/// Resolve the store directory from config
pub(crate) fn store_dir(config: &Config) -> PathBuf {
    config
        .cache
        .dir
        .clone()
        .unwrap_or_else(ConfigManager::cache_dir)
}

/// Build a worker from configuration and an optional manifest override
pub(crate) async fn build_worker(
    config: &Config,
    manifest_override: Option<&Path>,
    ephemeral: bool,
) -> ShelterResult<Worker> {
    let path = manifest_path(manifest_override, config)?;
    let manifest = Manifest::load(&path).await?;
    let origin = Origin::new(&config.network.origin)?;

    let stores = if ephemeral || config.cache.ephemeral {
        StoreSet::ephemeral()
    } else {
        StoreSet::open(&store_dir(config))
    };

    let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(
        config.network.timeout_secs,
    ))?);

    Ok(Worker::new(
        manifest,
        origin,
        stores,
        fetcher,
        config.network.concurrency,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_path_prefers_override() {
        let mut config = Config::default();
        config.manifest.path = Some(PathBuf::from("from-config.json"));

        let path = manifest_path(Some(Path::new("override.json")), &config).unwrap();
        assert_eq!(path, PathBuf::from("override.json"));

        let path = manifest_path(None, &config).unwrap();
        assert_eq!(path, PathBuf::from("from-config.json"));
    }

    #[test]
    fn manifest_path_errors_when_unset() {
        let config = Config::default();
        let err = manifest_path(None, &config).unwrap_err();
        assert!(err.to_string().contains("No manifest configured"));
    }

    #[test]
    fn store_dir_prefers_config_override() {
        let mut config = Config::default();
        config.cache.dir = Some(PathBuf::from("/tmp/custom-stores"));
        assert_eq!(store_dir(&config), PathBuf::from("/tmp/custom-stores"));
    }
}
