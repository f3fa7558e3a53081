//! Configuration management for Shelter

pub mod schema;

pub use schema::Config;

use crate::error::{ShelterError, ShelterResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// File name of project-local configuration
pub const LOCAL_CONFIG_NAME: &str = ".shelter.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shelter")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shelter")
    }

    /// Get the default store directory path
    pub fn cache_dir() -> PathBuf {
        Self::state_dir().join("cache")
    }

    /// Walk upward from `start` looking for a project-local config file
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        let mut dir = Some(start);
        while let Some(current) = dir {
            let candidate = current.join(LOCAL_CONFIG_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            dir = current.parent();
        }
        None
    }

    /// Load configuration, using defaults if not exists
    pub async fn load(&self) -> ShelterResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> ShelterResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ShelterError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| ShelterError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load the global config with a project-local file merged over it.
    ///
    /// Keys set in the local file win; everything else falls through to
    /// the global config (or its defaults).
    pub async fn load_merged(&self, local: Option<&Path>) -> ShelterResult<Config> {
        let Some(local) = local else {
            return self.load().await;
        };

        let mut merged = if self.config_path.exists() {
            self.read_value(&self.config_path).await?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        let overlay = self.read_value(local).await?;
        merge_value(&mut merged, overlay);

        debug!("Merged local config from {}", local.display());
        merged.try_into().map_err(|e: toml::de::Error| {
            ShelterError::ConfigInvalid {
                path: local.to_path_buf(),
                reason: e.to_string(),
            }
        })
    }

    async fn read_value(&self, path: &Path) -> ShelterResult<toml::Value> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ShelterError::io(format!("reading config from {}", path.display()), e))?;

        content
            .parse()
            .map_err(|e: toml::de::Error| ShelterError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> ShelterResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ShelterError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> ShelterResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShelterError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Ensure all state directories exist
    pub async fn ensure_state_dirs() -> ShelterResult<()> {
        let dirs = [Self::state_dir(), Self::cache_dir()];

        for dir in &dirs {
            fs::create_dir_all(dir).await.map_err(|e| {
                ShelterError::io(format!("creating directory {}", dir.display()), e)
            })?;
        }

        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively merge `overlay` into `base`; overlay tables merge per key,
/// anything else replaces the base value
fn merge_value(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.network.origin, "http://localhost:8080");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.network.origin = "https://app.example.com".to_string();

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.network.origin, "https://app.example.com");
    }

    #[tokio::test]
    async fn load_rejects_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        let manager = ConfigManager::with_path(path);
        let err = manager.load().await.unwrap_err();
        assert!(matches!(err, ShelterError::ConfigInvalid { .. }));
    }

    #[tokio::test]
    async fn merged_local_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global_path = temp.path().join("config.toml");
        let local_path = temp.path().join(LOCAL_CONFIG_NAME);

        std::fs::write(
            &global_path,
            "[network]\norigin = \"https://global.example.com\"\ntimeout_secs = 60\n",
        )
        .unwrap();
        std::fs::write(
            &local_path,
            "[network]\norigin = \"https://local.example.com\"\n\n[cache]\nephemeral = true\n",
        )
        .unwrap();

        let manager = ConfigManager::with_path(global_path);
        let config = manager.load_merged(Some(&local_path)).await.unwrap();

        // Local key wins, untouched global keys survive, defaults fill the rest
        assert_eq!(config.network.origin, "https://local.example.com");
        assert_eq!(config.network.timeout_secs, 60);
        assert!(config.cache.ephemeral);
        assert_eq!(config.network.concurrency, 4);
    }

    #[tokio::test]
    async fn merged_without_global_file() {
        let temp = TempDir::new().unwrap();
        let local_path = temp.path().join(LOCAL_CONFIG_NAME);
        std::fs::write(&local_path, "[general]\nverbose = true\n").unwrap();

        let manager = ConfigManager::with_path(temp.path().join("missing.toml"));
        let config = manager.load_merged(Some(&local_path)).await.unwrap();

        assert!(config.general.verbose);
        assert_eq!(config.network.origin, "http://localhost:8080");
    }

    #[test]
    fn find_local_config_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b").join("c");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(LOCAL_CONFIG_NAME), "").unwrap();

        let found = ConfigManager::find_local_config(&nested).unwrap();
        assert_eq!(found, temp.path().join(LOCAL_CONFIG_NAME));
    }

    #[test]
    fn find_local_config_none_when_absent() {
        let temp = TempDir::new().unwrap();
        // Only guaranteed when no ancestor of the temp dir has one
        if ConfigManager::find_local_config(temp.path()).is_some() {
            return;
        }
        assert!(ConfigManager::find_local_config(temp.path()).is_none());
    }
}
