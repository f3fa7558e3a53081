//! Configuration schema for Shelter
//!
//! Configuration is stored at `~/.config/shelter/config.toml`, with
//! project-local overrides in `.shelter.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Manifest settings
    pub manifest: ManifestConfig,

    /// Network settings
    pub network: NetworkConfig,

    /// Store settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Manifest configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Path to the build-produced manifest JSON
    pub path: Option<PathBuf>,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Origin the manifest's logical keys are resolved against
    pub origin: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum concurrent fetches during staging and offline population
    pub concurrency: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
            timeout_secs: 30,
            concurrency: 4,
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Store directory override (defaults under the platform state dir)
    pub dir: Option<PathBuf>,

    /// Keep stores in memory only
    pub ephemeral: bool,
}
