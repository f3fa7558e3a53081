//! Error types for Shelter
//!
//! All modules use `ShelterResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Shelter operations
pub type ShelterResult<T> = Result<T, ShelterError>;

/// All errors that can occur in Shelter
#[derive(Error, Debug)]
pub enum ShelterError {
    // Manifest errors
    #[error("Manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("Invalid manifest at {path}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    #[error("Invalid origin '{origin}': {reason}")]
    OriginInvalid { origin: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Store errors
    #[error("Corrupt cache entry '{key}': {reason}")]
    EntryCorrupt { key: String, reason: String },

    #[error("Corrupt manifest snapshot: {0}")]
    SnapshotCorrupt(String),

    // Fetch errors
    #[error("Fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected status {status} fetching {url}")]
    FetchStatus { url: String, status: u16 },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl ShelterError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a fetch error for a URL
    pub fn fetch(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }

    /// Create a manifest validation error
    pub fn manifest_invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ManifestInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ManifestNotFound(_) => {
                Some("Pass --manifest <path> or set manifest.path in your config")
            }
            Self::Fetch { .. } | Self::FetchStatus { .. } => {
                Some("Check network.origin in your config and that the deployment is reachable")
            }
            Self::OriginInvalid { .. } => {
                Some("Set network.origin to a bare origin like https://app.example.com")
            }
            Self::SnapshotCorrupt(_) => Some("Run: shelter clear --yes && shelter sync"),
            _ => None,
        }
    }
}
