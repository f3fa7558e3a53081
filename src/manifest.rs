//! Resource manifest and logical key handling
//!
//! A manifest is produced by the application build pipeline and maps each
//! logical resource key (a URL path, with the document root normalized to
//! `"/"`) to an opaque content fingerprint. The `shell` list names the
//! subset of keys that must be staged before the application is bootable.

use crate::error::{ShelterError, ShelterResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

/// Logical key of the document root
pub const ROOT_KEY: &str = "/";

/// Immutable mapping from logical resource key to content fingerprint,
/// plus the shell resource list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Logical key -> content fingerprint
    resources: BTreeMap<String, String>,

    /// Keys that must be available before the application is bootable
    #[serde(default)]
    shell: Vec<String>,
}

impl Manifest {
    /// Build a manifest from parts (primarily for tests and tooling)
    pub fn new(resources: BTreeMap<String, String>, shell: Vec<String>) -> Self {
        Self { resources, shell }
    }

    /// Load and validate a manifest from a JSON file
    pub async fn load(path: &Path) -> ShelterResult<Self> {
        if !path.exists() {
            return Err(ShelterError::ManifestNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ShelterError::io(format!("reading manifest {}", path.display()), e))?;

        Self::parse(&content).map_err(|reason| ShelterError::manifest_invalid(path, reason))
    }

    /// Parse and validate a manifest from a JSON string
    pub fn parse(json: &str) -> Result<Self, String> {
        let manifest: Manifest = serde_json::from_str(json).map_err(|e| e.to_string())?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), String> {
        for key in &self.shell {
            if !self.resources.contains_key(key) {
                return Err(format!("shell resource '{}' is not a manifest key", key));
            }
        }
        Ok(())
    }

    /// Fingerprint recorded for a key, if the key is part of this manifest.
    ///
    /// Absence and an empty fingerprint are distinct: a key mapped to `""`
    /// still returns `Some("")`.
    pub fn fingerprint(&self, key: &str) -> Option<&str> {
        self.resources.get(key).map(String::as_str)
    }

    /// Whether the key is part of this manifest
    pub fn contains(&self, key: &str) -> bool {
        self.resources.contains_key(key)
    }

    /// All logical keys, in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// The shell resource keys, in staging order
    pub fn shell(&self) -> &[String] {
        &self.shell
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the manifest has no resources
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Origin of the deployment the manifest describes.
///
/// Request URLs are reduced to logical keys relative to this origin; URLs
/// under any other origin are never intercepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    base: String,
}

impl Origin {
    /// Parse and normalize an origin (`scheme://host[:port]`, no path)
    pub fn new(origin: &str) -> ShelterResult<Self> {
        let invalid = |reason: &str| ShelterError::OriginInvalid {
            origin: origin.to_string(),
            reason: reason.to_string(),
        };

        let base = origin.trim().trim_end_matches('/');

        let rest = if let Some(rest) = base.strip_prefix("https://") {
            rest
        } else if let Some(rest) = base.strip_prefix("http://") {
            rest
        } else {
            return Err(invalid("must start with http:// or https://"));
        };

        if rest.is_empty() {
            return Err(invalid("missing host"));
        }
        if rest.contains('/') {
            return Err(invalid("must not include a path"));
        }

        Ok(Self {
            base: base.to_string(),
        })
    }

    /// The normalized origin string, without a trailing slash
    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Map a request URL to its logical manifest key.
    ///
    /// The origin itself, an empty path, a bare `?v=` cache-busting query,
    /// and fragment-only navigations all resolve to [`ROOT_KEY`]. Returns
    /// `None` for URLs outside this origin.
    pub fn logical_key(&self, url: &str) -> Option<String> {
        let url = url.trim();

        if url == self.base {
            return Some(ROOT_KEY.to_string());
        }

        let rest = url.strip_prefix(&self.base)?;
        let mut key = rest.strip_prefix('/')?;

        // Fragment-only navigation resolves to the root document
        if key.starts_with('#') {
            return Some(ROOT_KEY.to_string());
        }

        // Strip the version cache-busting suffix
        if let Some(pos) = key.find("?v=") {
            key = &key[..pos];
        }

        if key.is_empty() {
            return Some(ROOT_KEY.to_string());
        }

        Some(key.to_string())
    }

    /// Build the fetchable URL for a logical key
    pub fn url_for(&self, key: &str) -> String {
        if key == ROOT_KEY {
            format!("{}/", self.base)
        } else {
            format!("{}/{}", self.base, key)
        }
    }
}
