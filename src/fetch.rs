//! Network boundary
//!
//! Fetching sits behind a trait so reconciliation and request handling can
//! be driven by a stub in tests. The one real implementation uses
//! `reqwest`.

use crate::error::{ShelterError, ShelterResult};
use crate::store::CachedResource;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

/// Cache semantics of a network fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Normal fetch; intermediate caches may answer
    Default,

    /// Bypass intermediate caches and force a fresh round trip
    Reload,
}

/// A response pulled from the network
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl FetchedResource {
    /// Whether the response carries a success status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convert into a storable cache entry, stamped now
    pub fn into_cached(self) -> CachedResource {
        CachedResource {
            status: self.status,
            headers: self.headers,
            body: self.body,
            fetched_at: Utc::now(),
        }
    }
}

/// Abstract resource fetcher
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch a URL; a network-level failure is an error, a non-success
    /// status is a resource the caller inspects
    async fn fetch(&self, url: &str, mode: FetchMode) -> ShelterResult<FetchedResource>;
}

/// reqwest-backed fetcher
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher with a per-request timeout
    pub fn new(timeout: Duration) -> ShelterResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ShelterError::HttpClient)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, mode: FetchMode) -> ShelterResult<FetchedResource> {
        let mut request = self.client.get(url);
        if mode == FetchMode::Reload {
            request = request
                .header("Cache-Control", "no-cache")
                .header("Pragma", "no-cache");
        }

        let response = request
            .send()
            .await
            .map_err(|e| ShelterError::fetch(url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| ShelterError::fetch(url, e))?
            .to_vec();

        Ok(FetchedResource {
            status,
            headers,
            body,
        })
    }
}
