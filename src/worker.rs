//! Worker lifecycle and request interception
//!
//! One worker generation owns the stores, the manifest, and the
//! reconciler, and exposes the four lifecycle triggers: install, activate,
//! fetch, and message. Requests are answered cache-first, except the
//! document root which goes online-first so the entry page always reflects
//! the latest deployment.

use crate::error::{ShelterError, ShelterResult};
use crate::fetch::{FetchMode, ResourceFetcher};
use crate::manifest::{Manifest, Origin, ROOT_KEY};
use crate::reconcile::Reconciler;
use crate::store::{CachedResource, StoreSet};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Message requesting immediate takeover by a staged generation
pub const MSG_SKIP_WAITING: &str = "skip-waiting";

/// Message requesting on-demand full-offline population
pub const MSG_DOWNLOAD_OFFLINE: &str = "download-offline";

/// Lifecycle phase of a worker generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    /// No lifecycle trigger has run yet
    Idle,

    /// Shell resources are staged, awaiting activation
    Staged,

    /// Reconciliation completed, serving traffic
    Active,
}

/// An intercepted request
#[derive(Debug, Clone)]
pub struct Request {
    method: String,
    url: String,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
        }
    }

    /// Shorthand for a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

/// Where an intercepted response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

/// Outcome of running a request through the interception policy
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Not intercepted; the underlying network stack should handle it
    PassThrough,

    /// Intercepted and answered
    Response {
        key: String,
        source: ResponseSource,
        resource: CachedResource,
    },
}

/// A worker generation bound to one manifest
pub struct Worker {
    manifest: Manifest,
    origin: Origin,
    stores: StoreSet,
    fetcher: Arc<dyn ResourceFetcher>,
    reconciler: Reconciler,
    concurrency: usize,
    phase: RwLock<WorkerPhase>,
}

impl Worker {
    pub fn new(
        manifest: Manifest,
        origin: Origin,
        stores: StoreSet,
        fetcher: Arc<dyn ResourceFetcher>,
        concurrency: usize,
    ) -> Self {
        let reconciler = Reconciler::new(
            stores.clone(),
            manifest.clone(),
            origin.clone(),
            Arc::clone(&fetcher),
            concurrency,
        );
        Self {
            manifest,
            origin,
            stores,
            fetcher,
            reconciler,
            concurrency: concurrency.max(1),
            phase: RwLock::new(WorkerPhase::Idle),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn stores(&self) -> &StoreSet {
        &self.stores
    }

    pub async fn phase(&self) -> WorkerPhase {
        *self.phase.read().await
    }

    /// Install trigger: stage the shell resource set
    pub async fn handle_install(&self) -> ShelterResult<usize> {
        let staged = self.reconciler.install().await?;
        *self.phase.write().await = WorkerPhase::Staged;
        Ok(staged)
    }

    /// Activate trigger: run reconciliation and start serving
    pub async fn handle_activate(&self) -> ShelterResult<()> {
        self.reconciler.activate().await?;
        *self.phase.write().await = WorkerPhase::Active;
        Ok(())
    }

    /// Install then activate, the normal upgrade cycle
    pub async fn sync(&self) -> ShelterResult<usize> {
        let staged = self.handle_install().await?;
        self.handle_activate().await?;
        Ok(staged)
    }

    /// Fetch trigger: run one request through the interception policy
    pub async fn handle_fetch(&self, request: &Request) -> ShelterResult<FetchOutcome> {
        if !request.is_get() {
            return Ok(FetchOutcome::PassThrough);
        }

        let Some(key) = self.origin.logical_key(request.url()) else {
            return Ok(FetchOutcome::PassThrough);
        };

        if !self.manifest.contains(&key) {
            return Ok(FetchOutcome::PassThrough);
        }

        // The entry page must reflect the latest deployment
        if key == ROOT_KEY {
            self.online_first(&key).await
        } else {
            self.cache_first(&key).await
        }
    }

    async fn cache_first(&self, key: &str) -> ShelterResult<FetchOutcome> {
        if let Some(hit) = self.stores.content.get(key).await? {
            debug!("cache hit for {}", key);
            return Ok(FetchOutcome::Response {
                key: key.to_string(),
                source: ResponseSource::Cache,
                resource: hit,
            });
        }

        // Miss: fetch, and populate lazily only on a success status. A
        // network error propagates since there is no cached fallback here.
        let url = self.origin.url_for(key);
        let fetched = self.fetcher.fetch(&url, FetchMode::Default).await?;
        let cacheable = fetched.is_success();
        let resource = fetched.into_cached();

        if cacheable {
            self.stores.content.put(key, resource.clone()).await?;
        }

        Ok(FetchOutcome::Response {
            key: key.to_string(),
            source: ResponseSource::Network,
            resource,
        })
    }

    async fn online_first(&self, key: &str) -> ShelterResult<FetchOutcome> {
        let url = self.origin.url_for(key);
        match self.fetcher.fetch(&url, FetchMode::Default).await {
            Ok(fetched) => {
                // Any resolved response is stored, success status or not
                let resource = fetched.into_cached();
                self.stores.content.put(key, resource.clone()).await?;
                Ok(FetchOutcome::Response {
                    key: key.to_string(),
                    source: ResponseSource::Network,
                    resource,
                })
            }
            Err(e) => match self.stores.content.get(key).await? {
                Some(hit) => {
                    debug!("network failed for {}, serving cached copy: {}", key, e);
                    Ok(FetchOutcome::Response {
                        key: key.to_string(),
                        source: ResponseSource::Cache,
                        resource: hit,
                    })
                }
                None => Err(e),
            },
        }
    }

    /// Manifest keys not yet present in the content store
    pub async fn missing_keys(&self) -> ShelterResult<Vec<String>> {
        let mut missing = Vec::new();
        for key in self.manifest.keys() {
            if !self.stores.content.contains(key).await? {
                missing.push(key.to_string());
            }
        }
        Ok(missing)
    }

    /// Fetch one manifest key and store it in the content store
    pub async fn cache_key(&self, key: &str) -> ShelterResult<()> {
        let url = self.origin.url_for(key);
        let fetched = self.fetcher.fetch(&url, FetchMode::Default).await?;
        if !fetched.is_success() {
            return Err(ShelterError::FetchStatus {
                url,
                status: fetched.status,
            });
        }
        self.stores.content.put(key, fetched.into_cached()).await
    }

    /// On-demand full-offline population: fetch every manifest key absent
    /// from the content store, leaving already-present entries untouched.
    pub async fn download_offline(&self) -> ShelterResult<usize> {
        let missing = self.missing_keys().await?;
        if missing.is_empty() {
            debug!("content store already covers the manifest");
            return Ok(0);
        }

        let mut fetches = stream::iter(missing.iter().map(|key| self.cache_key(key)))
            .buffer_unordered(self.concurrency);
        while let Some(result) = fetches.next().await {
            result?;
        }

        info!("cached {} resources for offline use", missing.len());
        Ok(missing.len())
    }

    /// Message trigger: two recognized commands, anything else is ignored
    pub async fn handle_message(&self, message: &str) -> ShelterResult<()> {
        match message.trim() {
            MSG_SKIP_WAITING => self.skip_waiting().await,
            MSG_DOWNLOAD_OFFLINE => self.download_offline().await.map(|_| ()),
            other => {
                debug!("ignoring unrecognized message '{}'", other);
                Ok(())
            }
        }
    }

    /// Promote a staged generation to active without waiting. A staged
    /// generation is one installed in this process, or staging left on
    /// disk by an earlier install.
    async fn skip_waiting(&self) -> ShelterResult<()> {
        let staged = *self.phase.read().await == WorkerPhase::Staged
            || !self.stores.staging.keys().await?.is_empty();
        if !staged {
            debug!("skip-waiting with no staged generation");
            return Ok(());
        }
        self.handle_activate().await
    }
}
