//! Cache reconciliation
//!
//! Brings the durable content store into agreement with the current
//! manifest. Install stages the shell resource set over the network;
//! activation merges staged entries into the content store while
//! preserving anything whose fingerprint is unchanged since the prior
//! snapshot. An error during activation wipes all three stores: a cache
//! that cannot be verified against the manifest is never kept.

use crate::error::{ShelterError, ShelterResult};
use crate::fetch::{FetchMode, ResourceFetcher};
use crate::manifest::{Manifest, Origin};
use crate::store::StoreSet;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Reconciles the content store against the current manifest
pub struct Reconciler {
    stores: StoreSet,
    manifest: Manifest,
    origin: Origin,
    fetcher: Arc<dyn ResourceFetcher>,
    concurrency: usize,
    // At most one activation may run at a time
    activation: Mutex<()>,
}

impl Reconciler {
    pub fn new(
        stores: StoreSet,
        manifest: Manifest,
        origin: Origin,
        fetcher: Arc<dyn ResourceFetcher>,
        concurrency: usize,
    ) -> Self {
        Self {
            stores,
            manifest,
            origin,
            fetcher,
            concurrency: concurrency.max(1),
            activation: Mutex::new(()),
        }
    }

    /// Stage the shell resource set, bypassing intermediate caches.
    ///
    /// Returns the number of staged resources. A network error or
    /// non-success status for any shell resource fails the install.
    pub async fn install(&self) -> ShelterResult<usize> {
        let shell = self.manifest.shell();
        debug!("staging {} shell resources", shell.len());

        let mut fetches =
            stream::iter(shell.iter().map(|key| self.stage(key))).buffer_unordered(self.concurrency);
        while let Some(result) = fetches.next().await {
            result?;
        }

        info!("staged {} shell resources", shell.len());
        Ok(shell.len())
    }

    async fn stage(&self, key: &str) -> ShelterResult<()> {
        let url = self.origin.url_for(key);
        let fetched = self.fetcher.fetch(&url, FetchMode::Reload).await?;
        if !fetched.is_success() {
            return Err(ShelterError::FetchStatus {
                url,
                status: fetched.status,
            });
        }
        self.stores.staging.put(key, fetched.into_cached()).await
    }

    /// Run one activation: reconcile the content store against the
    /// manifest and drain staging into it.
    ///
    /// On any error the content, staging, and snapshot stores are wiped
    /// and the error propagated; the next activation starts from a clean
    /// first install.
    pub async fn activate(&self) -> ShelterResult<()> {
        let _guard = self.activation.lock().await;

        match self.reconcile().await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("reconciliation failed, discarding cache state: {}", e);
                self.wipe().await;
                Err(e)
            }
        }
    }

    async fn reconcile(&self) -> ShelterResult<()> {
        match self.stores.snapshot.load().await? {
            None => self.first_install().await,
            Some(prior) => self.upgrade(&prior).await,
        }
    }

    /// No prior snapshot: rebuild the content store from staging alone
    async fn first_install(&self) -> ShelterResult<()> {
        debug!("no prior snapshot, rebuilding content store from staging");
        self.stores.content.clear().await?;
        self.drain_staging().await?;
        self.stores.snapshot.save(&self.manifest).await?;
        info!("first-install reconciliation complete");
        Ok(())
    }

    /// Prior snapshot present: evict entries that left the manifest or
    /// changed fingerprint, keep the rest without re-fetching
    async fn upgrade(&self, prior: &Manifest) -> ShelterResult<()> {
        let mut evicted = 0usize;
        for key in self.stores.content.keys().await? {
            let unchanged = match self.manifest.fingerprint(&key) {
                Some(current) => prior.fingerprint(&key) == Some(current),
                None => false,
            };
            if !unchanged {
                debug!("evicting {}", key);
                self.stores.content.delete(&key).await?;
                evicted += 1;
            }
        }

        self.drain_staging().await?;
        self.stores.snapshot.save(&self.manifest).await?;
        info!("upgrade reconciliation complete, {} entries evicted", evicted);
        Ok(())
    }

    /// Copy every staged entry into the content store, then discard
    /// staging. Shell resources always take the freshest version, so
    /// staged entries overwrite anything preserved by the sweep.
    async fn drain_staging(&self) -> ShelterResult<()> {
        for key in self.stores.staging.keys().await? {
            if let Some(resource) = self.stores.staging.get(&key).await? {
                self.stores.content.put(&key, resource).await?;
            }
        }
        self.stores.staging.clear().await
    }

    /// Best-effort deletion of all three stores after a failed
    /// reconciliation; secondary failures are logged, not propagated
    async fn wipe(&self) {
        if let Err(e) = self.stores.content.clear().await {
            warn!("failed to clear content store during wipe: {}", e);
        }
        if let Err(e) = self.stores.staging.clear().await {
            warn!("failed to clear staging store during wipe: {}", e);
        }
        if let Err(e) = self.stores.snapshot.clear().await {
            warn!("failed to clear snapshot store during wipe: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchedResource;
    use crate::store::{CachedResource, SnapshotStore};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::sync::Mutex as StdMutex;

    struct StubFetcher {
        responses: BTreeMap<String, (u16, &'static str)>,
        calls: StdMutex<Vec<(String, FetchMode)>>,
    }

    impl StubFetcher {
        fn new(responses: &[(&str, u16, &'static str)]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|(url, status, body)| (url.to_string(), (*status, *body)))
                    .collect(),
                calls: StdMutex::new(vec![]),
            }
        }

        fn calls(&self) -> Vec<(String, FetchMode)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResourceFetcher for StubFetcher {
        async fn fetch(&self, url: &str, mode: FetchMode) -> ShelterResult<FetchedResource> {
            self.calls.lock().unwrap().push((url.to_string(), mode));
            match self.responses.get(url) {
                Some((status, body)) => Ok(FetchedResource {
                    status: *status,
                    headers: vec![],
                    body: body.as_bytes().to_vec(),
                }),
                None => Err(ShelterError::Internal(format!("network down: {}", url))),
            }
        }
    }

    struct FailingSnapshotStore;

    #[async_trait]
    impl SnapshotStore for FailingSnapshotStore {
        async fn load(&self) -> ShelterResult<Option<Manifest>> {
            Err(ShelterError::SnapshotCorrupt("stub failure".to_string()))
        }

        async fn save(&self, _manifest: &Manifest) -> ShelterResult<()> {
            Err(ShelterError::SnapshotCorrupt("stub failure".to_string()))
        }

        async fn clear(&self) -> ShelterResult<()> {
            Ok(())
        }
    }

    fn manifest(entries: &[(&str, &str)], shell: &[&str]) -> Manifest {
        Manifest::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            shell.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn resource(body: &str) -> CachedResource {
        CachedResource {
            status: 200,
            headers: vec![],
            body: body.as_bytes().to_vec(),
            fetched_at: Utc::now(),
        }
    }

    fn origin() -> Origin {
        Origin::new("https://app.example.com").unwrap()
    }

    fn reconciler(stores: &StoreSet, manifest: Manifest, fetcher: Arc<StubFetcher>) -> Reconciler {
        Reconciler::new(stores.clone(), manifest, origin(), fetcher, 2)
    }

    #[tokio::test]
    async fn install_stages_shell_with_reload() {
        let stores = StoreSet::ephemeral();
        let fetcher = Arc::new(StubFetcher::new(&[
            ("https://app.example.com/", 200, "<html>"),
            ("https://app.example.com/main.js", 200, "js"),
        ]));
        let r = reconciler(
            &stores,
            manifest(&[("/", "h1"), ("main.js", "h2")], &["/", "main.js"]),
            Arc::clone(&fetcher),
        );

        let staged = r.install().await.unwrap();
        assert_eq!(staged, 2);

        let mut keys = stores.staging.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["/", "main.js"]);

        for (_, mode) in fetcher.calls() {
            assert_eq!(mode, FetchMode::Reload);
        }
    }

    #[tokio::test]
    async fn install_fails_on_error_status() {
        let stores = StoreSet::ephemeral();
        let fetcher = Arc::new(StubFetcher::new(&[(
            "https://app.example.com/main.js",
            503,
            "unavailable",
        )]));
        let r = reconciler(&stores, manifest(&[("main.js", "h2")], &["main.js"]), fetcher);

        let err = r.install().await.unwrap_err();
        assert!(matches!(err, ShelterError::FetchStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn install_fails_on_network_error() {
        let stores = StoreSet::ephemeral();
        let fetcher = Arc::new(StubFetcher::new(&[]));
        let r = reconciler(&stores, manifest(&[("main.js", "h2")], &["main.js"]), fetcher);

        assert!(r.install().await.is_err());
    }

    #[tokio::test]
    async fn first_install_rebuilds_from_staging() {
        let stores = StoreSet::ephemeral();
        let current = manifest(&[("/", "h1"), ("a.js", "h2")], &[]);

        // A stray entry from a previous, unrecorded generation
        stores.content.put("stale.js", resource("old")).await.unwrap();
        stores.staging.put("/", resource("<html>")).await.unwrap();
        stores.staging.put("a.js", resource("js")).await.unwrap();

        let r = reconciler(&stores, current.clone(), Arc::new(StubFetcher::new(&[])));
        r.activate().await.unwrap();

        let mut keys = stores.content.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["/", "a.js"]);
        assert!(stores.staging.keys().await.unwrap().is_empty());
        assert_eq!(stores.snapshot.load().await.unwrap().unwrap(), current);
    }

    #[tokio::test]
    async fn upgrade_evicts_dropped_and_changed_entries() {
        let stores = StoreSet::ephemeral();
        let prior = manifest(&[("/", "h1"), ("a.js", "h2"), ("b.js", "h3")], &[]);
        let current = manifest(&[("/", "h1"), ("a.js", "h2b")], &[]);

        stores.snapshot.save(&prior).await.unwrap();
        stores.content.put("/", resource("old-html")).await.unwrap();
        stores.content.put("a.js", resource("old-js")).await.unwrap();
        stores.content.put("b.js", resource("dropped")).await.unwrap();

        stores.staging.put("/", resource("new-html")).await.unwrap();
        stores.staging.put("a.js", resource("new-js")).await.unwrap();

        let r = reconciler(&stores, current.clone(), Arc::new(StubFetcher::new(&[])));
        r.activate().await.unwrap();

        let mut keys = stores.content.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["/", "a.js"]);

        // Shell resources take the freshest version
        let a = stores.content.get("a.js").await.unwrap().unwrap();
        assert_eq!(a.body, b"new-js");
        let root = stores.content.get("/").await.unwrap().unwrap();
        assert_eq!(root.body, b"new-html");

        assert!(stores.staging.keys().await.unwrap().is_empty());
        assert_eq!(stores.snapshot.load().await.unwrap().unwrap(), current);
    }

    #[tokio::test]
    async fn upgrade_preserves_unchanged_entries_without_refetch() {
        let stores = StoreSet::ephemeral();
        let prior = manifest(&[("/", "h1"), ("big.wasm", "h7")], &[]);
        let current = manifest(&[("/", "h1b"), ("big.wasm", "h7")], &[]);

        stores.snapshot.save(&prior).await.unwrap();
        let kept = resource("wasm-bytes");
        stores.content.put("big.wasm", kept.clone()).await.unwrap();
        stores.content.put("/", resource("old-html")).await.unwrap();
        stores.staging.put("/", resource("new-html")).await.unwrap();

        let fetcher = Arc::new(StubFetcher::new(&[]));
        let r = reconciler(&stores, current, Arc::clone(&fetcher));
        r.activate().await.unwrap();

        // The unchanged entry is byte-identical and nothing hit the network
        assert_eq!(stores.content.get("big.wasm").await.unwrap().unwrap(), kept);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn upgrade_evicts_key_absent_from_prior_snapshot() {
        let stores = StoreSet::ephemeral();
        let prior = manifest(&[("/", "h1")], &[]);
        let current = manifest(&[("/", "h1"), ("late.js", "h4")], &[]);

        stores.snapshot.save(&prior).await.unwrap();
        stores.content.put("/", resource("<html>")).await.unwrap();
        // Cached without a fingerprint on record, cannot be verified
        stores.content.put("late.js", resource("js")).await.unwrap();

        let r = reconciler(&stores, current, Arc::new(StubFetcher::new(&[])));
        r.activate().await.unwrap();

        assert!(!stores.content.contains("late.js").await.unwrap());
        assert!(stores.content.contains("/").await.unwrap());
    }

    #[tokio::test]
    async fn repeated_activation_is_idempotent() {
        let stores = StoreSet::ephemeral();
        let current = manifest(&[("/", "h1"), ("a.js", "h2")], &[]);

        stores.staging.put("/", resource("<html>")).await.unwrap();
        stores.staging.put("a.js", resource("js")).await.unwrap();

        let r = reconciler(&stores, current.clone(), Arc::new(StubFetcher::new(&[])));
        r.activate().await.unwrap();

        let root_before = stores.content.get("/").await.unwrap().unwrap();
        let a_before = stores.content.get("a.js").await.unwrap().unwrap();

        // Second activation: same manifest, empty staging
        r.activate().await.unwrap();

        assert_eq!(stores.content.get("/").await.unwrap().unwrap(), root_before);
        assert_eq!(stores.content.get("a.js").await.unwrap().unwrap(), a_before);
        assert!(stores.staging.keys().await.unwrap().is_empty());
        assert_eq!(stores.snapshot.load().await.unwrap().unwrap(), current);
    }

    #[tokio::test]
    async fn failed_reconciliation_wipes_all_stores() {
        let stores = StoreSet {
            snapshot: Arc::new(FailingSnapshotStore),
            ..StoreSet::ephemeral()
        };
        stores.content.put("/", resource("<html>")).await.unwrap();
        stores.staging.put("a.js", resource("js")).await.unwrap();

        let r = reconciler(
            &stores,
            manifest(&[("/", "h1")], &[]),
            Arc::new(StubFetcher::new(&[])),
        );

        assert!(r.activate().await.is_err());
        assert!(stores.content.keys().await.unwrap().is_empty());
        assert!(stores.staging.keys().await.unwrap().is_empty());
    }
}
