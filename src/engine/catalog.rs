//! Resolution context shared by every request
//!
//! A `Catalog` is built once at startup and owns the cache, the backend handle
//! and the cache sweeper. All operations take `&self`, so one instance can be
//! shared behind an `Arc` by any number of concurrent callers.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::LinkerConfig;
use crate::engine::cache::{ARCHES_KEY, CachedValue, TtlCache};
use crate::engine::error::ResolveError;
use crate::engine::link::{ResolutionRequest, resolve_link};
use crate::engine::listing::ListingClient;
use crate::engine::target::{
    TargetSummary, VERSION_CHANNELS, architecture_root, list_targets, parse_entries,
};
use crate::storage::backend::StorageBackend;

pub struct Catalog {
    listing: ListingClient,
    sweeper: JoinHandle<()>,
}

impl Catalog {
    /// Build the catalog and start the cache sweeper.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(backend: Arc<dyn StorageBackend>, config: &LinkerConfig) -> Self {
        let cache = Arc::new(TtlCache::new(config.cache.ttl()));
        let sweeper = cache.spawn_sweeper(config.cache.sweep_interval());
        let listing = ListingClient::new(
            backend,
            cache,
            config.storage.exclude.clone(),
            config.storage.fetch_timeout(),
        );

        Self { listing, sweeper }
    }

    pub fn cache(&self) -> &Arc<TtlCache<CachedValue>> {
        self.listing.cache()
    }

    fn cached_names(&self, key: &str) -> Option<Vec<String>> {
        match self.cache().get(key) {
            Some(CachedValue::Names(names)) => {
                debug!("Cache hit for {}", key);
                Some(names)
            }
            Some(other) => {
                warn!(
                    "Cache corruption: {} holds {:?} instead of names, refetching",
                    key, other
                );
                None
            }
            None => None,
        }
    }

    fn store_names(&self, key: &str, names: &[String]) {
        // An empty result usually means the listing degraded; don't pin it
        if !names.is_empty() {
            self.cache().set(key, CachedValue::Names(names.to_vec()));
        }
    }

    /// Top-level directory names of the store
    pub async fn list_architectures(&self) -> Vec<String> {
        if let Some(names) = self.cached_names(ARCHES_KEY) {
            return names;
        }

        let arches: Vec<String> = self
            .listing
            .list_directories("/")
            .await
            .into_iter()
            .map(|dir| dir.path.replace('/', ""))
            .collect();

        self.store_names(ARCHES_KEY, &arches);
        arches
    }

    /// Distinct software names among the nightly archives of an architecture
    ///
    /// The result is cached under the bare architecture name. An architecture
    /// called `arches` would collide with the architecture list, so its
    /// software list is always recomputed from the (cached) file listing.
    pub async fn list_software(&self, architecture: &str) -> Vec<String> {
        let cacheable = architecture != ARCHES_KEY;
        if cacheable && let Some(names) = self.cached_names(architecture) {
            return names;
        }

        let files = self
            .listing
            .list_files(&architecture_root(architecture))
            .await;
        let software: BTreeSet<String> = parse_entries(&files)
            .into_iter()
            .map(|(_, metadata)| metadata.software)
            .collect();
        let software: Vec<String> = software.into_iter().collect();

        if cacheable {
            self.store_names(architecture, &software);
        }
        software
    }

    pub fn list_version_channels(&self) -> Vec<String> {
        VERSION_CHANNELS.iter().map(|c| c.to_string()).collect()
    }

    pub async fn list_targets(
        &self,
        architecture: &str,
        software: &str,
        version_alias: &str,
    ) -> Vec<TargetSummary> {
        list_targets(&self.listing, architecture, software, version_alias).await
    }

    pub async fn resolve_link(
        &self,
        architecture: &str,
        software: &str,
        version_alias: &str,
        tag: &str,
    ) -> Result<String, ResolveError> {
        let request = ResolutionRequest::new(architecture, software, version_alias, tag);
        resolve_link(&self.listing, &request).await
    }
}

impl Drop for Catalog {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::backend::MockStorageBackend;
    use crate::storage::types::DirectoryEntry;
    use chrono::{DateTime, Utc};

    fn file(path: &str) -> DirectoryEntry {
        DirectoryEntry::file(path, DateTime::<Utc>::UNIX_EPOCH)
    }

    fn catalog(backend: MockStorageBackend) -> Catalog {
        Catalog::new(Arc::new(backend), &LinkerConfig::default())
    }

    #[tokio::test]
    async fn list_architectures_strips_slashes_and_caches() {
        let mut backend = MockStorageBackend::new();
        backend
            .expect_list()
            .withf(|path| path == "/")
            .times(1)
            .returning(|_| {
                Ok(vec![
                    DirectoryEntry::directory("/ARMv7", DateTime::<Utc>::UNIX_EPOCH),
                    DirectoryEntry::directory("/x86_64", DateTime::<Utc>::UNIX_EPOCH),
                    file("/index.txt"),
                ])
            });

        let catalog = catalog(backend);

        assert_eq!(catalog.list_architectures().await, vec!["ARMv7", "x86_64"]);
        assert_eq!(catalog.list_architectures().await, vec!["ARMv7", "x86_64"]);
        assert_eq!(
            catalog.cache().get("arches"),
            Some(CachedValue::Names(vec![
                "ARMv7".to_string(),
                "x86_64".to_string()
            ]))
        );
    }

    #[tokio::test]
    async fn list_software_returns_sorted_distinct_names() {
        let mut backend = MockStorageBackend::new();
        backend
            .expect_list()
            .withf(|path| path == "/ARMv7")
            .times(1)
            .returning(|_| {
                Ok(vec![
                    file("/ARMv7/zeta-1-0-2023-01-01-a"),
                    file("/ARMv7/tool-1-0-2023-01-01-a"),
                    file("/ARMv7/tool-1-0-2023-01-02-b"),
                    file("/ARMv7/notes"),
                    DirectoryEntry::directory("/ARMv7/beta-2023", DateTime::<Utc>::UNIX_EPOCH),
                ])
            });

        let catalog = catalog(backend);

        assert_eq!(catalog.list_software("ARMv7").await, vec!["tool", "zeta"]);
        assert_eq!(catalog.list_software("ARMv7").await, vec!["tool", "zeta"]);
        assert!(catalog.cache().get("ARMv7").is_some());
    }

    #[tokio::test]
    async fn architecture_named_arches_does_not_read_or_overwrite_architecture_list() {
        let mut backend = MockStorageBackend::new();
        backend
            .expect_list()
            .withf(|path| path == "/arches")
            .times(1)
            .returning(|_| Ok(vec![file("/arches/tool-1-0-2023-01-01-a")]));

        let catalog = catalog(backend);
        let arches = CachedValue::Names(vec!["ARMv7".to_string(), "arches".to_string()]);
        catalog.cache().set("arches", arches.clone());

        assert_eq!(catalog.list_software("arches").await, vec!["tool"]);
        // Second call is served by the cached file listing
        assert_eq!(catalog.list_software("arches").await, vec!["tool"]);
        assert_eq!(catalog.cache().get("arches"), Some(arches));
    }

    #[tokio::test]
    async fn empty_results_are_not_cached() {
        let mut backend = MockStorageBackend::new();
        backend
            .expect_list()
            .times(1)
            .returning(|_| Err(crate::storage::error::BackendError::Unauthorized));

        let catalog = catalog(backend);

        assert!(catalog.list_architectures().await.is_empty());
        assert!(catalog.cache().get("arches").is_none());
        assert!(catalog.cache().get("dirs:/").is_none());
    }

    #[tokio::test]
    async fn list_version_channels_is_fixed() {
        let catalog = catalog(MockStorageBackend::new());

        assert_eq!(
            catalog.list_version_channels(),
            vec!["nightly", "beta", "stable"]
        );
    }
}
