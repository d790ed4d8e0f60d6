//! Cached listing and link-sharing client over a storage backend

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::cache::{CachedValue, TtlCache, dirs_key, files_key, link_key};
use crate::storage::backend::StorageBackend;
use crate::storage::error::BackendError;
use crate::storage::types::DirectoryEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directories,
    Files,
}

/// Fronts every backend call with the shared TTL cache.
///
/// Listings degrade to an empty sequence on backend failure so a resolution can
/// continue as if the path were empty; link sharing propagates the failure.
pub struct ListingClient {
    backend: Arc<dyn StorageBackend>,
    cache: Arc<TtlCache<CachedValue>>,
    excluded: Vec<String>,
    fetch_timeout: Duration,
}

impl ListingClient {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        cache: Arc<TtlCache<CachedValue>>,
        excluded: Vec<String>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            cache,
            excluded,
            fetch_timeout,
        }
    }

    pub fn cache(&self) -> &Arc<TtlCache<CachedValue>> {
        &self.cache
    }

    /// Directories directly under `path`
    pub async fn list_directories(&self, path: &str) -> Vec<DirectoryEntry> {
        self.list(path, EntryKind::Directories).await
    }

    /// Files directly under `path`, minus excluded ones
    pub async fn list_files(&self, path: &str) -> Vec<DirectoryEntry> {
        self.list(path, EntryKind::Files).await
    }

    async fn list(&self, path: &str, kind: EntryKind) -> Vec<DirectoryEntry> {
        // An unresolved channel yields the empty path, which must not be
        // confused with the store root.
        if path.is_empty() {
            return Vec::new();
        }

        let key = match kind {
            EntryKind::Directories => dirs_key(path),
            EntryKind::Files => files_key(path),
        };

        match self.cache.get(&key) {
            Some(CachedValue::Entries(entries)) => {
                debug!("Cache hit for {}", key);
                return entries;
            }
            Some(other) => {
                warn!(
                    "Cache corruption: {} holds {:?} instead of a listing, refetching",
                    key, other
                );
            }
            None => debug!("Cache miss for {}", key),
        }

        let listed = match self.call(self.backend.list(path)).await {
            Ok(listed) => listed,
            Err(e) => {
                warn!("Failed to list {}: {}; treating as empty", path, e);
                return Vec::new();
            }
        };

        let entries: Vec<DirectoryEntry> = listed
            .into_iter()
            .filter(|entry| match kind {
                EntryKind::Directories => entry.is_dir,
                EntryKind::Files => !entry.is_dir && !self.is_excluded(&entry.path),
            })
            .collect();

        info!("Listed {} entries for {}", entries.len(), key);
        self.cache.set(key, CachedValue::Entries(entries.clone()));
        entries
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.excluded
            .iter()
            .any(|pattern| path.contains(pattern.as_str()))
    }

    /// Share link for the object at `path`, created at most once per TTL window
    pub async fn share_link(&self, path: &str) -> Result<String, BackendError> {
        let key = link_key(path);

        match self.cache.get(&key) {
            Some(CachedValue::Link(url)) => {
                debug!("Cache hit for {}", key);
                return Ok(url);
            }
            Some(other) => {
                warn!(
                    "Cache corruption: {} holds {:?} instead of a link, refetching",
                    key, other
                );
            }
            None => debug!("Cache miss for {}", key),
        }

        let url = self.call(self.backend.share_link(path)).await?;
        info!("Created share link for {}", path);
        self.cache.set(key, CachedValue::Link(url.clone()));
        Ok(url)
    }

    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        tokio::time::timeout(self.fetch_timeout, request)
            .await
            .map_err(|_| BackendError::Timeout(self.fetch_timeout))?
    }
}
