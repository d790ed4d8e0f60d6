//! In-memory TTL cache shared by all resolution requests

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::storage::types::DirectoryEntry;

/// Key prefix for cached directory listings
pub const DIRS_PREFIX: &str = "dirs:";
/// Key prefix for cached file listings
pub const FILES_PREFIX: &str = "files:";
/// Key prefix for cached share links
pub const LINK_PREFIX: &str = "link:";
/// Shortest period the sweeper will run at
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Key of the cached architecture list
pub const ARCHES_KEY: &str = "arches";

pub fn dirs_key(path: &str) -> String {
    format!("{}{}", DIRS_PREFIX, path)
}

pub fn files_key(path: &str) -> String {
    format!("{}{}", FILES_PREFIX, path)
}

pub fn link_key(path: &str) -> String {
    format!("{}{}", LINK_PREFIX, path)
}

/// Payloads stored by the resolver
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    /// Directory or file listing
    Entries(Vec<DirectoryEntry>),
    /// Derived name list (architectures, software)
    Names(Vec<String>),
    /// Share link
    Link(String),
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    // A panic while holding the lock cannot leave the map half-updated, so
    // poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the value for `key` unless it is missing or expired.
    /// Expired entries stay in memory until the next purge.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.read()
            .get(key)
            .filter(|entry| now <= entry.expires_at)
            .map(|entry| entry.value.clone())
    }

    /// Store a value with the default TTL, replacing any previous entry
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.write().insert(key.into(), entry);
    }

    /// Physically remove every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.expires_at);
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    /// Spawn a task purging expired entries every `interval`, clamped to
    /// [`MIN_SWEEP_INTERVAL`]. The task ends once the cache itself has been dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        if interval < MIN_SWEEP_INTERVAL {
            warn!(
                "Sweep interval {:?} is below {:?}, clamping",
                interval, MIN_SWEEP_INTERVAL
            );
        }
        let interval = interval.max(MIN_SWEEP_INTERVAL);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let purged = cache.purge_expired();
                if purged > 0 {
                    debug!("Purged {} expired cache entries", purged);
                }
            }
        })
    }
}
