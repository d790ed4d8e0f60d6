//! In-memory storage backend for tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use artifact_linker::storage::backend::StorageBackend;
use artifact_linker::storage::error::BackendError;
use artifact_linker::storage::types::DirectoryEntry;

/// Fake store holding a flat map of directory path -> children
#[derive(Default)]
pub struct FakeStore {
    children: HashMap<String, Vec<DirectoryEntry>>,
    list_calls: Mutex<Vec<String>>,
    share_calls: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory under `parent`; its path is `parent/name`
    pub fn with_dir(mut self, parent: &str, name: &str, modified: DateTime<Utc>) -> Self {
        let path = join(parent, name);
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(DirectoryEntry::directory(path, modified));
        self
    }

    pub fn with_file(mut self, parent: &str, name: &str, modified: DateTime<Utc>) -> Self {
        let path = join(parent, name);
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(DirectoryEntry::file(path, modified));
        self
    }

    /// Paths passed to `list`, in call order
    pub fn list_calls(&self) -> Vec<String> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn share_calls(&self) -> usize {
        self.share_calls.load(Ordering::SeqCst)
    }
}

fn join(parent: &str, name: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), name)
}

#[async_trait]
impl StorageBackend for FakeStore {
    async fn list(&self, path: &str) -> Result<Vec<DirectoryEntry>, BackendError> {
        self.list_calls.lock().unwrap().push(path.to_string());
        self.children
            .get(path)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(path.to_string()))
    }

    async fn share_link(&self, path: &str) -> Result<String, BackendError> {
        self.share_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://share.example{}?dl=1", path))
    }
}

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}
