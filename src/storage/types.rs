//! Common types for storage listings

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One child of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    /// Full path of the entry (e.g., "/ARMv7/beta-2023-05-01")
    pub path: String,
    /// Whether the entry is a directory
    pub is_dir: bool,
    /// Last modification time reported by the backend
    pub modified: DateTime<Utc>,
}

impl DirectoryEntry {
    pub fn directory(path: impl Into<String>, modified: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
            modified,
        }
    }

    pub fn file(path: impl Into<String>, modified: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
            modified,
        }
    }

    /// Last path segment of the entry
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}
