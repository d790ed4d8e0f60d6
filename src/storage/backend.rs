//! Backend trait for reading the remote object store

#[cfg(test)]
use mockall::automock;

use crate::storage::error::BackendError;
use crate::storage::types::DirectoryEntry;

/// Trait for the read-only operations the resolver needs from remote storage
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Lists the direct children of a directory
    ///
    /// # Arguments
    /// * `path` - Directory path, `/` for the store root (e.g., "/ARMv7")
    ///
    /// # Returns
    /// * `Ok(Vec<DirectoryEntry>)` - Both files and directories, in backend order
    /// * `Err(BackendError)` - If the listing fails
    async fn list(&self, path: &str) -> Result<Vec<DirectoryEntry>, BackendError>;

    /// Creates (or reuses) a public share link for a stored object
    async fn share_link(&self, path: &str) -> Result<String, BackendError>;
}
