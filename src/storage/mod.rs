//! Storage layer
//! - backend.rs: StorageBackend trait definition
//! - types.rs: DirectoryEntry
//! - error.rs: BackendError
//! - dropbox.rs: Dropbox HTTP API backend

pub mod backend;
pub mod dropbox;
pub mod error;
pub mod types;

pub use backend::StorageBackend;
pub use dropbox::DropboxBackend;
pub use error::BackendError;
pub use types::DirectoryEntry;
